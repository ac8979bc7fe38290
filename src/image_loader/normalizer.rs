// フォーマット正規化
// PNGはJPEGに再エンコードした一時ファイルに置き換え、それ以外はそのまま使う

use crate::core::config::TEMP_ARTIFACT_PREFIX;
use crate::core::{DedupError, DedupResult, ImageRef};
use anyhow::Context;
use image::codecs::jpeg::JpegEncoder;
use std::path::{Path, PathBuf};

const JPEG_QUALITY: u8 = 90;

/// 比較ユニットが所有する一時ファイル
///
/// `remove` を呼ばずに破棄された場合（パニック時など）もDropで削除を試みる。
#[derive(Debug)]
pub struct TemporaryArtifact {
    path: PathBuf,
    removed: bool,
}

impl TemporaryArtifact {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 一時ファイルを削除する
    pub async fn remove(mut self) -> DedupResult<()> {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DedupError::deletion(&self.path, e.into())),
        }
    }
}

impl Drop for TemporaryArtifact {
    fn drop(&mut self) {
        if !self.removed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// 正規化済みの画像
#[derive(Debug)]
pub struct NormalizedImage {
    path: PathBuf,
    artifact: Option<TemporaryArtifact>,
}

impl NormalizedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.artifact.is_some()
    }

    /// 一時ファイルがあれば削除する
    pub async fn cleanup(self) -> DedupResult<()> {
        match self.artifact {
            Some(artifact) => artifact.remove().await,
            None => Ok(()),
        }
    }
}

/// 一時ファイル名を生成
///
/// 同じ画像が複数の比較で同時に変換されても衝突しないよう、
/// 自身と比較相手のインデックスを名前に含める。
pub fn artifact_path(source: &Path, own_index: usize, peer_index: usize) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = format!("{TEMP_ARTIFACT_PREFIX}{stem}_{own_index}_{peer_index}.jpg");

    match source.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// 比較に使えるパスを返す
///
/// 変換が必要な場合のみ、ソースと同じディレクトリに一時JPEGを作成する。
pub async fn normalize(image: &ImageRef, peer_index: usize) -> DedupResult<NormalizedImage> {
    if !image.kind.needs_conversion() {
        return Ok(NormalizedImage {
            path: image.path.clone(),
            artifact: None,
        });
    }

    let target = artifact_path(&image.path, image.index, peer_index);
    let encoded = encode_as_jpeg(image.path.clone())
        .await
        .map_err(|e| DedupError::conversion(&image.path, e))?;

    if let Err(e) = tokio::fs::write(&target, &encoded).await {
        // 書きかけのファイルは残さない
        let _ = tokio::fs::remove_file(&target).await;
        return Err(DedupError::conversion(
            &image.path,
            anyhow::Error::new(e).context(format!("Failed to write {}", target.display())),
        ));
    }

    Ok(NormalizedImage {
        path: target.clone(),
        artifact: Some(TemporaryArtifact::new(target)),
    })
}

/// デコードしてメモリ上でJPEGにエンコードする
async fn encode_as_jpeg(source: PathBuf) -> anyhow::Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<u8>> {
        let image = image::open(&source)
            .with_context(|| format!("Failed to decode: {}", source.display()))?;
        // JPEGはアルファを持てないのでRGBに落とす
        let rgb = image.to_rgb8();

        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
            .encode_image(&rgb)
            .context("Failed to encode JPEG")?;
        Ok(buffer)
    })
    .await
    .context("Failed to spawn blocking task for JPEG conversion")?
}
