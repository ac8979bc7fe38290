use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;

pub mod normalizer;
pub mod standard;

/// 画像読み込みの結果情報
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// 読み込まれた画像（ハッシュ計算とリサイズで共有する）
    pub image: Arc<DynamicImage>,
    /// 元の画像サイズ
    pub original_dimensions: (u32, u32),
}

/// 画像読み込みバックエンドのトレイト
#[async_trait]
pub trait ImageLoaderBackend: Send + Sync {
    /// ファイルパスから画像を読み込む
    async fn load_from_path(&self, path: &Path) -> Result<LoadResult>;
}
