// テスト用の画像生成ヘルパー

#![allow(dead_code)]

use image::{GrayImage, Luma};
use std::path::{Path, PathBuf};

/// 画像のどの半分を黒くするか
#[derive(Debug, Clone, Copy)]
pub enum Half {
    Left,
    Right,
    Top,
    Bottom,
}

/// 半分が黒、残りが白の画像を生成して保存する（形式は拡張子で決まる）
pub fn write_half_image(dir: &Path, name: &str, width: u32, height: u32, dark: Half) -> PathBuf {
    let image = GrayImage::from_fn(width, height, |x, y| {
        let is_dark = match dark {
            Half::Left => x < width / 2,
            Half::Right => x >= width / 2,
            Half::Top => y < height / 2,
            Half::Bottom => y >= height / 2,
        };
        if is_dark {
            Luma([0])
        } else {
            Luma([255])
        }
    });

    let path = dir.join(name);
    image.save(&path).expect("Failed to write test image");
    path
}

/// ファイルをバイト単位でコピーする
pub fn copy_file(dir: &Path, from: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::copy(from, &path).expect("Failed to copy test image");
    path
}

/// 壊れた画像ファイルを作成
pub fn write_corrupted(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"INVALID_IMAGE_DATA").expect("Failed to write corrupted file");
    path
}

/// ディレクトリ内のファイル名一覧（ソート済み）
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// 一時ファイルが残っていないか
pub fn has_temp_artifacts(dir: &Path) -> bool {
    file_names(dir)
        .iter()
        .any(|name| name.starts_with("temp_convert_to_jpeg_"))
}
