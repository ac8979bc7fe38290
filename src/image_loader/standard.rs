use super::{ImageLoaderBackend, LoadResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage, RgbaImage};
use std::path::Path;
use std::sync::Arc;

/// 標準的な画像ローダー実装
#[derive(Clone, Debug, Default)]
pub struct StandardImageLoader;

impl StandardImageLoader {
    pub fn new() -> Self {
        Self
    }

    /// 縦横比を無視して指定サイズのRGBAバッファに変換
    pub async fn to_canonical_rgba(
        image: Arc<DynamicImage>,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage> {
        tokio::task::spawn_blocking(move || {
            image
                .resize_exact(width, height, FilterType::Lanczos3)
                .to_rgba8()
        })
        .await
        .context("Failed to spawn blocking task for image resizing")
    }
}

#[async_trait]
impl ImageLoaderBackend for StandardImageLoader {
    async fn load_from_path(&self, path: &Path) -> Result<LoadResult> {
        let image = tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            move || image::open(&path)
        })
        .await
        .context("Failed to spawn blocking task for image loading")?
        .with_context(|| format!("Failed to load image from path: {}", path.display()))?;

        Ok(LoadResult {
            original_dimensions: (image.width(), image.height()),
            image: Arc::new(image),
        })
    }
}
