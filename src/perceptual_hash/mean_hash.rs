use super::{HashResult, PerceptualHashBackend};
use anyhow::{Context, Result};
use async_trait::async_trait;
use image::DynamicImage;
use img_hash::{HashAlg, HasherConfig};
use std::sync::Arc;

/// グレースケール平均値ハッシュ実装（img_hash使用）
#[derive(Clone, Debug)]
pub struct MeanHasher {
    hash_size: u32,
}

impl MeanHasher {
    pub fn new(size: u32) -> Self {
        Self { hash_size: size }
    }
}

#[async_trait]
impl PerceptualHashBackend for MeanHasher {
    async fn generate_hash(&self, image: Arc<DynamicImage>) -> Result<HashResult> {
        let hash = tokio::task::spawn_blocking({
            let size = self.hash_size;
            move || -> Result<img_hash::ImageHash> {
                let gray = image.to_luma8();
                let hasher = HasherConfig::new()
                    .hash_size(size, size)
                    .hash_alg(HashAlg::Mean)
                    .to_hasher();

                // img_hashは独自のimageクレートのバージョンを使うため、生バッファ経由で渡す
                let img_hash_image = img_hash::image::ImageBuffer::from_raw(
                    gray.width(),
                    gray.height(),
                    gray.into_raw(),
                )
                .context("Failed to build grayscale buffer for hashing")?;
                let dynamic_img_hash_image =
                    img_hash::image::DynamicImage::ImageLuma8(img_hash_image);
                Ok(hasher.hash_image(&dynamic_img_hash_image))
            }
        })
        .await
        .context("Failed to spawn blocking task for hashing")??;

        Ok(HashResult {
            hash_data: hash.as_bytes().to_vec(),
            hash_size_bits: self.hash_size * self.hash_size,
        })
    }
}
