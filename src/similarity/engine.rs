// 2段階の類似度判定エンジン
// 1. 知覚ハッシュで事前判定  2. サイズ確認  3. 正規化解像度でのピクセル差分

use super::pixel_diff::{count_diff_pixels, similarity_percentage};
use crate::core::{DedupConfig, DedupError, DedupResult};
use crate::image_loader::{standard::StandardImageLoader, ImageLoaderBackend, LoadResult};
use crate::perceptual_hash::PerceptualHashBackend;
use std::path::Path;

/// どの段階でスコアが決まったか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStage {
    HashPrefilter,
    DimensionMismatch,
    PixelDiff,
}

/// 類似度スコア（0〜100）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScore {
    pub value: f64,
    pub stage: ScoreStage,
}

pub struct SimilarityEngine<L, H> {
    loader: L,
    hasher: H,
    config: DedupConfig,
}

impl<L, H> SimilarityEngine<L, H>
where
    L: ImageLoaderBackend,
    H: PerceptualHashBackend,
{
    pub fn new(loader: L, hasher: H, config: DedupConfig) -> Self {
        Self {
            loader,
            hasher,
            config,
        }
    }

    /// 正規化済みの2画像の類似度を計算
    ///
    /// ハッシュ段階はサイズ確認より先に走る。絵柄が同じならサイズ違いでも95になる。
    pub async fn score(&self, path_a: &Path, path_b: &Path) -> DedupResult<SimilarityScore> {
        let first = self.load(path_a).await?;
        let second = self.load(path_b).await?;

        let distance = self.hash_distance(&first, path_a, &second, path_b).await?;
        if distance < self.config.hash_distance_threshold {
            return Ok(SimilarityScore {
                value: self.config.hash_match_score,
                stage: ScoreStage::HashPrefilter,
            });
        }

        if first.original_dimensions != second.original_dimensions {
            return Ok(SimilarityScore {
                value: 0.0,
                stage: ScoreStage::DimensionMismatch,
            });
        }

        let value = self.pixel_similarity(first, second).await?;
        Ok(SimilarityScore {
            value,
            stage: ScoreStage::PixelDiff,
        })
    }

    /// 正規化解像度にリサイズしてピクセル差分から類似度を求める
    pub async fn pixel_similarity(&self, first: LoadResult, second: LoadResult) -> DedupResult<f64> {
        let size = self.config.canonical_size;
        let threshold = self.config.pixel_threshold;

        let canonical_a = StandardImageLoader::to_canonical_rgba(first.image, size, size)
            .await
            .map_err(|e| DedupError::image_read("canonical resize", e))?;
        let canonical_b = StandardImageLoader::to_canonical_rgba(second.image, size, size)
            .await
            .map_err(|e| DedupError::image_read("canonical resize", e))?;

        let diff = tokio::task::spawn_blocking(move || {
            count_diff_pixels(&canonical_a, &canonical_b, threshold)
        })
        .await
        .map_err(DedupError::task)?
        .unwrap_or(u64::from(size) * u64::from(size));

        Ok(similarity_percentage(diff, u64::from(size) * u64::from(size)))
    }

    async fn load(&self, path: &Path) -> DedupResult<LoadResult> {
        self.loader
            .load_from_path(path)
            .await
            .map_err(|e| DedupError::image_read(path, e))
    }

    async fn hash_distance(
        &self,
        first: &LoadResult,
        path_a: &Path,
        second: &LoadResult,
        path_b: &Path,
    ) -> DedupResult<u32> {
        let hash_a = self
            .hasher
            .generate_hash(first.image.clone())
            .await
            .map_err(|e| DedupError::image_read(path_a, e))?;
        let hash_b = self
            .hasher
            .generate_hash(second.image.clone())
            .await
            .map_err(|e| DedupError::image_read(path_b, e))?;

        self.hasher
            .calculate_distance(&hash_a, &hash_b)
            .map_err(|e| DedupError::image_read(path_a, e))
    }
}
