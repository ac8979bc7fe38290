// 比較ユニット
// 1件の比較タスクを正規化からスコア計算、一時ファイル削除まで単独で担当する

use crate::core::{ComparisonTask, DedupConfig, DedupError, DedupResult};
use crate::image_loader::normalizer::normalize;
use crate::image_loader::ImageLoaderBackend;
use crate::perceptual_hash::PerceptualHashBackend;
use crate::similarity::SimilarityEngine;
use async_trait::async_trait;

/// 2画像を比較して類似度スコア（0〜100）を返すトレイト
#[async_trait]
pub trait PairComparator: Send + Sync {
    async fn compare(&self, task: &ComparisonTask) -> DedupResult<f64>;
}

/// 類似度エンジンを使う標準の比較ユニット
///
/// 制限時間はスケジューラ側で管理する。ユニット自身は処理を途中で打ち切らない。
pub struct ComparisonUnit<L, H> {
    engine: SimilarityEngine<L, H>,
}

impl<L, H> ComparisonUnit<L, H>
where
    L: ImageLoaderBackend,
    H: PerceptualHashBackend,
{
    pub fn new(loader: L, hasher: H, config: DedupConfig) -> Self {
        Self {
            engine: SimilarityEngine::new(loader, hasher, config),
        }
    }
}

#[async_trait]
impl<L, H> PairComparator for ComparisonUnit<L, H>
where
    L: ImageLoaderBackend,
    H: PerceptualHashBackend,
{
    async fn compare(&self, task: &ComparisonTask) -> DedupResult<f64> {
        let a = normalize(&task.a, task.b.index).await?;
        let b = match normalize(&task.b, task.a.index).await {
            Ok(b) => b,
            Err(e) => return settle(Err(e), [a.cleanup().await]),
        };

        let result = self
            .engine
            .score(a.path(), b.path())
            .await
            .map(|score| score.value);

        // 成否にかかわらず自分の一時ファイルは返る前に消す
        let cleanup_a = a.cleanup().await;
        let cleanup_b = b.cleanup().await;
        settle(result, [cleanup_a, cleanup_b])
    }
}

/// 本処理の結果と一時ファイル削除の結果をまとめる
///
/// 本処理のエラーが優先され、削除の失敗はそのエラーに添えられる。
fn settle<T>(
    result: DedupResult<T>,
    cleanups: impl IntoIterator<Item = DedupResult<()>>,
) -> DedupResult<T> {
    let cleanup_error = cleanups.into_iter().find_map(|c| c.err());

    match (result, cleanup_error) {
        (Ok(value), None) => Ok(value),
        (Ok(_), Some(cleanup)) => Err(cleanup),
        (Err(primary), None) => Err(primary),
        (Err(primary), Some(cleanup)) => Err(DedupError::cleanup_failed(primary, cleanup)),
    }
}
