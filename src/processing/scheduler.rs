// ペアワイズスケジューラ
//
// 行 i ごとに j = i+1.. を順に比較し、最初に重複が見つかった時点で images[i] の
// 削除を決めてその行を打ち切る。行同士は並行に走り、同時に実行される比較は
// セマフォの許可数で制限される。
//
// 許可は比較タスク自身が持つ。制限時間を過ぎたタスクは行からは失敗として扱われるが、
// 処理が実際に終わるまで許可を返さない。

use super::comparison::PairComparator;
use super::reporting::DedupReporter;
use crate::core::{
    ComparisonTask, DedupConfig, DedupError, DedupResult, DeletionRequest, ImageRef, SweepOutcome,
};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// 1行分の走査結果
#[derive(Debug, Default)]
struct RowOutcome {
    request: Option<DeletionRequest>,
    comparisons: usize,
    failures: usize,
}

pub struct PairwiseScheduler<C, R> {
    comparator: Arc<C>,
    reporter: Arc<R>,
    semaphore: Arc<Semaphore>,
    config: DedupConfig,
}

// C, R 自体にはClone境界を要求しない
impl<C, R> Clone for PairwiseScheduler<C, R> {
    fn clone(&self) -> Self {
        Self {
            comparator: self.comparator.clone(),
            reporter: self.reporter.clone(),
            semaphore: self.semaphore.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C, R> PairwiseScheduler<C, R>
where
    C: PairComparator + 'static,
    R: DedupReporter + 'static,
{
    pub fn new(comparator: Arc<C>, reporter: Arc<R>, config: DedupConfig) -> DedupResult<Self> {
        config.validate()?;
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));

        Ok(Self {
            comparator,
            reporter,
            semaphore,
            config,
        })
    }

    /// 全ペアを比較して削除要求を集める
    ///
    /// 削除要求は images の列挙順（i の昇順）で返る。制限時間切れで切り離された
    /// 比較も含め、全ての比較処理が終わってから戻る。
    pub async fn sweep(&self, images: Vec<ImageRef>) -> DedupResult<SweepOutcome> {
        let images = Arc::new(images);
        let mut handles = Vec::new();

        for i in 0..images.len().saturating_sub(1) {
            let scheduler = self.clone();
            let images = images.clone();
            handles.push(tokio::spawn(async move { scheduler.scan_row(i, images).await }));
        }

        let mut outcome = SweepOutcome::default();
        for handle in handles {
            let row = handle.await.map_err(DedupError::task)??;
            outcome.comparisons += row.comparisons;
            outcome.failed_comparisons += row.failures;
            if let Some(request) = row.request {
                outcome.requests.push(request);
            }
        }

        self.wait_for_detached().await?;
        Ok(outcome)
    }

    /// 全ての許可が戻るまで待つ（切り離された比較の完了待ち）
    async fn wait_for_detached(&self) -> DedupResult<()> {
        let permits = u32::try_from(self.config.max_concurrent)
            .map_err(|e| DedupError::concurrency(format!("Too many permits: {e}")))?;
        let _all = self
            .semaphore
            .acquire_many(permits)
            .await
            .map_err(|e| DedupError::concurrency(format!("Semaphore error: {e}")))?;
        Ok(())
    }

    async fn scan_row(&self, i: usize, images: Arc<Vec<ImageRef>>) -> DedupResult<RowOutcome> {
        let mut row = RowOutcome::default();

        for j in (i + 1)..images.len() {
            let task = ComparisonTask::new(images[i].clone(), images[j].clone());
            row.comparisons += 1;

            match self.submit(task.clone()).await {
                Ok(score) => {
                    self.reporter.report_comparison(&task, score).await;

                    if self.config.is_duplicate(score) {
                        // 先に列挙された側を捨て、後の側を残す
                        let request = DeletionRequest {
                            path: task.a.path.clone(),
                            kept: task.b.path.clone(),
                            score,
                        };
                        self.reporter.report_duplicate(&request).await;
                        row.request = Some(request);
                        break;
                    }
                }
                Err(e) if !e.is_recoverable() => return Err(e),
                Err(e) => {
                    // 失敗した比較は重複なしとして扱う
                    row.failures += 1;
                    self.reporter
                        .report_comparison_failed(&task, &e.to_string())
                        .await;
                }
            }
        }

        Ok(row)
    }

    /// 許可を取得してから比較を独立したタスクとして実行する
    ///
    /// 制限時間を過ぎた場合はタスクを切り離して失敗を返す。切り離されたタスクは
    /// 許可を持ったまま最後まで走り、自分の一時ファイルも自分で消す。
    async fn submit(&self, task: ComparisonTask) -> DedupResult<f64> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DedupError::concurrency(format!("Semaphore error: {e}")))?;

        let comparator = self.comparator.clone();
        let pair = task.to_string();
        let mut handle = tokio::spawn(async move {
            let _permit = permit;
            comparator.compare(&task).await
        });

        let timeout = self.config.comparison_timeout;
        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(joined) => joined.map_err(DedupError::task)?,
            Err(_) => Err(DedupError::comparison_timeout(pair, timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ImageKind;
    use crate::processing::reporting::NoOpReporter;
    use crate::image_loader::standard::StandardImageLoader;
    use crate::image_loader::{ImageLoaderBackend, LoadResult};
    use crate::perceptual_hash::mean_hash::MeanHasher;
    use crate::processing::comparison::ComparisonUnit;
    use crate::processing::test_mocks::{MockComparator, RecordingReporter};
    use async_trait::async_trait;
    use image::{GrayImage, Luma};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// デコードのたびにブロッキングスレッドで待たされるローダー
    struct SlowLoader {
        inner: StandardImageLoader,
        delay: Duration,
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ImageLoaderBackend for SlowLoader {
        async fn load_from_path(&self, path: &Path) -> anyhow::Result<LoadResult> {
            let delay = self.delay;
            let active = self.active.clone();
            let peak = self.peak.clone();
            tokio::task::spawn_blocking(move || {
                let current = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(current, Ordering::SeqCst);
                std::thread::sleep(delay);
                active.fetch_sub(1, Ordering::SeqCst);
            })
            .await?;

            self.inner.load_from_path(path).await
        }
    }

    fn images(names: &[&str]) -> Vec<ImageRef> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| ImageRef::new(i, format!("/photos/{name}"), ImageKind::Jpeg))
            .collect()
    }

    fn scheduler<C: PairComparator + 'static>(
        comparator: C,
    ) -> PairwiseScheduler<C, NoOpReporter> {
        PairwiseScheduler::new(
            Arc::new(comparator),
            Arc::new(NoOpReporter::new()),
            DedupConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_no_duplicates_compares_every_pair() {
        let comparator = Arc::new(MockComparator::new());
        let scheduler = PairwiseScheduler::new(
            comparator.clone(),
            Arc::new(NoOpReporter::new()),
            DedupConfig::default(),
        )
        .unwrap();

        let outcome = scheduler
            .sweep(images(&["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg", "f.jpg"]))
            .await
            .unwrap();

        // n(n-1)/2
        assert_eq!(outcome.comparisons, 15);
        assert_eq!(comparator.call_count(), 15);
        assert!(outcome.requests.is_empty());
        assert_eq!(outcome.failed_comparisons, 0);
    }

    #[tokio::test]
    async fn test_earlier_image_is_discarded() {
        let comparator = MockComparator::new().with_score("a.jpg", "b.jpg", 97.0);

        let outcome = scheduler(comparator)
            .sweep(images(&["a.jpg", "b.jpg", "c.jpg"]))
            .await
            .unwrap();

        assert_eq!(outcome.requests.len(), 1);
        assert_eq!(outcome.requests[0].path.to_str(), Some("/photos/a.jpg"));
        assert_eq!(outcome.requests[0].kept.to_str(), Some("/photos/b.jpg"));
        // 行0は (a,b) で打ち切り、行1は (b,c)
        assert_eq!(outcome.comparisons, 2);
    }

    #[tokio::test]
    async fn test_row_stops_at_first_duplicate() {
        let comparator = MockComparator::new()
            .with_score("a.jpg", "b.jpg", 95.0)
            .with_score("a.jpg", "c.jpg", 99.0);
        let comparator = Arc::new(comparator);
        let scheduler = PairwiseScheduler::new(
            comparator.clone(),
            Arc::new(NoOpReporter::new()),
            DedupConfig::default(),
        )
        .unwrap();

        let outcome = scheduler
            .sweep(images(&["a.jpg", "b.jpg", "c.jpg"]))
            .await
            .unwrap();

        assert_eq!(outcome.requests.len(), 1);
        assert_eq!(outcome.requests[0].kept.to_str(), Some("/photos/b.jpg"));
        assert!(!comparator.was_called("a.jpg", "c.jpg"));
    }

    #[tokio::test]
    async fn test_at_most_one_request_per_image() {
        // a~b, b~c, a~c: a と b が削除対象、c が残る
        let comparator = MockComparator::new()
            .with_score("a.jpg", "b.jpg", 100.0)
            .with_score("a.jpg", "c.jpg", 100.0)
            .with_score("b.jpg", "c.jpg", 100.0);

        let outcome = scheduler(comparator)
            .sweep(images(&["a.jpg", "b.jpg", "c.jpg"]))
            .await
            .unwrap();

        let deleted: Vec<_> = outcome
            .requests
            .iter()
            .map(|r| r.path.to_string_lossy().to_string())
            .collect();
        assert_eq!(deleted, vec!["/photos/a.jpg", "/photos/b.jpg"]);
    }

    #[tokio::test]
    async fn test_failed_comparison_is_not_duplicate() {
        let comparator = MockComparator::new()
            .with_failure("a.jpg", "b.jpg")
            .with_score("b.jpg", "c.jpg", 96.0);

        let outcome = scheduler(comparator)
            .sweep(images(&["a.jpg", "b.jpg", "c.jpg"]))
            .await
            .unwrap();

        assert_eq!(outcome.failed_comparisons, 1);
        assert_eq!(outcome.comparisons, 3);
        assert_eq!(outcome.requests.len(), 1);
        assert_eq!(outcome.requests[0].path.to_str(), Some("/photos/b.jpg"));
    }

    #[tokio::test]
    async fn test_panicking_comparison_is_isolated() {
        let comparator = MockComparator::new().with_panic("a.jpg", "b.jpg");

        let outcome = scheduler(comparator)
            .sweep(images(&["a.jpg", "b.jpg", "c.jpg"]))
            .await
            .unwrap();

        assert_eq!(outcome.failed_comparisons, 1);
        assert_eq!(outcome.comparisons, 3);
        assert!(outcome.requests.is_empty());
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_limit() {
        let comparator = Arc::new(MockComparator::new().with_delay(Duration::from_millis(20)));
        let scheduler = PairwiseScheduler::new(
            comparator.clone(),
            Arc::new(NoOpReporter::new()),
            DedupConfig::default(),
        )
        .unwrap();

        let names: Vec<String> = (0..9).map(|i| format!("img{i}.jpg")).collect();
        let names: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let outcome = scheduler.sweep(images(&names)).await.unwrap();

        assert_eq!(outcome.comparisons, 36);
        assert!(comparator.max_in_flight() <= 5);
        assert!(comparator.max_in_flight() >= 2);
    }

    #[tokio::test]
    async fn test_reporter_sees_every_comparison() {
        let reporter = Arc::new(RecordingReporter::new());
        let scheduler = PairwiseScheduler::new(
            Arc::new(MockComparator::new().with_score("a.jpg", "c.jpg", 95.5)),
            reporter.clone(),
            DedupConfig::default(),
        )
        .unwrap();

        scheduler
            .sweep(images(&["a.jpg", "b.jpg", "c.jpg"]))
            .await
            .unwrap();

        assert_eq!(reporter.comparisons.lock().unwrap().len(), 3);
        assert_eq!(reporter.duplicates.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_and_single_image() {
        let outcome = scheduler(MockComparator::new())
            .sweep(Vec::new())
            .await
            .unwrap();
        assert_eq!(outcome.comparisons, 0);

        let outcome = scheduler(MockComparator::new())
            .sweep(images(&["only.jpg"]))
            .await
            .unwrap();
        assert_eq!(outcome.comparisons, 0);
        assert!(outcome.requests.is_empty());
    }

    #[tokio::test]
    async fn test_timed_out_comparisons_keep_their_permits() {
        let comparator = Arc::new(MockComparator::new().with_delay(Duration::from_millis(50)));
        let config = DedupConfig::default()
            .with_max_concurrent(2)
            .with_comparison_timeout(Duration::from_millis(5));
        let scheduler =
            PairwiseScheduler::new(comparator.clone(), Arc::new(NoOpReporter::new()), config)
                .unwrap();

        let outcome = scheduler
            .sweep(images(&["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]))
            .await
            .unwrap();

        // 全て制限時間切れ（重複なし扱い）
        assert_eq!(outcome.comparisons, 10);
        assert_eq!(outcome.failed_comparisons, 10);
        assert!(outcome.requests.is_empty());
        assert_eq!(comparator.call_count(), 10);
        assert!(comparator.max_in_flight() <= 2);
        // 切り離された比較も sweep が戻る前に終わっている
        assert_eq!(comparator.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_slow_decodes_stay_within_pool_bound() {
        let temp_dir = TempDir::new().unwrap();
        let mut refs = Vec::new();
        for i in 0..4u32 {
            let path = temp_dir.path().join(format!("img{i}.jpg"));
            GrayImage::from_fn(32, 32, |x, y| Luma([((x * 7 + y * 3 + i * 60) % 256) as u8]))
                .save(&path)
                .unwrap();
            refs.push(ImageRef::new(i as usize, path, ImageKind::Jpeg));
        }

        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let config = DedupConfig::default()
            .with_max_concurrent(2)
            .with_comparison_timeout(Duration::from_millis(10));
        let loader = SlowLoader {
            inner: StandardImageLoader::new(),
            delay: Duration::from_millis(100),
            active: active.clone(),
            peak: peak.clone(),
        };
        let unit = ComparisonUnit::new(loader, MeanHasher::new(8), config.clone());
        let scheduler =
            PairwiseScheduler::new(Arc::new(unit), Arc::new(NoOpReporter::new()), config).unwrap();

        let outcome = scheduler.sweep(refs).await.unwrap();

        assert_eq!(outcome.comparisons, 6);
        assert_eq!(outcome.failed_comparisons, 6);
        assert!(peak.load(Ordering::SeqCst) <= 2, "peak was {peak:?}");
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unrecoverable_error_stops_the_sweep() {
        let comparator = MockComparator::new().with_fatal("a.jpg", "b.jpg");

        let result = scheduler(comparator)
            .sweep(images(&["a.jpg", "b.jpg", "c.jpg"]))
            .await;

        assert!(matches!(result, Err(DedupError::ConcurrencyError { .. })));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let result = PairwiseScheduler::new(
            Arc::new(MockComparator::new()),
            Arc::new(NoOpReporter::new()),
            DedupConfig::default().with_max_concurrent(0),
        );

        assert!(matches!(result, Err(DedupError::ConfigurationError { .. })));
    }
}
