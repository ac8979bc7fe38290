// DedupEngine - 依存性注入による重複削除エンジン
// 発見 → ペア比較 → 削除 → 一時ファイル掃除 の順に実行する

use super::comparison::PairComparator;
use super::deletion::DeletionManager;
use super::reporting::DedupReporter;
use super::scheduler::PairwiseScheduler;
use crate::core::{DedupConfig, DedupError, DedupResult, ImageKind, ImageRef, RunSummary};
use crate::storage::StorageBackend;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// 全ての依存関係をコンストラクタで受け取る重複削除エンジン
pub struct DedupEngine<C, S, R> {
    comparator: Arc<C>,
    storage: Arc<S>,
    reporter: Arc<R>,
    config: DedupConfig,
}

impl<C, S, R> DedupEngine<C, S, R>
where
    C: PairComparator + 'static,
    S: StorageBackend + 'static,
    R: DedupReporter + 'static,
{
    pub fn new(comparator: C, storage: S, reporter: R, config: DedupConfig) -> Self {
        Self {
            comparator: Arc::new(comparator),
            storage: Arc::new(storage),
            reporter: Arc::new(reporter),
            config,
        }
    }

    /// 指定ディレクトリの重複画像を削除する
    pub async fn process_directory(&self, directory: &str) -> DedupResult<RunSummary> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        let scheduler = PairwiseScheduler::new(
            self.comparator.clone(),
            self.reporter.clone(),
            self.config.clone(),
        )?;
        let deletion = DeletionManager::new(
            self.storage.clone(),
            self.reporter.clone(),
            self.config.deletion_grace,
        );

        let images = self.discover_images(directory).await?;
        let total_images = images.len();
        let total_pairs = total_images * total_images.saturating_sub(1) / 2;
        self.reporter.report_started(total_images, total_pairs).await;

        let sweep = scheduler.sweep(images).await?;

        // 比較で決まった削除が全て終わってから掃除のための列挙を行う
        let deletions = deletion.process_requests(&sweep.requests).await;

        // 削除は済んでいるので、掃除の失敗は報告だけしてサマリーは返す
        let (artifacts_removed, artifact_sweep_error) =
            match deletion.sweep_temporary_artifacts(directory).await {
                Ok(artifacts) => (artifacts.deleted, None),
                Err(e) => {
                    self.reporter
                        .report_sweep_failed(directory, &e.to_string())
                        .await;
                    (0, Some(e.to_string()))
                }
            };

        let summary = RunSummary {
            directory: directory.to_string(),
            started_at,
            finished_at: Utc::now(),
            total_images,
            comparisons: sweep.comparisons,
            failed_comparisons: sweep.failed_comparisons,
            duplicates_found: sweep.requests.len(),
            deletions,
            artifacts_removed,
            artifact_sweep_error,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };
        self.reporter.report_completed(&summary).await;

        Ok(summary)
    }

    /// ディレクトリから比較対象の画像を列挙する
    ///
    /// 一時ファイルは対象外。パスでソートして列挙順を固定する。
    async fn discover_images(&self, directory: &str) -> DedupResult<Vec<ImageRef>> {
        let items = self
            .storage
            .list_items(directory)
            .await
            .map_err(|e| DedupError::file_discovery(directory, e))?;

        let mut paths: Vec<(PathBuf, ImageKind)> = items
            .into_iter()
            .filter(|item| self.storage.is_image_file(item) && !item.is_temp_artifact())
            .filter_map(|item| {
                let kind = item.extension.as_deref().and_then(ImageKind::from_extension)?;
                Some((PathBuf::from(item.id), kind))
            })
            .collect();

        paths.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(paths
            .into_iter()
            .enumerate()
            .map(|(index, (path, kind))| ImageRef::new(index, path, kind))
            .collect())
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }
}
