// 削除マネージャ
// 存在確認 → 猶予時間 → 削除。全削除の完了後に一時ファイルの掃除を行う

use super::reporting::DedupReporter;
use crate::core::{DedupError, DedupResult, DeletionRequest, DeletionSummary};
use crate::storage::StorageBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// 1ファイル分の削除結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    Deleted,
    /// 既に存在しなかった（エラーではない）
    Missing,
    Failed,
}

pub struct DeletionManager<S, R> {
    storage: Arc<S>,
    reporter: Arc<R>,
    grace: Duration,
}

impl<S, R> Clone for DeletionManager<S, R> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            reporter: self.reporter.clone(),
            grace: self.grace,
        }
    }
}

impl<S, R> DeletionManager<S, R>
where
    S: StorageBackend + 'static,
    R: DedupReporter + 'static,
{
    pub fn new(storage: Arc<S>, reporter: Arc<R>, grace: Duration) -> Self {
        Self {
            storage,
            reporter,
            grace,
        }
    }

    /// 削除要求をすべて並行に処理し、全件の完了を待つ
    pub async fn process_requests(&self, requests: &[DeletionRequest]) -> DeletionSummary {
        let paths = requests.iter().map(|r| r.path.clone()).collect();
        self.delete_all(paths).await
    }

    /// 一時ファイルの掃除
    ///
    /// ディレクトリを列挙し直し、接頭辞を持つファイルを同じ手順で削除する。
    pub async fn sweep_temporary_artifacts(&self, directory: &str) -> DedupResult<DeletionSummary> {
        let items = self
            .storage
            .list_items(directory)
            .await
            .map_err(|e| DedupError::file_discovery(directory, e))?;

        let paths = items
            .into_iter()
            .filter(|item| item.is_temp_artifact())
            .map(|item| PathBuf::from(item.id))
            .collect();

        Ok(self.delete_all(paths).await)
    }

    async fn delete_all(&self, paths: Vec<PathBuf>) -> DeletionSummary {
        let mut handles = Vec::new();
        for path in paths {
            let manager = self.clone();
            handles.push(tokio::spawn(async move { manager.delete_one(&path).await }));
        }

        let mut summary = DeletionSummary::default();
        for handle in handles {
            match handle.await {
                Ok(DeletionOutcome::Deleted) => summary.deleted += 1,
                Ok(DeletionOutcome::Missing) => summary.missing += 1,
                Ok(DeletionOutcome::Failed) | Err(_) => summary.failed += 1,
            }
        }
        summary
    }

    /// 1ファイルを削除する。失敗は報告のみで呼び出し元には伝播しない
    pub async fn delete_one(&self, path: &Path) -> DeletionOutcome {
        let id = path.to_string_lossy();

        match self.storage.exists(&id).await {
            Ok(true) => {}
            Ok(false) => {
                self.reporter.report_missing(path).await;
                return DeletionOutcome::Missing;
            }
            Err(e) => {
                let error = DedupError::deletion(path, e);
                self.reporter
                    .report_delete_failed(path, &error.to_string())
                    .await;
                return DeletionOutcome::Failed;
            }
        }

        tokio::time::sleep(self.grace).await;

        match self.storage.delete_item(&id).await {
            Ok(()) => {
                self.reporter.report_deleted(path).await;
                DeletionOutcome::Deleted
            }
            Err(e) => {
                let error = DedupError::deletion(path, e);
                self.reporter
                    .report_delete_failed(path, &error.to_string())
                    .await;
                DeletionOutcome::Failed
            }
        }
    }
}
