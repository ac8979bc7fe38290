// 進捗報告
// コンソール出力はすべてこのトレイト経由で行う

use crate::core::{ComparisonTask, DeletionRequest, RunSummary};
use async_trait::async_trait;
use std::path::Path;

/// 進捗報告の抽象化トレイト
#[async_trait]
pub trait DedupReporter: Send + Sync {
    /// 実行開始時の報告
    async fn report_started(&self, total_images: usize, total_pairs: usize);

    /// 比較1件のスコア
    async fn report_comparison(&self, task: &ComparisonTask, score: f64);

    /// 比較の失敗（重複ではないとして扱われる）
    async fn report_comparison_failed(&self, task: &ComparisonTask, error: &str);

    /// 重複の検出
    async fn report_duplicate(&self, request: &DeletionRequest);

    /// ファイルを削除した
    async fn report_deleted(&self, path: &Path);

    /// 削除対象が既に存在しなかった
    async fn report_missing(&self, path: &Path);

    /// 削除に失敗した
    async fn report_delete_failed(&self, path: &Path, error: &str);

    /// 一時ファイル掃除のための列挙に失敗した
    async fn report_sweep_failed(&self, directory: &str, error: &str);

    /// 実行完了時の報告
    async fn report_completed(&self, summary: &RunSummary);
}

/// コンソール出力による進捗報告実装
#[derive(Debug, Default, Clone)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// エラーと最終結果だけを出力する
    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

#[async_trait]
impl DedupReporter for ConsoleReporter {
    async fn report_started(&self, total_images: usize, total_pairs: usize) {
        if !self.quiet {
            println!("🚀 Comparing {total_images} images ({total_pairs} pairs)...");
        }
    }

    async fn report_comparison(&self, task: &ComparisonTask, score: f64) {
        if !self.quiet {
            println!("🔍 {task}: {score:.2}");
        }
    }

    async fn report_comparison_failed(&self, task: &ComparisonTask, error: &str) {
        eprintln!("❌ Comparison failed {task}: {error}");
    }

    async fn report_duplicate(&self, request: &DeletionRequest) {
        if !self.quiet {
            println!(
                "♻️  Duplicate ({:.2}): {} (keeping {})",
                request.score,
                request.path.display(),
                request.kept.display()
            );
        }
    }

    async fn report_deleted(&self, path: &Path) {
        if !self.quiet {
            println!("🗑️  Deleted: {}", path.display());
        }
    }

    async fn report_missing(&self, path: &Path) {
        if !self.quiet {
            println!("⏭️  Already gone: {}", path.display());
        }
    }

    async fn report_delete_failed(&self, path: &Path, error: &str) {
        eprintln!("❌ Failed to delete {}: {error}", path.display());
    }

    async fn report_sweep_failed(&self, directory: &str, error: &str) {
        eprintln!("⚠️  Temp file sweep skipped for {directory}: {error}");
    }

    async fn report_completed(&self, summary: &RunSummary) {
        println!(
            "✅ Completed! Images: {}, Comparisons: {} ({} failed), Deleted: {}, Temp files removed: {}",
            summary.total_images,
            summary.comparisons,
            summary.failed_comparisons,
            summary.deletions.deleted,
            summary.artifacts_removed
        );
    }
}

/// 何もしない進捗報告実装（テスト・バックグラウンド用）
#[derive(Debug, Default, Clone)]
pub struct NoOpReporter;

impl NoOpReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DedupReporter for NoOpReporter {
    async fn report_started(&self, _total_images: usize, _total_pairs: usize) {}

    async fn report_comparison(&self, _task: &ComparisonTask, _score: f64) {}

    async fn report_comparison_failed(&self, _task: &ComparisonTask, _error: &str) {}

    async fn report_duplicate(&self, _request: &DeletionRequest) {}

    async fn report_deleted(&self, _path: &Path) {}

    async fn report_missing(&self, _path: &Path) {}

    async fn report_delete_failed(&self, _path: &Path, _error: &str) {}

    async fn report_sweep_failed(&self, _directory: &str, _error: &str) {}

    async fn report_completed(&self, _summary: &RunSummary) {}
}
