// テスト用の比較・進捗報告モック実装

use super::comparison::PairComparator;
use super::reporting::DedupReporter;
use crate::core::{ComparisonTask, DedupError, DedupResult, DeletionRequest, RunSummary};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum MockBehavior {
    Score(f64),
    Fail,
    Fatal,
    Panic,
}

/// ファイル名のペアごとに結果を決められる比較モック
///
/// 登録されていないペアはスコア0を返す。
pub struct MockComparator {
    behaviors: HashMap<(String, String), MockBehavior>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockComparator {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_score(mut self, a: &str, b: &str, score: f64) -> Self {
        self.behaviors
            .insert((a.to_string(), b.to_string()), MockBehavior::Score(score));
        self
    }

    pub fn with_failure(mut self, a: &str, b: &str) -> Self {
        self.behaviors
            .insert((a.to_string(), b.to_string()), MockBehavior::Fail);
        self
    }

    /// 実行全体を止めるべき（回復不能な）エラーを返す
    pub fn with_fatal(mut self, a: &str, b: &str) -> Self {
        self.behaviors
            .insert((a.to_string(), b.to_string()), MockBehavior::Fatal);
        self
    }

    pub fn with_panic(mut self, a: &str, b: &str) -> Self {
        self.behaviors
            .insert((a.to_string(), b.to_string()), MockBehavior::Panic);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn was_called(&self, a: &str, b: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .any(|(x, y)| x == a && y == b)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PairComparator for MockComparator {
    async fn compare(&self, task: &ComparisonTask) -> DedupResult<f64> {
        let key = (task.a.name(), task.b.name());
        self.calls.lock().unwrap().push(key.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.behaviors.get(&key).cloned() {
            Some(MockBehavior::Score(score)) => Ok(score),
            Some(MockBehavior::Fail) => Err(DedupError::image_read(
                &task.b.path,
                anyhow::anyhow!("mock read failure"),
            )),
            Some(MockBehavior::Fatal) => Err(DedupError::concurrency("mock semaphore closed")),
            Some(MockBehavior::Panic) => panic!("mock comparator panic"),
            None => Ok(0.0),
        }
    }
}

/// 呼び出しを記録する進捗報告モック
pub struct RecordingReporter {
    pub started: Mutex<Option<(usize, usize)>>,
    pub comparisons: Mutex<Vec<(String, f64)>>,
    pub failures: Mutex<Vec<String>>,
    pub duplicates: Mutex<Vec<DeletionRequest>>,
    pub deleted: Mutex<Vec<PathBuf>>,
    pub missing: Mutex<Vec<PathBuf>>,
    pub delete_failures: Mutex<Vec<PathBuf>>,
    pub sweep_failures: Mutex<Vec<String>>,
    pub completed: Mutex<Option<RunSummary>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self {
            started: Mutex::new(None),
            comparisons: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            duplicates: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            missing: Mutex::new(Vec::new()),
            delete_failures: Mutex::new(Vec::new()),
            sweep_failures: Mutex::new(Vec::new()),
            completed: Mutex::new(None),
        }
    }
}

#[async_trait]
impl DedupReporter for RecordingReporter {
    async fn report_started(&self, total_images: usize, total_pairs: usize) {
        *self.started.lock().unwrap() = Some((total_images, total_pairs));
    }

    async fn report_comparison(&self, task: &ComparisonTask, score: f64) {
        self.comparisons
            .lock()
            .unwrap()
            .push((task.to_string(), score));
    }

    async fn report_comparison_failed(&self, task: &ComparisonTask, _error: &str) {
        self.failures.lock().unwrap().push(task.to_string());
    }

    async fn report_duplicate(&self, request: &DeletionRequest) {
        self.duplicates.lock().unwrap().push(request.clone());
    }

    async fn report_deleted(&self, path: &Path) {
        self.deleted.lock().unwrap().push(path.to_path_buf());
    }

    async fn report_missing(&self, path: &Path) {
        self.missing.lock().unwrap().push(path.to_path_buf());
    }

    async fn report_delete_failed(&self, path: &Path, _error: &str) {
        self.delete_failures.lock().unwrap().push(path.to_path_buf());
    }

    async fn report_sweep_failed(&self, directory: &str, _error: &str) {
        self.sweep_failures
            .lock()
            .unwrap()
            .push(directory.to_string());
    }

    async fn report_completed(&self, summary: &RunSummary) {
        *self.completed.lock().unwrap() = Some(summary.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ImageKind, ImageRef};

    fn task(a: &str, b: &str) -> ComparisonTask {
        ComparisonTask::new(
            ImageRef::new(0, a, ImageKind::Jpeg),
            ImageRef::new(1, b, ImageKind::Jpeg),
        )
    }

    #[tokio::test]
    async fn test_mock_comparator_behaviors() {
        let comparator = MockComparator::new()
            .with_score("a.jpg", "b.jpg", 97.0)
            .with_failure("a.jpg", "c.jpg");

        assert_eq!(comparator.compare(&task("a.jpg", "b.jpg")).await.unwrap(), 97.0);
        assert!(comparator.compare(&task("a.jpg", "c.jpg")).await.is_err());
        assert_eq!(comparator.compare(&task("b.jpg", "c.jpg")).await.unwrap(), 0.0);
        assert_eq!(comparator.call_count(), 3);
        assert!(comparator.was_called("b.jpg", "c.jpg"));
    }
}
