// パイプラインで受け渡すデータ型定義

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// 拡張子から推定した画像フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    /// 拡張子（大文字小文字は区別しない）からフォーマットを判定
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// JPEGへの変換が必要かどうか
    pub fn needs_conversion(&self) -> bool {
        matches!(self, Self::Png)
    }
}

/// 列挙された画像への参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// 列挙順でのインデックス
    pub index: usize,
    pub path: PathBuf,
    pub kind: ImageKind,
}

impl ImageRef {
    pub fn new(index: usize, path: impl Into<PathBuf>, kind: ImageKind) -> Self {
        Self {
            index,
            path: path.into(),
            kind,
        }
    }

    /// ファイル名（表示用）
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// 比較タスク。a は常に b より前に列挙されている
#[derive(Debug, Clone)]
pub struct ComparisonTask {
    pub a: ImageRef,
    pub b: ImageRef,
}

impl ComparisonTask {
    pub fn new(a: ImageRef, b: ImageRef) -> Self {
        debug_assert!(a.index < b.index);
        Self { a, b }
    }
}

impl fmt::Display for ComparisonTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.a.name(), self.b.name())
    }
}

/// 削除要求
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionRequest {
    pub path: PathBuf,
    /// 重複相手（残される側）
    pub kept: PathBuf,
    pub score: f64,
}

/// 比較スイープの結果
#[derive(Debug, Clone, Default)]
pub struct SweepOutcome {
    pub requests: Vec<DeletionRequest>,
    pub comparisons: usize,
    pub failed_comparisons: usize,
}

/// 削除処理の結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionSummary {
    pub deleted: usize,
    pub missing: usize,
    pub failed: usize,
}

/// 1回の実行全体のサマリー
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub directory: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_images: usize,
    pub comparisons: usize,
    pub failed_comparisons: usize,
    pub duplicates_found: usize,
    pub deletions: DeletionSummary,
    pub artifacts_removed: usize,
    /// 一時ファイル掃除の列挙に失敗した場合のエラー
    pub artifact_sweep_error: Option<String>,
    pub elapsed_ms: u64,
}
