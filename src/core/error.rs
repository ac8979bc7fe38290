// 重複削除パイプライン専用のカスタムエラー型定義

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// パイプライン固有のエラー型
#[derive(Error, Debug)]
pub enum DedupError {
    #[error("ファイル発見エラー: {path} - {source}")]
    FileDiscoveryError {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("フォーマット変換エラー: {} - {source}", .path.display())]
    ConversionError {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("画像読み込みエラー: {} - {source}", .path.display())]
    ImageReadError {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("比較タイムアウト: {pair} ({}ms)", .timeout.as_millis())]
    ComparisonTimeout { pair: String, timeout: Duration },

    #[error("削除エラー: {} - {source}", .path.display())]
    DeletionError {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("{primary} (一時ファイルの削除にも失敗: {cleanup})")]
    CleanupFailed {
        #[source]
        primary: Box<DedupError>,
        cleanup: Box<DedupError>,
    },

    #[error("タスクエラー: {source}")]
    TaskError {
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("設定エラー: {message}")]
    ConfigurationError { message: String },

    #[error("並行制御エラー: {message}")]
    ConcurrencyError { message: String },
}

impl DedupError {
    /// ファイル発見エラーの作成
    pub fn file_discovery(path: impl Into<String>, source: anyhow::Error) -> Self {
        Self::FileDiscoveryError {
            path: path.into(),
            source,
        }
    }

    /// フォーマット変換エラーの作成
    pub fn conversion(path: impl AsRef<Path>, source: anyhow::Error) -> Self {
        Self::ConversionError {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// 画像読み込みエラーの作成
    pub fn image_read(path: impl AsRef<Path>, source: anyhow::Error) -> Self {
        Self::ImageReadError {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// 比較タイムアウトの作成
    pub fn comparison_timeout(pair: impl Into<String>, timeout: Duration) -> Self {
        Self::ComparisonTimeout {
            pair: pair.into(),
            timeout,
        }
    }

    /// 削除エラーの作成
    pub fn deletion(path: impl AsRef<Path>, source: anyhow::Error) -> Self {
        Self::DeletionError {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// 本処理の失敗に一時ファイル削除の失敗を添える
    pub fn cleanup_failed(primary: DedupError, cleanup: DedupError) -> Self {
        Self::CleanupFailed {
            primary: Box::new(primary),
            cleanup: Box::new(cleanup),
        }
    }

    /// タスクエラーの作成
    pub fn task(source: tokio::task::JoinError) -> Self {
        Self::TaskError { source }
    }

    /// 設定エラーの作成
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// 並行制御エラーの作成
    pub fn concurrency(message: impl Into<String>) -> Self {
        Self::ConcurrencyError {
            message: message.into(),
        }
    }

    /// エラーが回復可能かどうかを判定
    ///
    /// 回復可能なエラーはその比較・削除だけの失敗として扱われ、実行全体は継続する
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::FileDiscoveryError { .. }
            | Self::ConfigurationError { .. }
            | Self::ConcurrencyError { .. } => false,
            Self::CleanupFailed { primary, .. } => primary.is_recoverable(),
            Self::ConversionError { .. }
            | Self::ImageReadError { .. }
            | Self::ComparisonTimeout { .. }
            | Self::DeletionError { .. }
            | Self::TaskError { .. } => true,
        }
    }
}

/// パイプラインの結果型
pub type DedupResult<T> = std::result::Result<T, DedupError>;
