// コアレイヤー - 設定、型、エラー定義
// 他のレイヤーから参照される基本的な定義を提供

pub mod config;
pub mod error;
pub mod types;

// 公開API
pub use config::DedupConfig;
pub use error::{DedupError, DedupResult};
pub use types::{
    ComparisonTask, DeletionRequest, DeletionSummary, ImageKind, ImageRef, RunSummary,
    SweepOutcome,
};
