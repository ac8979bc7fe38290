// 重複削除パイプライン
// 比較ユニット、ペアワイズスケジューラ、削除マネージャとそれらを束ねるエンジン

pub mod comparison;
pub mod deletion;
pub mod engine;
pub mod reporting;
pub mod scheduler;

#[cfg(test)]
pub mod test_mocks;

// 公開API
pub use comparison::{ComparisonUnit, PairComparator};
pub use deletion::{DeletionManager, DeletionOutcome};
pub use engine::DedupEngine;
pub use reporting::{ConsoleReporter, DedupReporter, NoOpReporter};
pub use scheduler::PairwiseScheduler;
