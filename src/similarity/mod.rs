// 類似度判定
// ハッシュによる事前判定とピクセル差分による本判定

pub mod engine;
pub mod pixel_diff;

pub use engine::{ScoreStage, SimilarityEngine, SimilarityScore};
