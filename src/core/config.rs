// 重複判定と削除に使う固定定数
//
// 閾値類はCLIからは変更できない。with_* はテストで同時実行数や猶予時間を
// 縮めるためにだけ使う。

use super::error::{DedupError, DedupResult};
use std::time::Duration;

/// 重複とみなすスコアの下限
pub const DUPLICATE_THRESHOLD: f64 = 95.0;

/// ハッシュ距離がこの値未満なら即座に重複と判定する
pub const HASH_DISTANCE_THRESHOLD: u32 = 5;

/// 知覚ハッシュのサイズ（8x8 = 64ビット）
pub const HASH_SIZE: u32 = 8;

/// ハッシュ段階で重複判定したときに返すスコア
pub const HASH_MATCH_SCORE: f64 = 95.0;

/// ピクセル差分の正規化解像度
pub const CANONICAL_SIZE: u32 = 256;

/// ピクセル単位の色差閾値（0.0〜1.0）
pub const PIXEL_THRESHOLD: f64 = 0.1;

/// 削除前の猶予時間
pub const DELETION_GRACE: Duration = Duration::from_millis(100);

/// 同時に実行できる比較タスクの上限
pub const MAX_CONCURRENT_COMPARISONS: usize = 5;

/// 比較タスク1件あたりの制限時間
pub const COMPARISON_TIMEOUT: Duration = Duration::from_secs(120);

/// 変換で生成される一時ファイルの接頭辞
pub const TEMP_ARTIFACT_PREFIX: &str = "temp_convert_to_jpeg_";

/// パイプライン全体の設定
#[derive(Debug, Clone)]
pub struct DedupConfig {
    pub duplicate_threshold: f64,
    pub hash_distance_threshold: u32,
    pub hash_size: u32,
    pub hash_match_score: f64,
    pub canonical_size: u32,
    pub pixel_threshold: f64,
    pub deletion_grace: Duration,
    pub max_concurrent: usize,
    pub comparison_timeout: Duration,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: DUPLICATE_THRESHOLD,
            hash_distance_threshold: HASH_DISTANCE_THRESHOLD,
            hash_size: HASH_SIZE,
            hash_match_score: HASH_MATCH_SCORE,
            canonical_size: CANONICAL_SIZE,
            pixel_threshold: PIXEL_THRESHOLD,
            deletion_grace: DELETION_GRACE,
            max_concurrent: MAX_CONCURRENT_COMPARISONS,
            comparison_timeout: COMPARISON_TIMEOUT,
        }
    }
}

impl DedupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_deletion_grace(mut self, grace: Duration) -> Self {
        self.deletion_grace = grace;
        self
    }

    pub fn with_comparison_timeout(mut self, timeout: Duration) -> Self {
        self.comparison_timeout = timeout;
        self
    }

    /// スコアが重複とみなされるかどうか
    pub fn is_duplicate(&self, score: f64) -> bool {
        score >= self.duplicate_threshold
    }

    /// 設定値の検証
    pub fn validate(&self) -> DedupResult<()> {
        if self.max_concurrent == 0 {
            return Err(DedupError::configuration(
                "同時比較数は1以上である必要があります",
            ));
        }
        if self.canonical_size == 0 {
            return Err(DedupError::configuration(
                "正規化解像度は1以上である必要があります",
            ));
        }
        if !(0.0..=1.0).contains(&self.pixel_threshold) {
            return Err(DedupError::configuration(
                "ピクセル閾値は0.0〜1.0の範囲である必要があります",
            ));
        }
        Ok(())
    }
}
