use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;

pub mod mean_hash;

/// ハッシュ計算の結果
#[derive(Debug, Clone, PartialEq)]
pub struct HashResult {
    /// ハッシュ値（バイナリ形式）
    pub hash_data: Vec<u8>,
    /// ハッシュサイズ（ビット数）
    pub hash_size_bits: u32,
}

impl HashResult {
    /// ハッシュをビット文字列として取得
    ///
    /// 端数ビットは切り捨てて、常に `hash_size_bits` 文字にそろえる
    pub fn to_bits(&self) -> String {
        self.hash_data
            .iter()
            .map(|byte| format!("{byte:08b}"))
            .collect::<String>()
            .chars()
            .take(self.hash_size_bits as usize)
            .collect()
    }
}

impl fmt::Display for HashResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hash({} bits): {}",
            self.hash_size_bits,
            self.to_bits()
        )
    }
}

/// 2つの同じ長さの文字列で異なる位置の数を数える
pub fn hamming_distance(a: &str, b: &str) -> Result<u32> {
    if a.chars().count() != b.chars().count() {
        anyhow::bail!("Cannot compare hashes of different lengths");
    }

    Ok(a.chars().zip(b.chars()).filter(|(x, y)| x != y).count() as u32)
}

/// 知覚ハッシュバックエンドのトレイト
#[async_trait]
pub trait PerceptualHashBackend: Send + Sync {
    /// 画像からハッシュを生成（変換を含む重い処理はブロッキングスレッドで行う）
    async fn generate_hash(&self, image: Arc<DynamicImage>) -> Result<HashResult>;

    /// 2つのハッシュ間の距離を計算（ビット文字列のハミング距離）
    fn calculate_distance(&self, hash1: &HashResult, hash2: &HashResult) -> Result<u32> {
        hamming_distance(&hash1.to_bits(), &hash2.to_bits())
    }
}
