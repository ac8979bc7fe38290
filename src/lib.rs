pub mod cli;
pub mod core;
pub mod image_loader;
pub mod perceptual_hash;
pub mod processing;
pub mod similarity;
pub mod storage;

use crate::core::{DedupConfig, DedupResult, RunSummary};
use image_loader::standard::StandardImageLoader;
use perceptual_hash::mean_hash::MeanHasher;
use processing::{ComparisonUnit, DedupEngine, DedupReporter};
use storage::local::LocalStorageBackend;

/// 標準構成の比較ユニット
pub type StandardComparisonUnit = ComparisonUnit<StandardImageLoader, MeanHasher>;

/// 標準構成（ローカルFS、グレースケール平均値ハッシュ）のエンジンを作成
pub fn create_engine<R>(
    reporter: R,
    config: DedupConfig,
) -> DedupEngine<StandardComparisonUnit, LocalStorageBackend, R>
where
    R: DedupReporter + 'static,
{
    let comparator = ComparisonUnit::new(
        StandardImageLoader::new(),
        MeanHasher::new(config.hash_size),
        config.clone(),
    );
    DedupEngine::new(comparator, LocalStorageBackend::new(), reporter, config)
}

/// 標準構成でディレクトリを処理する（高レベル便利関数）
pub async fn run<R>(directory: &str, reporter: R) -> DedupResult<RunSummary>
where
    R: DedupReporter + 'static,
{
    create_engine(reporter, DedupConfig::default())
        .process_directory(directory)
        .await
}
