use clap::Parser;
use image_prune::{
    cli::Cli,
    core::RunSummary,
    processing::ConsoleReporter,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let target_dir = cli.target_directory.to_string_lossy().to_string();

    if !cli.quiet {
        println!("🚀 重複画像削除ツール");
        println!("📂 対象ディレクトリ: {target_dir}");
    }

    let reporter = if cli.quiet {
        ConsoleReporter::quiet()
    } else {
        ConsoleReporter::new()
    };

    // 成否にかかわらずここでプロセスを終了する
    let exit_code = match image_prune::run(&target_dir, reporter).await {
        Ok(summary) => {
            print_summary(&summary, cli.json);
            0
        }
        Err(error) => {
            eprintln!("❌ エラー: {error}");
            1
        }
    };

    std::process::exit(exit_code);
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(text) => println!("{text}"),
            Err(error) => eprintln!("❌ サマリーのJSON変換に失敗しました: {error}"),
        }
        return;
    }

    println!("📊 処理結果:");
    println!("   - 画像数: {}", summary.total_images);
    println!(
        "   - 比較数: {} (失敗 {})",
        summary.comparisons, summary.failed_comparisons
    );
    println!("   - 重複検出数: {}", summary.duplicates_found);
    println!(
        "   - 削除: {} / 既に無し: {} / 失敗: {}",
        summary.deletions.deleted, summary.deletions.missing, summary.deletions.failed
    );
    match &summary.artifact_sweep_error {
        Some(error) => println!("   - 一時ファイル掃除: 失敗 ({error})"),
        None => println!("   - 一時ファイル掃除: {}", summary.artifacts_removed),
    }
    println!("   - 総処理時間: {:.2}秒", summary.elapsed_ms as f64 / 1000.0);
}
