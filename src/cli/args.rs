use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "image_prune")]
#[command(about = "Find near-duplicate images in a directory and delete the redundant copies")]
#[command(version)]
pub struct Cli {
    /// Target directory to prune
    #[arg(default_value = ".")]
    pub target_directory: PathBuf,

    /// Only print errors and the final summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}
