//! Command-line interface definitions for Awful News Archive.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most arguments can be provided via command-line flags or environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Awful News Archive application.
///
/// Flags given here override the values of the optional YAML config file.
///
/// # Examples
///
/// ```sh
/// # Parse every export under ./raw and flag duplicates at the default thresholds
/// awful_news_archive -i ./raw -o ./out
///
/// # Keep one JSON file per input document and use custom thresholds
/// awful_news_archive -i ./raw -o ./out --save-intermediate --threshold 0.7 --threshold 0.9
///
/// # Parse only
/// awful_news_archive -i ./raw -o ./out --skip-duplicates
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding one subdirectory per export batch, each with .docx files
    #[arg(short, long, env = "ARCHIVE_INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Output directory for the JSON files
    #[arg(short, long, env = "ARCHIVE_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Optional path to config.yaml file
    #[arg(short, long, env = "ARCHIVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write one JSON file per input document under parsed_files/
    #[arg(long)]
    pub save_intermediate: bool,

    /// Number of documents parsed concurrently (default: cores minus one)
    #[arg(long, env = "ARCHIVE_WORKERS")]
    pub workers: Option<usize>,

    /// Near-duplicate similarity threshold; repeat for several
    #[arg(long = "threshold", value_name = "THRESHOLD")]
    pub thresholds: Vec<f64>,

    /// Stop after parsing; do not run duplicate detection
    #[arg(long)]
    pub skip_duplicates: bool,

    /// Also write the title similarity index, linking titles scoring above this value
    #[arg(long, value_name = "THRESHOLD")]
    pub title_index: Option<f64>,
}
