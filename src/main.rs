//! # Awful News Archive
//!
//! Command-line front end: segments every news-archive `.docx` export under an
//! input directory into article records, then labels near-duplicate articles
//! and writes everything as JSON.
//!
//! ## Usage
//!
//! ```sh
//! awful_news_archive -i ./raw -o ./out
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: Find `<input_dir>/*/*.docx`, sorted by path
//! 2. **Parsing**: Segment documents concurrently, merged back in input order
//! 3. **Output**: Write the pooled corpus (and, optionally, one file per document)
//! 4. **Deduplication**: Label every article once per similarity threshold

use awful_news_archive::config::{validate_thresholds, ArchiveConfig};
use awful_news_archive::dedup::{detect_duplicates, threshold_percent};
use awful_news_archive::outputs::json;
use awful_news_archive::pipeline::parse_corpus;
use awful_news_archive::titles::title_similarity_index;
use awful_news_archive::utils::{default_workers, discover_documents, ensure_writable_dir};
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;

use cli::Cli;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("awful_news_archive starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(input_dir = %args.input_dir.display(), output_dir = %args.output_dir.display(), "Parsed CLI arguments");

    // ---- Load config, CLI overrides on top ----
    let mut config = match &args.config {
        Some(path) => ArchiveConfig::load(path)?,
        None => ArchiveConfig::default(),
    };
    if !args.thresholds.is_empty() {
        config.dedup.thresholds = args.thresholds.clone();
    }
    config.validate()?;
    if let Some(threshold) = args.title_index {
        validate_thresholds(&[threshold])?;
    }

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Parse documents ----
    let documents = discover_documents(&args.input_dir, "docx")?;
    let workers = args.workers.unwrap_or_else(default_workers).max(1);
    info!(documents = documents.len(), workers, "Starting parallel document parsing");

    let parse = parse_corpus(documents, Arc::new(config.segmenter.clone()), workers).await;

    if args.save_intermediate {
        for outcome in &parse.outcomes {
            if let Ok(records) = &outcome.result {
                if let Err(e) = json::write_intermediate(&args.output_dir, &outcome.path, records).await {
                    error!(source_file = %outcome.source_file, error = %e, "Failed to write intermediate JSON");
                }
            }
        }
    }

    let failed_documents = parse.failures().count();
    let articles = parse.into_articles();
    info!(count = articles.len(), failed_documents, "Total articles parsed");
    json::write_json(&articles, &args.output_dir.join(json::PARSED_ARTICLES)).await?;

    // ---- Title similarity index ----
    if let Some(threshold) = args.title_index {
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        let index = title_similarity_index(&titles, threshold);
        info!(linked_titles = index.len(), threshold, "Built title similarity index");
        json::write_json(&index, &args.output_dir.join(json::TITLE_SIMILARITY)).await?;
    }

    // ---- Near-duplicate detection ----
    if args.skip_duplicates {
        info!("Skipping near-duplicate detection");
    } else {
        let dedup = config.dedup.clone();
        let (articles, report) = tokio::task::spawn_blocking(move || {
            let provider = dedup.similarity.provider();
            let report = detect_duplicates(&articles, &dedup.group_key, &dedup.thresholds, provider.as_ref());
            (articles, report)
        })
        .await?;
        let report = report?;

        for &threshold in &config.dedup.thresholds {
            info!(
                threshold,
                duplicates = report.duplicate_count(threshold_percent(threshold)),
                "Near-duplicates found"
            );
        }

        let labeled = report.into_labeled(articles);
        json::write_json(&labeled, &args.output_dir.join(json::LABELED_ARTICLES)).await?;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
