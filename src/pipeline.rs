//! Corpus-level parsing: many documents, one worker per document.
//!
//! Documents share nothing, so each one is read and segmented on its own
//! blocking task. At most `workers` tasks run at once and they finish in any
//! order; results are put back into input order before they are merged, so
//! the pooled corpus is the same as a sequential run would produce.
//!
//! A document that fails (unreadable archive, missing `Body` marker, missing
//! correction date, ...) is logged and contributes no articles. It never
//! stops the rest of the corpus.

use crate::config::SegmenterConfig;
use crate::docx::read_docx;
use crate::errors::DocumentError;
use crate::models::ArticleRecord;
use crate::segmenter::segment_document;
use crate::utils::relative_source_path;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

/// The result of parsing one input file.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    /// `<parent dir>/<file name>`, as stamped on the records.
    pub source_file: String,
    pub result: Result<Vec<ArticleRecord>, DocumentError>,
}

/// Every document's outcome, in input order.
#[derive(Debug, Default)]
pub struct CorpusParse {
    pub outcomes: Vec<DocumentOutcome>,
}

impl CorpusParse {
    /// Concatenate the articles of all successful documents, in input order.
    pub fn articles(&self) -> Vec<ArticleRecord> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
            .cloned()
            .collect()
    }

    /// Consume the parse, keeping only the pooled articles.
    pub fn into_articles(self) -> Vec<ArticleRecord> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .flatten()
            .collect()
    }

    /// `(source_file, error)` for every document that failed.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &DocumentError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.source_file.as_str(), e)))
    }
}

/// Read and segment one `.docx` file.
pub fn parse_document(path: &Path, config: &SegmenterConfig) -> Result<Vec<ArticleRecord>, DocumentError> {
    let source_file = relative_source_path(path);
    let blocks = read_docx(path)?;
    Ok(segment_document(&blocks, &source_file, config)?)
}

/// Parse every document in `paths` with at most `workers` running at once.
///
/// # Arguments
///
/// * `paths` - Input files; their order is the order of the merged corpus
/// * `config` - Segmenter settings shared by every task
/// * `workers` - Maximum number of documents parsed concurrently (min. 1)
///
/// # Returns
///
/// One [`DocumentOutcome`] per input path, in input order.
#[instrument(level = "info", skip_all, fields(documents = paths.len(), workers = workers))]
pub async fn parse_corpus(paths: Vec<PathBuf>, config: Arc<SegmenterConfig>, workers: usize) -> CorpusParse {
    let t0 = Instant::now();

    let mut indexed: Vec<(usize, DocumentOutcome)> = stream::iter(paths.into_iter().enumerate())
        .map(|(i, path)| {
            let config = Arc::clone(&config);
            async move {
                let source_file = relative_source_path(&path);
                let task_path = path.clone();
                let joined =
                    tokio::task::spawn_blocking(move || parse_document(&task_path, &config)).await;
                let result = match joined {
                    Ok(result) => result,
                    Err(e) => Err(DocumentError::Worker(e.to_string())),
                };
                match &result {
                    Ok(articles) => info!(%source_file, count = articles.len(), "Parsed document"),
                    Err(e) => error!(%source_file, error = %e, "Failed to parse document; skipping it"),
                }
                (
                    i,
                    DocumentOutcome {
                        path,
                        source_file,
                        result,
                    },
                )
            }
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    indexed.sort_by_key(|(i, _)| *i);
    let parse = CorpusParse {
        outcomes: indexed.into_iter().map(|(_, o)| o).collect(),
    };

    let failed = parse.failures().count();
    info!(
        documents = parse.outcomes.len(),
        failed,
        articles = parse.outcomes.iter().filter_map(|o| o.result.as_ref().ok()).map(Vec::len).sum::<usize>(),
        elapsed = ?t0.elapsed(),
        "Parsed corpus"
    );
    parse
}
