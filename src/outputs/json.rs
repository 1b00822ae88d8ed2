//! JSON output for parsed and labeled corpora.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── parsed_articles.json        # every record, input order
//! ├── labeled_articles.json       # records plus is_near_duplicate_<pct> fields
//! ├── title_similarity.json       # optional title index
//! └── parsed_files/
//!     ├── <stem>_parsed_articles.json
//!     └── ...
//! ```

use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Pooled corpus, before duplicate detection.
pub const PARSED_ARTICLES: &str = "parsed_articles.json";
/// Pooled corpus with one label pair per threshold.
pub const LABELED_ARTICLES: &str = "labeled_articles.json";
/// Title similarity index.
pub const TITLE_SIMILARITY: &str = "title_similarity.json";
/// Subdirectory for per-document intermediate files.
pub const PARSED_FILES_DIR: &str = "parsed_files";

/// Serialize `value` as JSON and write it to `path`, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns an error if serialization, directory creation, or the write fails.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!("Wrote JSON file");
    Ok(())
}

/// Where the intermediate file for one input document goes:
/// `<output_dir>/parsed_files/<stem>_parsed_articles.json`.
pub fn intermediate_path(output_dir: &Path, document: &Path) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir
        .join(PARSED_FILES_DIR)
        .join(format!("{stem}_{PARSED_ARTICLES}"))
}

/// Write one document's records to its intermediate file.
///
/// # Returns
///
/// The path that was written.
pub async fn write_intermediate<T: Serialize>(
    output_dir: &Path,
    document: &Path,
    records: &[T],
) -> Result<PathBuf, Box<dyn Error>> {
    let path = intermediate_path(output_dir, document);
    write_json(records, &path).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleRecord, DuplicateLabel, LabeledArticle, ThresholdLabel};
    use chrono::NaiveDate;

    fn record() -> ArticleRecord {
        ArticleRecord {
            title: "Council meets".to_string(),
            publisher: "The Daily Ledger".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 1, 1),
            section: Some("LOCAL".to_string()),
            length: Some("100 words".to_string()),
            body: "Paragraph one.".to_string(),
            correction_appended: false,
            load_date_at_end: false,
            source_file: "batch_1/a.docx".to_string(),
        }
    }

    #[test]
    fn test_intermediate_path() {
        let path = intermediate_path(Path::new("/out"), Path::new("/in/batch_1/Ledger_3.docx"));
        assert_eq!(
            path,
            PathBuf::from("/out/parsed_files/Ledger_3_parsed_articles.json")
        );
    }

    #[tokio::test]
    async fn test_write_intermediate_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_intermediate(dir.path(), Path::new("x/doc.docx"), &[record()])
            .await
            .unwrap();
        let raw = std::fs::read_to_string(&written).unwrap();
        let back: Vec<ArticleRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, vec![record()]);
        assert!(raw.contains("\"date\": \"2020-01-01\""));
    }

    #[tokio::test]
    async fn test_write_labeled_articles_flattens_labels() {
        let dir = tempfile::tempdir().unwrap();
        let labeled = vec![LabeledArticle {
            record: record(),
            labels: vec![ThresholdLabel {
                percent: 80,
                label: DuplicateLabel::duplicate_of(4),
            }],
        }];
        let path = dir.path().join(LABELED_ARTICLES);
        write_json(&labeled, &path).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["is_near_duplicate_80"], true);
        assert_eq!(value[0]["duplicate_of_index_80"], 4);
        assert_eq!(value[0]["title"], "Council meets");
    }
}
