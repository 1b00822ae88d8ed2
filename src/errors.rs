//! Error types for date normalization, article extraction, document reading,
//! and configuration loading.
//!
//! The hierarchy mirrors how far a failure is allowed to travel:
//!
//! - [`DateParseError`] is recoverable and drives the fallback date paths.
//! - [`ExtractionError`] aborts the remaining parse of one document.
//! - [`DocumentError`] wraps everything that can go wrong for one input file;
//!   the pipeline logs it and moves on to the next document.
//! - [`ConfigError`] is raised before any document is touched.

use std::io;
use thiserror::Error;

/// A date string did not match `"<Month> <day>[,] <year>"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable date {input:?}: {reason}")]
pub struct DateParseError {
    /// The candidate text that was handed to the normalizer.
    pub input: String,
    /// Which part of the pattern failed.
    pub reason: String,
}

impl DateParseError {
    pub(crate) fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures that make an article impossible to segment safely.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(
        "no \"Body\" marker within {lookahead} blocks of the header of {title:?} in {source_file}{}",
        ended_note(.document_ended)
    )]
    MissingBodyMarker {
        source_file: String,
        title: String,
        lookahead: usize,
        /// The document ran out of blocks before the window was filled.
        document_ended: bool,
    },
    #[error("correction date missing from the body of {title:?} in {source_file}")]
    MissingCorrectionDate {
        source_file: String,
        title: String,
        #[source]
        source: DateParseError,
    },
}

fn ended_note(document_ended: &bool) -> &'static str {
    if *document_ended { " (document ended first)" } else { "" }
}

/// Everything that can fail while turning one input file into records.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid docx archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("malformed document xml: {0}")]
    Xml(String),
    #[error("docx archive has no {0} part")]
    MissingPart(&'static str),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("parser task failed: {0}")]
    Worker(String),
}

impl From<quick_xml::Error> for DocumentError {
    fn from(e: quick_xml::Error) -> Self {
        DocumentError::Xml(e.to_string())
    }
}

/// Problems with the YAML configuration file or CLI overrides.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid config yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("similarity threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),
    #[error("thresholds {0} and {1} map to the same output fields")]
    ThresholdCollision(f64, f64),
    #[error("metadata lookahead must be at least 1 block")]
    EmptyLookahead,
}
