//! Runtime configuration for the segmenter and the duplicate detector.
//!
//! Settings come from an optional YAML file (see [`ArchiveConfig::load`]);
//! every field has a default, so an empty file or no file at all is valid.
//! Command-line flags are applied on top by the binary.
//!
//! ```yaml
//! segmenter:
//!   heading_style: Heading 1
//!   metadata_lookahead: 20
//!   body_trim: drop_last_block
//! dedup:
//!   thresholds: [0.8, 0.95]
//!   similarity: tf_idf
//!   group_key:
//!     kind: title_cluster
//!     threshold: 0.6
//! ```

use crate::dedup::{threshold_percent, GroupKey};
use crate::errors::ConfigError;
use crate::similarity::SimilarityKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

/// How many blocks after the date line are searched for the `Body` marker.
pub const DEFAULT_METADATA_LOOKAHEAD: usize = 20;

/// What happens to the last body paragraph before `End of Document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyTrim {
    /// Drop the final captured paragraph. Archive exports end each body with
    /// a boilerplate trailer line, and existing downstream datasets were
    /// produced with this trim.
    #[default]
    DropLastBlock,
    /// Keep every paragraph up to the terminator.
    Keep,
}

/// Segmenter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Style name (case-insensitive substring) that opens an article.
    pub heading_style: String,
    /// Window size, in blocks, of the metadata scan.
    pub metadata_lookahead: usize,
    pub body_trim: BodyTrim,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            heading_style: "Heading 1".to_string(),
            metadata_lookahead: DEFAULT_METADATA_LOOKAHEAD,
            body_trim: BodyTrim::default(),
        }
    }
}

/// Near-duplicate detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Similarity cutoffs; each yields its own pair of output fields.
    pub thresholds: Vec<f64>,
    pub similarity: SimilarityKind,
    pub group_key: GroupKey,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            thresholds: vec![0.8, 0.95],
            similarity: SimilarityKind::default(),
            group_key: GroupKey::default(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub segmenter: SegmenterConfig,
    pub dedup: DedupConfig,
}

impl ArchiveConfig {
    /// Load and validate a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it does not deserialize, and a validation
    /// error if any value is out of range.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw)?;
        info!(
            lookahead = config.segmenter.metadata_lookahead,
            thresholds = ?config.dedup.thresholds,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: ArchiveConfig = if raw.trim().is_empty() {
            ArchiveConfig::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segmenter.metadata_lookahead == 0 {
            return Err(ConfigError::EmptyLookahead);
        }
        validate_thresholds(&self.dedup.thresholds)?;
        if let GroupKey::TitleCluster { threshold } = self.dedup.group_key {
            validate_thresholds(&[threshold])?;
        }
        Ok(())
    }
}

/// Reject cutoffs outside `[0, 1]` (including NaN) and cutoffs that would
/// write to the same output fields.
pub fn validate_thresholds(thresholds: &[f64]) -> Result<(), ConfigError> {
    if let Some(bad) = thresholds.iter().find(|t| !(0.0..=1.0).contains(*t)) {
        return Err(ConfigError::InvalidThreshold(*bad));
    }
    for (i, a) in thresholds.iter().enumerate() {
        if let Some(b) = thresholds[i + 1..]
            .iter()
            .find(|b| threshold_percent(**b) == threshold_percent(*a))
        {
            return Err(ConfigError::ThresholdCollision(*a, *b));
        }
    }
    Ok(())
}
