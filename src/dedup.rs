//! Near-duplicate detection within groups of articles.
//!
//! Records are partitioned by a [`GroupKey`] (normally a normalized title) and
//! bodies are compared only inside a group. For each threshold the first
//! record of every cluster becomes its *representative*; each later record is
//! compared with the representatives in the order they were found and
//! labeled a duplicate of the **first** one that scores at or above the
//! threshold. Records that match nothing become representatives themselves.
//!
//! Every threshold is evaluated independently and keeps its own labels, so a
//! record can be a duplicate at `0.80` and an original at `0.95`.

use crate::config::validate_thresholds;
use crate::errors::ConfigError;
use crate::models::{ArticleRecord, DuplicateLabel, LabeledArticle, ThresholdLabel};
use crate::similarity::SimilarityProvider;
use crate::titles::{date_components, standardize_text, title_clusters, DEFAULT_STOP_YEARS};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Which value partitions records before bodies are compared.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupKey {
    /// The title exactly as extracted.
    Title,
    /// The title via [`standardize_text`] with date words removed.
    #[default]
    NormalizedTitle,
    Publisher,
    /// ISO date, or the empty string for undated records.
    Date,
    SourceFile,
    /// Normalized titles joined transitively by the title similarity index.
    TitleCluster { threshold: f64 },
}

impl GroupKey {
    /// The group value of every record, in record order.
    pub fn keys(&self, records: &[ArticleRecord]) -> Vec<String> {
        match self {
            GroupKey::Title => records.iter().map(|r| r.title.clone()).collect(),
            GroupKey::NormalizedTitle => normalized_titles(records),
            GroupKey::Publisher => records.iter().map(|r| r.publisher.clone()).collect(),
            GroupKey::Date => records
                .iter()
                .map(|r| r.date.map(|d| d.to_string()).unwrap_or_default())
                .collect(),
            GroupKey::SourceFile => records.iter().map(|r| r.source_file.clone()).collect(),
            GroupKey::TitleCluster { threshold } => {
                let titles = normalized_titles(records);
                title_clusters(&titles, *threshold)
                    .into_iter()
                    .map(|root| titles[root].clone())
                    .collect()
            }
        }
    }
}

fn normalized_titles(records: &[ArticleRecord]) -> Vec<String> {
    let stop = date_components(DEFAULT_STOP_YEARS);
    records
        .iter()
        .map(|r| standardize_text(&r.title, Some(&stop)))
        .collect()
}

/// Output field suffix of a threshold: `trunc(threshold * 100)`.
pub fn threshold_percent(threshold: f64) -> u32 {
    (threshold * 100.0) as u32
}

/// Records sharing one group key, by corpus position, in corpus order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarityGroup {
    pub key: String,
    pub members: Vec<usize>,
}

/// Partition positions by key. Groups are ordered by their first member.
pub fn partition(keys: &[String]) -> Vec<SimilarityGroup> {
    keys.iter()
        .enumerate()
        .map(|(i, key)| (key.clone(), i))
        .into_group_map()
        .into_iter()
        .map(|(key, members)| SimilarityGroup { key, members })
        .sorted_by_key(|g| g.members[0])
        .collect()
}

/// Representatives seen so far in one group, in insertion order.
struct Representatives<'a> {
    seen: Vec<(usize, &'a str)>,
}

impl<'a> Representatives<'a> {
    fn new() -> Self {
        Self { seen: Vec::new() }
    }

    /// Corpus position of the first representative scoring `>= threshold`.
    fn first_match(&self, body: &str, threshold: f64, provider: &dyn SimilarityProvider) -> Option<usize> {
        self.seen
            .iter()
            .find(|(_, seen)| provider.similarity(body, seen) >= threshold)
            .map(|(index, _)| *index)
    }

    fn push(&mut self, index: usize, body: &'a str) {
        self.seen.push((index, body));
    }
}

/// Label the members of one group at one threshold.
///
/// `members` are `(corpus position, body)` pairs in corpus order; the result
/// has one label per member, in the same order.
pub fn mark_duplicates(
    members: &[(usize, &str)],
    threshold: f64,
    provider: &dyn SimilarityProvider,
) -> Vec<DuplicateLabel> {
    let mut representatives = Representatives::new();
    members
        .iter()
        .map(|&(index, body)| match representatives.first_match(body, threshold, provider) {
            Some(original) => DuplicateLabel::duplicate_of(original),
            None => {
                representatives.push(index, body);
                DuplicateLabel::original()
            }
        })
        .collect()
}

/// Labels for a whole corpus, one set per threshold for every record.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateReport {
    labels: Vec<Vec<ThresholdLabel>>,
}

impl DuplicateReport {
    /// All threshold labels of the record at `index`.
    pub fn labels_for(&self, index: usize) -> &[ThresholdLabel] {
        &self.labels[index]
    }

    /// The label of the record at `index` for threshold suffix `percent`.
    pub fn label(&self, index: usize, percent: u32) -> Option<DuplicateLabel> {
        self.labels
            .get(index)?
            .iter()
            .find(|l| l.percent == percent)
            .map(|l| l.label)
    }

    /// How many records are near-duplicates at threshold suffix `percent`.
    pub fn duplicate_count(&self, percent: u32) -> usize {
        self.labels
            .iter()
            .filter(|set| {
                set.iter()
                    .any(|l| l.percent == percent && l.label.is_near_duplicate)
            })
            .count()
    }

    /// Attach the labels to the records they were computed for.
    pub fn into_labeled(self, records: Vec<ArticleRecord>) -> Vec<LabeledArticle> {
        records
            .into_iter()
            .zip(self.labels)
            .map(|(record, labels)| LabeledArticle { record, labels })
            .collect()
    }
}

/// Label every record as a near-duplicate or an original, per threshold.
///
/// # Arguments
///
/// * `records` - The pooled corpus; positions in it are the record identities
/// * `group_key` - How records are partitioned before comparison
/// * `thresholds` - Similarity cutoffs, each evaluated independently
/// * `provider` - Scores two bodies
///
/// # Returns
///
/// A [`DuplicateReport`] holding, for every record, one [`ThresholdLabel`]
/// per threshold in the order given. Running it twice on the same input
/// yields the same report.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidThreshold`] for a cutoff outside `[0, 1]`
/// and [`ConfigError::ThresholdCollision`] when two cutoffs share an output
/// field suffix.
#[instrument(level = "info", skip_all, fields(records = records.len(), group_key = ?group_key))]
pub fn detect_duplicates(
    records: &[ArticleRecord],
    group_key: &GroupKey,
    thresholds: &[f64],
    provider: &dyn SimilarityProvider,
) -> Result<DuplicateReport, ConfigError> {
    validate_thresholds(thresholds)?;
    let groups = partition(&group_key.keys(records));
    debug!(groups = groups.len(), "Partitioned records");

    let mut labels: Vec<Vec<ThresholdLabel>> = vec![Vec::with_capacity(thresholds.len()); records.len()];
    for &threshold in thresholds {
        let t0 = Instant::now();
        let percent = threshold_percent(threshold);
        info!(threshold, "Obtaining near-duplicates flag");

        for group in &groups {
            let members: Vec<(usize, &str)> = group
                .members
                .iter()
                .map(|&i| (i, records[i].body.as_str()))
                .collect();
            let group_labels = mark_duplicates(&members, threshold, provider);
            for (&index, label) in group.members.iter().zip(group_labels) {
                labels[index].push(ThresholdLabel { percent, label });
            }
        }

        let duplicates = labels
            .iter()
            .filter(|set| set.last().is_some_and(|l| l.label.is_near_duplicate))
            .count();
        info!(threshold, duplicates, elapsed = ?t0.elapsed(), "Near-duplicate pass complete");
    }

    Ok(DuplicateReport { labels })
}
