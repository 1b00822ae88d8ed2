//! Data models for archive documents, extracted articles, and duplicate labels.
//!
//! This module defines the core data structures used throughout the crate:
//! - [`ParagraphBlock`]: One styled paragraph of a source document
//! - [`ArticleRecord`]: A single article recovered by the segmenter
//! - [`DuplicateLabel`]: The near-duplicate verdict for one record at one threshold
//! - [`LabeledArticle`]: An article plus every threshold's label fields, as written to disk

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// One paragraph of a source document.
///
/// Blocks are read by position only. The style name is consulted solely to
/// find the heading that opens each article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphBlock {
    /// Resolved paragraph style name, e.g. `"Heading 1"` or `"Normal"`.
    pub style: String,
    /// Raw paragraph text.
    pub text: String,
}

impl ParagraphBlock {
    pub fn new(style: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            text: text.into(),
        }
    }

    /// A block in the default body style.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new("Normal", text)
    }

    /// Whether this block's style contains `heading_style`, ignoring case
    /// and whitespace.
    ///
    /// Word stores built-in style names in lower case (`heading 1`) while
    /// its UI shows `Heading 1`, and a document without a styles part only
    /// carries the style id (`Heading1`); all three match.
    pub fn is_heading(&self, heading_style: &str) -> bool {
        squash(&self.style).contains(&squash(heading_style))
    }
}

/// Lower-case `text` with all whitespace removed.
fn squash(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// An article recovered from an archive document.
///
/// # Date invariant
///
/// `date` is `None` only when neither the header date nor the body's
/// `Load-Date:` marker could be parsed. That case is always logged with the
/// document path and the article title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// The headline, taken from the heading block.
    pub title: String,
    /// The publication name, from the block after the headline.
    pub publisher: String,
    /// Publication date, serialized as `YYYY-MM-DD`.
    pub date: Option<NaiveDate>,
    /// The `Section:` metadata value, if present in the header.
    pub section: Option<String>,
    /// The `Length:` metadata value (e.g. `"812 words"`), if present.
    pub length: Option<String>,
    /// Newline-joined body paragraphs.
    pub body: String,
    /// The header date was unusable and a `Correction Appended` notice followed it.
    pub correction_appended: bool,
    /// The header date was unusable and the date was sought in the `Load-Date:` trailer.
    pub load_date_at_end: bool,
    /// `<parent dir>/<file name>` of the originating document.
    pub source_file: String,
}

/// Near-duplicate verdict for one record at one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DuplicateLabel {
    pub is_near_duplicate: bool,
    /// Corpus position of the representative this record matched.
    pub duplicate_of_index: Option<usize>,
}

impl DuplicateLabel {
    pub fn original() -> Self {
        Self::default()
    }

    pub fn duplicate_of(index: usize) -> Self {
        Self {
            is_near_duplicate: true,
            duplicate_of_index: Some(index),
        }
    }
}

/// A similarity cutoff and the label it produced, keyed for output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdLabel {
    /// Field suffix, `trunc(threshold * 100)`.
    pub percent: u32,
    pub label: DuplicateLabel,
}

/// An article together with its duplicate labels for every threshold.
///
/// Serializes flat: the article's own fields followed by one
/// `is_near_duplicate_<pct>` / `duplicate_of_index_<pct>` pair per threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArticle {
    pub record: ArticleRecord,
    pub labels: Vec<ThresholdLabel>,
}

impl LabeledArticle {
    /// The label computed at the threshold whose suffix is `percent`.
    pub fn label(&self, percent: u32) -> Option<DuplicateLabel> {
        self.labels
            .iter()
            .find(|l| l.percent == percent)
            .map(|l| l.label)
    }
}

impl Serialize for LabeledArticle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let r = &self.record;
        let mut map = serializer.serialize_map(Some(9 + 2 * self.labels.len()))?;
        map.serialize_entry("title", &r.title)?;
        map.serialize_entry("publisher", &r.publisher)?;
        map.serialize_entry("date", &r.date)?;
        map.serialize_entry("section", &r.section)?;
        map.serialize_entry("length", &r.length)?;
        map.serialize_entry("body", &r.body)?;
        map.serialize_entry("correction_appended", &r.correction_appended)?;
        map.serialize_entry("load_date_at_end", &r.load_date_at_end)?;
        map.serialize_entry("source_file", &r.source_file)?;
        for l in &self.labels {
            map.serialize_entry(
                &format!("is_near_duplicate_{}", l.percent),
                &l.label.is_near_duplicate,
            )?;
            map.serialize_entry(
                &format!("duplicate_of_index_{}", l.percent),
                &l.label.duplicate_of_index,
            )?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ArticleRecord {
        ArticleRecord {
            title: "Council approves budget".to_string(),
            publisher: "The Daily Ledger".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 11, 19),
            section: Some("LOCAL; Pg. A1".to_string()),
            length: Some("512 words".to_string()),
            body: "First paragraph.\nSecond paragraph.".to_string(),
            correction_appended: false,
            load_date_at_end: false,
            source_file: "2024/ledger.docx".to_string(),
        }
    }

    #[test]
    fn test_heading_detection_ignores_case() {
        assert!(ParagraphBlock::new("Heading 1", "x").is_heading("Heading 1"));
        assert!(ParagraphBlock::new("heading 1", "x").is_heading("Heading 1"));
        assert!(!ParagraphBlock::new("Heading 2", "x").is_heading("Heading 1"));
        assert!(!ParagraphBlock::plain("x").is_heading("Heading 1"));
    }

    #[test]
    fn test_heading_detection_matches_style_ids() {
        assert!(ParagraphBlock::new("Heading1", "x").is_heading("Heading 1"));
        assert!(ParagraphBlock::new("heading 1", "x").is_heading("Heading1"));
        assert!(!ParagraphBlock::new("Heading2", "x").is_heading("Heading 1"));
    }

    #[test]
    fn test_article_record_date_serializes_as_iso() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains(r#""date":"2024-11-19""#));

        let mut missing = sample_record();
        missing.date = None;
        let json = serde_json::to_string(&missing).unwrap();
        assert!(json.contains(r#""date":null"#));
    }

    #[test]
    fn test_article_record_deserialization() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        let back: ArticleRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.date, NaiveDate::from_ymd_opt(2024, 11, 19));
        assert_eq!(back.section.as_deref(), Some("LOCAL; Pg. A1"));
    }

    #[test]
    fn test_labeled_article_flattens_threshold_fields() {
        let labeled = LabeledArticle {
            record: sample_record(),
            labels: vec![
                ThresholdLabel {
                    percent: 80,
                    label: DuplicateLabel::duplicate_of(3),
                },
                ThresholdLabel {
                    percent: 95,
                    label: DuplicateLabel::original(),
                },
            ],
        };

        let value = serde_json::to_value(&labeled).unwrap();
        assert_eq!(value["title"], "Council approves budget");
        assert_eq!(value["is_near_duplicate_80"], true);
        assert_eq!(value["duplicate_of_index_80"], 3);
        assert_eq!(value["is_near_duplicate_95"], false);
        assert!(value["duplicate_of_index_95"].is_null());
        assert_eq!(labeled.label(95), Some(DuplicateLabel::original()));
        assert_eq!(labeled.label(50), None);
    }
}
