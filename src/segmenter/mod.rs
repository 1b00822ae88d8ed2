//! Article segmentation for archive documents.
//!
//! An archive export is one long run of paragraphs in which every article
//! looks roughly like this:
//!
//! ```text
//! [Heading 1] Council approves budget        <- title
//!             The Daily Ledger                 <- publisher
//!             November 19, 2024 Tuesday        <- date line
//!             Copyright 2024 The Daily Ledger
//!             Section: LOCAL; Pg. A1
//!             Length: 512 words
//!             Body
//!             ...paragraphs...
//!             Load-Date: November 20, 2024
//!
//!             End of Document
//! ```
//!
//! Formatting drifts between publishers and years, so the scan is heuristic:
//!
//! 1. **Scanning**: skip ahead to the next block in the heading style.
//! 2. **Header capture**: heading text is the title, the next block is the
//!    publisher, the one after that is the date line.
//! 3. **Date resolution**: parse the date line; if that fails, defer the date
//!    to a `Correction-Date:` (when a `Correction Appended` notice follows the
//!    date line) or to the `Load-Date:` trailer.
//! 4. **Metadata scan**: within a bounded window, pick up `Section:` and
//!    `Length:` and stop at the `Body` marker.
//! 5. **Body capture**: collect paragraphs up to `End of Document`.
//!
//! [`next_article`] runs one pass of this machine from an explicit position
//! and returns where the next pass should start; [`segment_document`] drives
//! it across a whole document.

pub mod window;

use crate::config::{BodyTrim, SegmenterConfig};
use crate::dates::{date_candidate, normalize};
use crate::errors::{DateParseError, ExtractionError};
use crate::models::{ArticleRecord, ParagraphBlock};
use chrono::NaiveDate;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

pub use window::LookaheadWindow;

/// Notice printed right after the date line of corrected articles.
pub const CORRECTION_NOTICE: &str = "Correction Appended";
pub const SECTION_PREFIX: &str = "Section:";
pub const LENGTH_PREFIX: &str = "Length:";
/// Exact text of the block that precedes the article body.
pub const BODY_MARKER: &str = "Body";
/// Lower-cased, trimmed text of the block that closes an article.
pub const END_OF_DOCUMENT: &str = "end of document";
pub const CORRECTION_DATE_MARKER: &str = "Correction-Date: ";
pub const LOAD_DATE_MARKER: &str = "Load-Date: ";

/// Outcome of one pass of the segmenter.
#[derive(Debug, Clone, PartialEq)]
pub enum Scan {
    /// An article was extracted; resume scanning at `next`.
    Article { record: ArticleRecord, next: usize },
    /// The document ended inside the article titled `title`. The partial
    /// article is discarded and nothing after it can be scanned.
    Truncated { title: String },
    /// No heading remains.
    Exhausted,
}

/// Where the publication date ends up coming from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateSource {
    Header(NaiveDate),
    CorrectionDate,
    LoadDate,
}

#[derive(Debug, Default)]
struct HeaderMetadata {
    section: Option<String>,
    length: Option<String>,
    body_start: usize,
}

#[derive(Debug)]
struct CapturedBody {
    text: String,
    terminator: usize,
}

/// Extract the first article that starts at or after `position`.
///
/// # Errors
///
/// - [`ExtractionError::MissingBodyMarker`] when no `Body` block appears in
///   the metadata window.
/// - [`ExtractionError::MissingCorrectionDate`] when a corrected article has
///   no parseable `Correction-Date:` in its body.
///
/// Both abort the rest of the document: once the header layout is not
/// understood there is no reliable way to find where the body ends.
pub fn next_article(
    blocks: &[ParagraphBlock],
    position: usize,
    config: &SegmenterConfig,
    source_file: &str,
) -> Result<Scan, ExtractionError> {
    let Some(heading) = (position..blocks.len()).find(|&i| blocks[i].is_heading(&config.heading_style))
    else {
        return Ok(Scan::Exhausted);
    };

    let title = blocks[heading].text.trim().to_string();
    // publisher, date line, and the block that may carry the correction notice
    let header = LookaheadWindow::new(blocks, heading + 1, 3);
    let (Some(publisher), Some(raw_date)) = (header.text(0), header.text(1)) else {
        warn!(%source_file, %title, "Document ends inside an article header; dropping it");
        return Ok(Scan::Truncated { title });
    };
    let date_line = heading + 2;

    let date_source = resolve_header_date(raw_date, header.text(2));
    debug!(%title, ?date_source, "Resolved header date");

    let window = LookaheadWindow::new(blocks, date_line + 1, config.metadata_lookahead);
    let metadata = scan_metadata(window).ok_or_else(|| ExtractionError::MissingBodyMarker {
        source_file: source_file.to_string(),
        title: title.clone(),
        lookahead: config.metadata_lookahead,
        document_ended: window.is_cut_short(),
    })?;

    let Some(body) = capture_body(blocks, metadata.body_start, config.body_trim) else {
        warn!(%source_file, %title, "Document ends before \"End of Document\"; dropping article");
        return Ok(Scan::Truncated { title });
    };

    let (date, correction_appended, load_date_at_end) = match date_source {
        DateSource::Header(date) => (Some(date), false, false),
        DateSource::CorrectionDate => {
            let date = date_after_marker(&body.text, CORRECTION_DATE_MARKER).map_err(|source| {
                ExtractionError::MissingCorrectionDate {
                    source_file: source_file.to_string(),
                    title: title.clone(),
                    source,
                }
            })?;
            (Some(date), true, false)
        }
        DateSource::LoadDate => match date_after_marker(&body.text, LOAD_DATE_MARKER) {
            Ok(date) => (Some(date), false, true),
            Err(e) => {
                warn!(%source_file, %title, error = %e, "Date not found in document");
                (None, false, true)
            }
        },
    };

    let record = ArticleRecord {
        title,
        publisher: publisher.to_string(),
        date,
        section: metadata.section,
        length: metadata.length,
        body: body.text,
        correction_appended,
        load_date_at_end,
        source_file: source_file.to_string(),
    };

    Ok(Scan::Article {
        record,
        next: body.terminator + 1,
    })
}

/// Extract every article of one document, in source order.
///
/// Logs the document path, the number of articles found, and the elapsed
/// time. A truncated final article is dropped (see [`Scan::Truncated`]);
/// everything extracted before it is returned.
///
/// # Arguments
///
/// * `blocks` - The document's paragraphs, in order
/// * `source_file` - `<parent dir>/<file name>` stamped on every record
/// * `config` - Heading style, metadata window, and body trim policy
#[instrument(level = "info", skip(blocks, config), fields(block_count = blocks.len()))]
pub fn segment_document(
    blocks: &[ParagraphBlock],
    source_file: &str,
    config: &SegmenterConfig,
) -> Result<Vec<ArticleRecord>, ExtractionError> {
    let t0 = Instant::now();
    info!("Processing document");

    let mut articles = Vec::new();
    let mut position = 0;
    loop {
        match next_article(blocks, position, config, source_file)? {
            Scan::Article { record, next } => {
                articles.push(record);
                position = next;
            }
            Scan::Truncated { .. } | Scan::Exhausted => break,
        }
    }

    let elapsed = t0.elapsed();
    info!(
        count = articles.len(),
        ?elapsed,
        minutes = %format!("{:.2}", elapsed.as_secs_f64() / 60.0),
        "Number of articles"
    );
    Ok(articles)
}

/// Parse the date line, choosing a fallback source when it is unusable.
fn resolve_header_date(raw_date: &str, notice: Option<&str>) -> DateSource {
    let candidate = date_candidate(raw_date);
    if let Ok(date) = normalize(&candidate) {
        return DateSource::Header(date);
    }

    let is_correction = notice
        .map(|text| text.trim_matches(|c| c == '\n' || c == ' ') == CORRECTION_NOTICE)
        .unwrap_or(false);
    if is_correction {
        return DateSource::CorrectionDate;
    }

    // Second attempt on the very same candidate. It cannot succeed where the
    // first one failed; it stays so the flag semantics match earlier exports.
    match normalize(&candidate) {
        Ok(date) => DateSource::Header(date),
        Err(_) => DateSource::LoadDate,
    }
}

/// Look for `Section:`, `Length:`, and the `Body` marker inside `window`.
///
/// Returns `None` when the window holds no `Body` block.
fn scan_metadata(window: LookaheadWindow<'_>) -> Option<HeaderMetadata> {
    let mut metadata = HeaderMetadata::default();
    for (index, block) in window.iter() {
        let text = block.text.as_str();
        if let Some(rest) = text.strip_prefix(SECTION_PREFIX) {
            metadata.section = Some(skip_separator(rest));
        }
        if let Some(rest) = text.strip_prefix(LENGTH_PREFIX) {
            metadata.length = Some(skip_separator(rest));
        }
        if text == BODY_MARKER {
            metadata.body_start = index + 1;
            return Some(metadata);
        }
    }
    None
}

/// Drop the single separator character that follows a `Label:` prefix.
fn skip_separator(rest: &str) -> String {
    let mut chars = rest.chars();
    chars.next();
    chars.as_str().to_string()
}

fn is_terminator(text: &str) -> bool {
    text.trim().to_lowercase() == END_OF_DOCUMENT
}

/// Collect body paragraphs from `start` up to the terminator block.
///
/// Returns `None` if the document ends first.
fn capture_body(blocks: &[ParagraphBlock], start: usize, trim: BodyTrim) -> Option<CapturedBody> {
    let mut lines: Vec<&str> = Vec::new();
    for (index, block) in blocks.iter().enumerate().skip(start) {
        if is_terminator(&block.text) {
            if trim == BodyTrim::DropLastBlock {
                lines.pop();
            }
            return Some(CapturedBody {
                text: lines.join("\n"),
                terminator: index,
            });
        }
        lines.push(&block.text);
    }
    None
}

/// Parse the date that follows the last occurrence of `marker` in `body`.
///
/// When the marker is absent the whole body is treated as the candidate,
/// which then fails to parse.
fn date_after_marker(body: &str, marker: &str) -> Result<NaiveDate, DateParseError> {
    let tail = body.rsplit(marker).next().unwrap_or(body);
    normalize(&date_candidate(tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    const SOURCE: &str = "2024/ledger.docx";

    fn heading(text: &str) -> ParagraphBlock {
        ParagraphBlock::new("Heading 1", text)
    }

    fn plain(texts: &[&str]) -> Vec<ParagraphBlock> {
        texts.iter().map(|t| ParagraphBlock::plain(*t)).collect()
    }

    /// A complete article whose body is `body` followed by a blank trailer.
    fn article(title: &str, date_line: &str, extra_header: &[&str], body: &[&str]) -> Vec<ParagraphBlock> {
        let mut blocks = vec![heading(title)];
        blocks.extend(plain(&["The Daily Ledger", date_line]));
        blocks.extend(plain(extra_header));
        blocks.extend(plain(&["Section: LOCAL; Pg. A1", "Length: 512 words", "Body"]));
        blocks.extend(plain(body));
        blocks.extend(plain(&["", "End of Document"]));
        blocks
    }

    fn config() -> SegmenterConfig {
        SegmenterConfig::default()
    }

    #[test]
    fn test_two_articles_back_to_back() {
        let mut doc = plain(&["Cover page", "Table of contents"]);
        doc.extend(article(
            "Council approves budget",
            "November 19, 2024 Tuesday",
            &["Copyright 2024 The Daily Ledger"],
            &["The council voted 5-2.", "The mayor will sign it."],
        ));
        doc.extend(article(
            "Library extends hours",
            "November 20, 2024",
            &[],
            &["Branches stay open until nine."],
        ));

        let records = segment_document(&doc, SOURCE, &config()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title, "Council approves budget");
        assert_eq!(first.publisher, "The Daily Ledger");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 11, 19));
        assert_eq!(first.section.as_deref(), Some("LOCAL; Pg. A1"));
        assert_eq!(first.length.as_deref(), Some("512 words"));
        assert_eq!(first.body, "The council voted 5-2.\nThe mayor will sign it.");
        assert!(!first.correction_appended);
        assert!(!first.load_date_at_end);
        assert_eq!(first.source_file, SOURCE);

        let second = &records[1];
        assert_eq!(second.title, "Library extends hours");
        assert_eq!(second.date, NaiveDate::from_ymd_opt(2024, 11, 20));
        assert_eq!(second.body, "Branches stay open until nine.");
        assert!(!second.correction_appended);
        assert!(!second.load_date_at_end);
    }

    #[test]
    fn test_title_is_trimmed_publisher_is_not() {
        let mut doc = vec![heading("  Padded title \n")];
        doc.extend(plain(&[" Ledger ", "May 1, 2020", "Body", "text", "", "End of Document"]));
        let records = segment_document(&doc, SOURCE, &config()).unwrap();
        assert_eq!(records[0].title, "Padded title");
        assert_eq!(records[0].publisher, " Ledger ");
    }

    #[test]
    fn test_next_article_reports_resume_position() {
        let doc = article("One", "May 1, 2020", &[], &["a"]);
        let len = doc.len();
        match next_article(&doc, 0, &config(), SOURCE).unwrap() {
            Scan::Article { next, record } => {
                assert_eq!(next, len);
                assert_eq!(record.title, "One");
            }
            other => panic!("expected article, got {other:?}"),
        }
        assert_eq!(next_article(&doc, len, &config(), SOURCE).unwrap(), Scan::Exhausted);
    }

    #[test]
    fn test_correction_appended_takes_correction_date() {
        let doc = article(
            "Clarified report",
            "Updated edition",
            &["Correction Appended"],
            &[
                "Original text.",
                "Correction: An earlier version misstated the vote.",
                "Correction-Date: January 5, 2023",
            ],
        );

        let records = segment_document(&doc, SOURCE, &config()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].correction_appended);
        assert!(!records[0].load_date_at_end);
        assert_eq!(records[0].date.unwrap().to_string(), "2023-01-05");
    }

    #[test]
    fn test_correction_notice_tolerates_surrounding_newlines() {
        let doc = article(
            "Clarified report",
            "Updated edition",
            &["\n Correction Appended \n"],
            &["Correction-Date: February 2, 2021 Tuesday"],
        );
        let records = segment_document(&doc, SOURCE, &config()).unwrap();
        assert!(records[0].correction_appended);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2021, 2, 2));
    }

    #[test]
    fn test_correction_date_uses_last_marker() {
        let doc = article(
            "Twice corrected",
            "not a date",
            &["Correction Appended"],
            &[
                "Correction-Date: January 1, 2020",
                "Correction-Date: March 9, 2020",
            ],
        );
        let records = segment_document(&doc, SOURCE, &config()).unwrap();
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2020, 3, 9));
    }

    #[test]
    fn test_missing_correction_date_aborts_document() {
        let doc = article(
            "Broken correction",
            "not a date",
            &["Correction Appended"],
            &["No date marker here."],
        );
        let err = segment_document(&doc, SOURCE, &config()).unwrap_err();
        match err {
            ExtractionError::MissingCorrectionDate { source_file, title, .. } => {
                assert_eq!(source_file, SOURCE);
                assert_eq!(title, "Broken correction");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_load_date_fallback() {
        let doc = article(
            "Undated wire story",
            "Associated Press",
            &[],
            &["Story text.", "Load-Date: March 3, 2022"],
        );
        let records = segment_document(&doc, SOURCE, &config()).unwrap();
        assert!(records[0].load_date_at_end);
        assert!(!records[0].correction_appended);
        assert_eq!(records[0].date.unwrap().to_string(), "2022-03-03");
    }

    #[test]
    fn test_load_date_failure_leaves_date_absent() {
        let malformed = article(
            "Undated wire story",
            "Associated Press",
            &[],
            &["Story text.", "Load-Date: sometime soon"],
        );
        let records = segment_document(&malformed, SOURCE, &config()).unwrap();
        assert!(records[0].load_date_at_end);
        assert_eq!(records[0].date, None);

        let missing = article("No trailer", "Associated Press", &[], &["Story text."]);
        let records = segment_document(&missing, SOURCE, &config()).unwrap();
        assert!(records[0].load_date_at_end);
        assert_eq!(records[0].date, None);
    }

    /// Shared buffer the fmt subscriber writes formatted events into.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_load_date_failure_is_logged() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let doc = article(
            "Undated wire story",
            "Associated Press",
            &[],
            &["Story text.", "Load-Date: sometime soon"],
        );
        let records = tracing::subscriber::with_default(subscriber, || {
            segment_document(&doc, SOURCE, &config()).unwrap()
        });
        assert_eq!(records[0].date, None);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|l| l.contains("Date not found in document"))
            .expect("missing load-date warning");
        assert!(line.contains("WARN"));
        assert!(line.contains(SOURCE));
        assert!(line.contains("Undated wire story"));
    }

    #[test]
    fn test_body_drops_last_block_before_terminator() {
        let mut doc = vec![heading("Trimmed")];
        doc.extend(plain(&[
            "Ledger",
            "May 1, 2020",
            "Body",
            "line1",
            "line2",
            "boilerplate",
            "End of Document",
        ]));
        let records = segment_document(&doc, SOURCE, &config()).unwrap();
        assert_eq!(records[0].body, "line1\nline2");
    }

    #[test]
    fn test_body_trim_can_be_disabled() {
        let mut doc = vec![heading("Untrimmed")];
        doc.extend(plain(&[
            "Ledger",
            "May 1, 2020",
            "Body",
            "line1",
            "line2",
            "boilerplate",
            "  END OF DOCUMENT\n",
        ]));
        let config = SegmenterConfig {
            body_trim: BodyTrim::Keep,
            ..SegmenterConfig::default()
        };
        let records = segment_document(&doc, SOURCE, &config).unwrap();
        assert_eq!(records[0].body, "line1\nline2\nboilerplate");
    }

    #[test]
    fn test_missing_body_marker_is_fatal() {
        let mut doc = vec![heading("Headless")];
        doc.extend(plain(&["Ledger", "May 1, 2020"]));
        doc.extend((0..25).map(|i| ParagraphBlock::plain(format!("filler {i}"))));
        doc.extend(plain(&["Body", "text", "", "End of Document"]));

        let err = segment_document(&doc, SOURCE, &config()).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::MissingBodyMarker { lookahead: 20, document_ended: false, ref title, .. }
                if title == "Headless"
        ));

        let wide = SegmenterConfig {
            metadata_lookahead: 40,
            ..SegmenterConfig::default()
        };
        let records = segment_document(&doc, SOURCE, &wide).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].body, "text");
    }

    #[test]
    fn test_body_marker_must_match_exactly() {
        let mut doc = vec![heading("Spaced marker")];
        doc.extend(plain(&["Ledger", "May 1, 2020", "Body ", "body"]));
        assert!(matches!(
            segment_document(&doc, SOURCE, &config()),
            Err(ExtractionError::MissingBodyMarker { document_ended: true, .. })
        ));
    }

    #[test]
    fn test_later_metadata_lines_overwrite_earlier() {
        let mut doc = vec![heading("Two sections")];
        doc.extend(plain(&[
            "Ledger",
            "May 1, 2020",
            "Section: A",
            "Section: B; Pg. 2",
            "Length:900 words",
            "Body",
            "text",
            "",
            "End of Document",
        ]));
        let records = segment_document(&doc, SOURCE, &config()).unwrap();
        assert_eq!(records[0].section.as_deref(), Some("B; Pg. 2"));
        assert_eq!(records[0].length.as_deref(), Some("00 words"));
    }

    #[test]
    fn test_truncated_tail_keeps_earlier_articles() {
        let mut doc = article("Complete", "May 1, 2020", &[], &["text"]);
        doc.push(heading("Cut off"));
        doc.extend(plain(&["Ledger", "May 2, 2020", "Body", "partial text"]));

        let records = segment_document(&doc, SOURCE, &config()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Complete");

        let start = doc.len() - 5;
        assert_eq!(
            next_article(&doc, start, &config(), SOURCE).unwrap(),
            Scan::Truncated {
                title: "Cut off".to_string()
            }
        );
    }

    #[test]
    fn test_heading_without_header_blocks_is_truncated() {
        let doc = vec![heading("Lonely"), ParagraphBlock::plain("Ledger")];
        assert_eq!(
            next_article(&doc, 0, &config(), SOURCE).unwrap(),
            Scan::Truncated {
                title: "Lonely".to_string()
            }
        );
    }

    #[test]
    fn test_headings_inside_body_are_not_article_starts() {
        let mut doc = vec![heading("Outer")];
        doc.extend(plain(&["Ledger", "May 1, 2020", "Body", "intro"]));
        doc.push(heading("Subheading inside body"));
        doc.extend(plain(&["more", "", "End of Document"]));

        let records = segment_document(&doc, SOURCE, &config()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].body, "intro\nSubheading inside body\nmore");
    }

    #[test]
    fn test_empty_document() {
        assert!(segment_document(&[], SOURCE, &config()).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_header_date_paths() {
        assert_eq!(
            resolve_header_date("June 7, 2019 Friday", None),
            DateSource::Header(NaiveDate::from_ymd_opt(2019, 6, 7).unwrap())
        );
        assert_eq!(
            resolve_header_date("bad", Some("Correction Appended")),
            DateSource::CorrectionDate
        );
        assert_eq!(resolve_header_date("bad", Some("Section: A")), DateSource::LoadDate);
        assert_eq!(resolve_header_date("bad", None), DateSource::LoadDate);
    }
}
