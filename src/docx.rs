//! Reading `.docx` archive exports into paragraph blocks.
//!
//! A `.docx` file is a zip archive. Paragraph text lives in
//! `word/document.xml`; paragraph styles refer to ids (`Heading1`) whose
//! display names (`heading 1`) are declared in `word/styles.xml`.
//!
//! Only top-level body paragraphs are returned. Paragraphs nested in tables
//! are skipped, matching what word processors list as the document's
//! paragraphs. Tabs become `\t` and line breaks `\n` inside a block.

use crate::errors::DocumentError;
use crate::models::ParagraphBlock;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, instrument, warn};
use zip::ZipArchive;
use zip::result::ZipError;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
/// Style of paragraphs that carry no `w:pStyle`.
const DEFAULT_STYLE: &str = "Normal";

/// Read every top-level paragraph of the `.docx` file at `path`.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn read_docx(path: impl AsRef<Path>) -> Result<Vec<ParagraphBlock>, DocumentError> {
    let file = File::open(path.as_ref())?;
    read_docx_from(file)
}

/// Read paragraphs from any seekable `.docx` byte source.
pub fn read_docx_from<R: Read + Seek>(source: R) -> Result<Vec<ParagraphBlock>, DocumentError> {
    let mut archive = ZipArchive::new(source)?;

    let styles = match read_part(&mut archive, STYLES_PART) {
        Ok(xml) => parse_style_names(&xml)?,
        Err(DocumentError::MissingPart(_)) => {
            warn!("docx archive has no styles part; paragraph styles keep their ids");
            HashMap::new()
        }
        Err(e) => return Err(e),
    };
    let document = read_part(&mut archive, DOCUMENT_PART)?;
    let blocks = parse_paragraphs(&document, &styles)?;
    debug!(paragraphs = blocks.len(), styles = styles.len(), "Read docx");
    Ok(blocks)
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &'static str) -> Result<String, DocumentError> {
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => return Err(DocumentError::MissingPart(name)),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Value of the `w:val` (or any `*:val`) attribute of an element.
fn val_attribute(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"val")
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn attribute(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Map paragraph style ids to their declared names.
fn parse_style_names(xml: &str) -> Result<HashMap<String, String>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut names = HashMap::new();
    let mut current_id: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.local_name().as_ref() == b"style" => {
                current_id = attribute(e, b"styleId");
            }
            Event::Empty(ref e) | Event::Start(ref e) if e.local_name().as_ref() == b"name" => {
                if let (Some(id), Some(name)) = (current_id.as_ref(), val_attribute(e)) {
                    names.insert(id.clone(), name);
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"style" => current_id = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

/// Decode one entity reference (`amp`, `#x2019`, ...) to text.
fn resolve_entity(name: &str) -> String {
    let escaped = format!("&{name};");
    match quick_xml::escape::unescape(&escaped) {
        Ok(text) => text.into_owned(),
        Err(_) => escaped,
    }
}

fn unescape_text(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw);
    match quick_xml::escape::unescape(&raw) {
        Ok(text) => text.into_owned(),
        Err(_) => raw.into_owned(),
    }
}

#[derive(Default)]
struct OpenParagraph {
    style_id: Option<String>,
    text: String,
}

/// Collect top-level paragraphs of `word/document.xml`.
///
/// Only text that belongs directly to a top-level paragraph is kept: nested
/// paragraphs (text boxes, content controls) contribute nothing and do not
/// split the paragraph that contains them.
fn parse_paragraphs(xml: &str, styles: &HashMap<String, String>) -> Result<Vec<ParagraphBlock>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut blocks = Vec::new();

    let mut table_depth = 0usize;
    // open `w:p` elements outside tables; 1 means inside a top-level paragraph
    let mut p_depth = 0usize;
    let mut in_properties = false;
    let mut paragraph: Option<OpenParagraph> = None;
    let mut in_text = false;

    loop {
        let direct = table_depth == 0 && p_depth == 1;
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"tbl" => table_depth += 1,
                b"p" if table_depth == 0 => {
                    if p_depth == 0 {
                        paragraph = Some(OpenParagraph::default());
                    }
                    p_depth += 1;
                }
                b"pPr" if direct => in_properties = true,
                b"t" => in_text = direct,
                b"pStyle" if direct => set_style(&mut paragraph, e),
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"p" if table_depth == 0 && p_depth == 0 => {
                    blocks.push(finish(OpenParagraph::default(), styles))
                }
                b"pStyle" if direct => set_style(&mut paragraph, e),
                b"tab" if direct && !in_properties => push_text(&mut paragraph, "\t"),
                b"br" | b"cr" if direct => push_text(&mut paragraph, "\n"),
                _ => {}
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                b"p" if table_depth == 0 => {
                    p_depth = p_depth.saturating_sub(1);
                    if p_depth == 0 {
                        if let Some(open) = paragraph.take() {
                            blocks.push(finish(open, styles));
                        }
                    }
                }
                b"pPr" => in_properties = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Text(ref e) if in_text => push_text(&mut paragraph, &unescape_text(e)),
            Event::GeneralRef(ref e) if in_text => {
                push_text(&mut paragraph, &resolve_entity(&String::from_utf8_lossy(e)))
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(blocks)
}

fn set_style(paragraph: &mut Option<OpenParagraph>, e: &BytesStart<'_>) {
    if let Some(open) = paragraph.as_mut() {
        open.style_id = val_attribute(e);
    }
}

fn push_text(paragraph: &mut Option<OpenParagraph>, text: &str) {
    if let Some(open) = paragraph.as_mut() {
        open.text.push_str(text);
    }
}

fn finish(open: OpenParagraph, styles: &HashMap<String, String>) -> ParagraphBlock {
    let style = match open.style_id {
        Some(id) => styles.get(&id).cloned().unwrap_or(id),
        None => DEFAULT_STYLE.to_string(),
    };
    ParagraphBlock::new(style, open.text)
}
