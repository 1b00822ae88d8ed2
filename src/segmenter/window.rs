//! Bounded views over a document's blocks.

use crate::models::ParagraphBlock;

/// A read-only window of at most `len` blocks starting at `start`.
///
/// Indexing past the window or past the end of the document yields `None`
/// instead of panicking, so header peeks and the metadata scan never read
/// outside the region they were given.
#[derive(Debug, Clone, Copy)]
pub struct LookaheadWindow<'a> {
    blocks: &'a [ParagraphBlock],
    start: usize,
    len: usize,
}

impl<'a> LookaheadWindow<'a> {
    pub fn new(blocks: &'a [ParagraphBlock], start: usize, len: usize) -> Self {
        Self { blocks, start, len }
    }

    /// The block at `offset` from the window start, if inside the window.
    pub fn get(&self, offset: usize) -> Option<&'a ParagraphBlock> {
        if offset >= self.len {
            return None;
        }
        self.blocks.get(self.start.checked_add(offset)?)
    }

    /// Text of the block at `offset`, if inside the window.
    pub fn text(&self, offset: usize) -> Option<&'a str> {
        self.get(offset).map(|b| b.text.as_str())
    }

    /// Absolute document positions and blocks covered by the window.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a ParagraphBlock)> + 'a {
        let end = self.start.saturating_add(self.len).min(self.blocks.len());
        let start = self.start.min(end);
        self.blocks[start..end]
            .iter()
            .enumerate()
            .map(move |(i, b)| (start + i, b))
    }

    /// Whether the document ended before the window was filled.
    pub fn is_cut_short(&self) -> bool {
        self.start.saturating_add(self.len) > self.blocks.len()
    }
}
