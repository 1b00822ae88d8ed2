//! # Awful News Archive
//!
//! Turns bulk news-archive exports (`.docx` files holding many concatenated
//! articles) into structured article records, then flags near-duplicate
//! stories across the pooled corpus.
//!
//! ## Architecture
//!
//! 1. **Reading**: [`docx`] flattens each document into styled paragraph blocks
//! 2. **Segmenting**: [`segmenter`] walks the blocks and emits one
//!    [`models::ArticleRecord`] per heading, normalizing dates with [`dates`]
//! 3. **Pooling**: [`pipeline`] parses documents concurrently and merges the
//!    results in input order
//! 4. **Deduplicating**: [`dedup`] groups records, scores bodies with a
//!    [`similarity::SimilarityProvider`], and labels each record per threshold
//! 5. **Output**: [`outputs`] writes JSON files
//!
//! [`titles`] offers title normalization and a title similarity index that can
//! be used as a grouping key.

pub mod config;
pub mod dates;
pub mod dedup;
pub mod docx;
pub mod errors;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod segmenter;
pub mod similarity;
pub mod titles;
pub mod utils;
