//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Writes the pooled corpus, the labeled corpus, per-document
//!   intermediate files, and the title similarity index as JSON

pub mod json;
