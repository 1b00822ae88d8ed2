//! Utility functions for input discovery, path labeling, and output directories.
//!
//! This module provides helper functions used by the pipeline and the binary:
//! - Locating archive exports under an input directory
//! - Deriving the `source_file` label stamped on every article
//! - Picking a worker count
//! - File system validation for output directories

use std::error::Error;
use std::fs as stdfs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Label a document by its parent directory and file name.
///
/// Archive exports are stored one directory per batch, so the parent
/// directory name is enough to tell files with the same name apart.
///
/// # Examples
///
/// ```
/// use awful_news_archive::utils::relative_source_path;
/// use std::path::Path;
///
/// let label = relative_source_path(Path::new("/data/raw/2024-q1/Ledger_1.DOCX"));
/// assert_eq!(label, "2024-q1/Ledger_1.DOCX");
/// ```
pub fn relative_source_path(path: &Path) -> String {
    let parent = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{parent}/{name}")
}

/// Find `<input_dir>/*/*.<extension>` files, sorted by path.
///
/// The extension comparison ignores case, so `docx` also finds `.DOCX`.
/// Sorting fixes the order in which results are merged.
///
/// # Errors
///
/// Returns an error if `input_dir` or one of its subdirectories cannot be read.
#[instrument(level = "info", skip_all, fields(input_dir = %input_dir.display(), extension = %extension))]
pub fn discover_documents(input_dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for batch in stdfs::read_dir(input_dir)? {
        let batch = batch?.path();
        if !batch.is_dir() {
            continue;
        }
        for entry in stdfs::read_dir(&batch)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .map(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
                .unwrap_or(false);
            if matches && path.is_file() {
                found.push(path);
            }
        }
    }
    found.sort();
    info!(count = found.len(), "Files to process");
    debug!(files = ?found, "Discovered documents");
    Ok(found)
}

/// One worker per core, leaving one core free; never fewer than one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
