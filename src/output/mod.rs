//! Export projections over persisted batches
//!
//! Batch artifacts are verbatim API responses; downstream consumers want
//! rows or one aggregated document instead. These projections treat the
//! batch directory as read-only and never participate in the download
//! protocol.

use std::path::{Path, PathBuf};

use crate::ledger::BatchName;

pub mod csv;
pub mod json;
pub mod project;

pub use csv::{project_to_csv, CsvProjection};
pub use json::{export_json, JsonExport};

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// XML read error
    #[error("XML error: {0}")]
    XmlError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// All `.xml` files in a directory.
///
/// Broader than the ledger's batch scan on purpose: the original reshaping
/// tools process every XML document they find, batch-named or not.
fn xml_files(dir: &Path) -> OutputResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        OutputError::IoError(format!("failed to read directory {}: {e}", dir.display()))
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| OutputError::IoError(format!("failed to read directory entry: {e}")))?;
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(".xml") {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names.into_iter().map(|name| dir.join(name)).collect())
}

/// XML files sorted by file name (the CSV projection's input order).
pub fn xml_files_by_name(dir: &Path) -> OutputResult<Vec<PathBuf>> {
    xml_files(dir)
}

/// XML files sorted by batch number (the JSON projection's input order).
///
/// The number is parsed leniently from the batch naming scheme, defaulting
/// to 0, so foreign XML files sort first rather than failing the export.
pub fn xml_files_by_batch_number(dir: &Path) -> OutputResult<Vec<PathBuf>> {
    let mut files = xml_files(dir)?;
    files.sort_by_key(|path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(BatchName::parse)
            .map(|name| name.sequence)
            .unwrap_or(0)
    });
    Ok(files)
}
