//! JSON projection
//!
//! Aggregates every book from every batch file into one
//! `{"books": [...]}` document. Files are visited in batch-number order so
//! the aggregate preserves delivery order, and a file that fails to parse is
//! logged and skipped rather than losing the rest of the catalog. Unlike the
//! CSV projection, nothing is dropped here: the aggregate is the full
//! record.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{error, info};

use super::project::extract_books;
use super::{xml_files_by_batch_number, OutputError, OutputResult};

/// Result of one aggregate JSON export.
#[derive(Debug, Clone)]
pub struct JsonExport {
    /// Path of the JSON document written.
    pub output_path: PathBuf,
    /// Batch files successfully processed.
    pub files: usize,
    /// Total books aggregated.
    pub books: usize,
}

/// Aggregate all batch files under `batches_dir` into one JSON document at
/// `output_file`.
pub fn export_json(batches_dir: &Path, output_file: &Path) -> OutputResult<JsonExport> {
    let files = xml_files_by_batch_number(batches_dir)?;
    info!(
        count = files.len(),
        dir = %batches_dir.display(),
        "aggregating batch files"
    );

    let mut books: Vec<Value> = Vec::new();
    let mut processed = 0usize;
    for file in &files {
        match read_books(file) {
            Ok(mut file_books) => {
                info!(
                    path = %file.display(),
                    books = file_books.len(),
                    "processed batch file"
                );
                books.append(&mut file_books);
                processed += 1;
            }
            Err(e) => {
                error!(path = %file.display(), error = %e, "failed to process batch file");
            }
        }
    }

    let document = serde_json::json!({ "books": books });
    let rendered = serde_json::to_string_pretty(&document)
        .map_err(|e| OutputError::SerializationError(e.to_string()))?;

    if let Some(parent) = output_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::IoError(format!(
                    "failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }
    std::fs::write(output_file, rendered).map_err(|e| {
        OutputError::IoError(format!("failed to write {}: {e}", output_file.display()))
    })?;

    let books_total = match &document["books"] {
        Value::Array(items) => items.len(),
        _ => 0,
    };
    info!(
        path = %output_file.display(),
        books = books_total,
        "aggregate JSON written"
    );

    Ok(JsonExport {
        output_path: output_file.to_path_buf(),
        files: processed,
        books: books_total,
    })
}

fn read_books(path: &Path) -> OutputResult<Vec<Value>> {
    let payload = std::fs::read(path)
        .map_err(|e| OutputError::IoError(format!("failed to read {}: {e}", path.display())))?;
    extract_books(&payload)
}
