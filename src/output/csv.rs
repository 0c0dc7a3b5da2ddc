//! CSV projection
//!
//! One CSV file per batch document, named after the source file's stem. The
//! column set is the sorted union of keys across that file's books, so every
//! batch stands alone; nested values flatten to JSON strings so the rows stay
//! rectangular. The noisy nested `atrybuty` property is dropped before the
//! union is computed.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use super::project::extract_books;
use super::{OutputError, OutputResult};

/// Nested property dropped from every book before writing rows.
pub const DROPPED_PROPERTY: &str = "atrybuty";

/// Result of projecting one batch file to CSV.
#[derive(Debug, Clone)]
pub struct CsvProjection {
    /// Path of the CSV file written.
    pub csv_path: PathBuf,
    /// Number of book rows written.
    pub books: usize,
}

/// Project one XML batch file into a CSV file under `output_dir`.
///
/// Returns `Ok(None)` when the document contains no `book` elements (the
/// file is skipped, matching the reshaping tools this replaces). IO and
/// parse problems are errors; the caller decides whether they abort the
/// whole export or just this file.
pub fn project_to_csv(xml_path: &Path, output_dir: &Path) -> OutputResult<Option<CsvProjection>> {
    let payload = std::fs::read(xml_path).map_err(|e| {
        OutputError::IoError(format!("failed to read {}: {e}", xml_path.display()))
    })?;

    let mut books = extract_books(&payload)?;
    if books.is_empty() {
        info!(path = %xml_path.display(), "no book elements found, skipping");
        return Ok(None);
    }

    for book in &mut books {
        if let Value::Object(map) = book {
            map.remove(DROPPED_PROPERTY);
        }
    }

    // Union of keys across all books determines the columns.
    let mut keys = BTreeSet::new();
    for book in &books {
        if let Value::Object(map) = book {
            keys.extend(map.keys().cloned());
        }
    }
    let keys: Vec<String> = keys.into_iter().collect();

    let stem = xml_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("batch");
    let csv_path = output_dir.join(format!("{stem}.csv"));

    debug!(
        path = %csv_path.display(),
        books = books.len(),
        columns = keys.len(),
        "writing CSV projection"
    );

    let file = File::create(&csv_path).map_err(|e| {
        OutputError::IoError(format!("failed to create {}: {e}", csv_path.display()))
    })?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    writer
        .write_record(&keys)
        .map_err(|e| OutputError::CsvError(format!("failed to write header: {e}")))?;
    for book in &books {
        let row: Vec<String> = keys
            .iter()
            .map(|key| match book {
                Value::Object(map) => map.get(key).map(flatten_value).unwrap_or_default(),
                _ => String::new(),
            })
            .collect();
        writer
            .write_record(&row)
            .map_err(|e| OutputError::CsvError(format!("failed to write row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| OutputError::CsvError(format!("failed to flush CSV: {e}")))?;

    Ok(Some(CsvProjection {
        csv_path,
        books: books.len(),
    }))
}

/// Flatten one projected value into a CSV cell: strings pass through,
/// anything structured becomes a JSON string.
fn flatten_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
