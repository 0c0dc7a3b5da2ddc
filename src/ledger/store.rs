//! Batch ledger storage
//!
//! Filesystem-backed store for batch artifacts. The directory is assumed
//! single-writer: exactly one process drives the download cycle at a time, so
//! no file locking is needed. Writes are atomic (same-directory temp file,
//! then rename) so a crash mid-persist never leaves a partial artifact
//! matching the batch naming pattern.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::name::{BatchName, BATCH_EXTENSION, CONFIRMED_MARKER};
use super::{LedgerError, LedgerResult};
use crate::fetcher::parser;

/// The most recent artifact in the ledger, as seen by [`BatchLedger::query_last`].
#[derive(Debug, Clone)]
pub struct LastBatch {
    /// Path of the artifact.
    pub path: PathBuf,
    /// Whether the file name carries the confirmed marker.
    pub confirmed: bool,
    /// First record's index extracted from the artifact's XML content.
    ///
    /// `None` when the file is unreadable or malformed. That means
    /// "unknown", not "no batches exist": numbering still continues from this
    /// artifact, only duplicate detection is disabled for one cycle.
    pub first_index: Option<String>,
}

/// Handle to the batch storage directory.
#[derive(Debug, Clone)]
pub struct BatchLedger {
    dir: PathBuf,
}

impl BatchLedger {
    /// Open a ledger at `dir`, creating the directory if it does not exist.
    pub fn new<P: Into<PathBuf>>(dir: P) -> LedgerResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            LedgerError::IoError(format!(
                "failed to create batch directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    /// The storage directory this ledger reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All batch artifacts, sorted by file name.
    ///
    /// Names are zero-padded, so lexicographic order equals sequence order.
    pub fn batch_files(&self) -> LedgerResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            LedgerError::IoError(format!(
                "failed to read batch directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| LedgerError::IoError(format!("failed to read directory entry: {e}")))?;
            if let Some(file_name) = entry.file_name().to_str() {
                if BatchName::matches(file_name) {
                    names.push(file_name.to_string());
                }
            }
        }
        names.sort();
        Ok(names.into_iter().map(|name| self.dir.join(name)).collect())
    }

    /// Path of the lexicographically last artifact, if any.
    pub fn last_artifact(&self) -> LedgerResult<Option<PathBuf>> {
        Ok(self.batch_files()?.pop())
    }

    /// Query the most recent artifact and its first record's index.
    ///
    /// Fails soft on content problems: an unreadable or malformed last
    /// artifact logs a warning and yields `first_index = None` instead of an
    /// error, per the resume design: numbering must never restart because
    /// one file went bad.
    pub fn query_last(&self) -> LedgerResult<Option<LastBatch>> {
        let Some(path) = self.last_artifact()? else {
            return Ok(None);
        };
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let confirmed = BatchName::is_confirmed_name(file_name);

        let first_index = match fs::read(&path) {
            Ok(payload) => match parser::parse_batch(&payload) {
                Ok(batch) => batch.first_index,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "last batch artifact is malformed; duplicate detection disabled for this cycle"
                    );
                    None
                }
            },
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "cannot read last batch artifact; duplicate detection disabled for this cycle"
                );
                None
            }
        };

        Ok(Some(LastBatch {
            path,
            confirmed,
            first_index,
        }))
    }

    /// Sequence number for the next batch: last + 1, or 1 for an empty ledger.
    ///
    /// An unparseable last file name defaults the last sequence to 0 rather
    /// than failing.
    pub fn allocate_next(&self) -> LedgerResult<u32> {
        let last_sequence = self
            .last_artifact()?
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .and_then(BatchName::parse)
            .map(|name| name.sequence)
            .unwrap_or(0);
        Ok(last_sequence + 1)
    }

    /// Write a new unconfirmed artifact, payload bytes verbatim.
    ///
    /// The write is atomic: a temp file in the batch directory is synced and
    /// renamed over the final name. If an artifact with the same name already
    /// exists (an exact retry with identical inputs) it is replaced.
    pub fn persist(
        &self,
        payload: &[u8],
        sequence: u32,
        first_index: &str,
    ) -> LedgerResult<PathBuf> {
        let name = BatchName::new(sequence, first_index, false);
        let path = self.dir.join(name.file_name());

        let mut temp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| LedgerError::IoError(format!("failed to create temp file: {e}")))?;
        temp.write_all(payload)
            .map_err(|e| LedgerError::IoError(format!("failed to write batch payload: {e}")))?;
        temp.flush()
            .map_err(|e| LedgerError::IoError(format!("failed to flush batch payload: {e}")))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| LedgerError::IoError(format!("failed to sync batch payload: {e}")))?;
        temp.persist(&path).map_err(|e| {
            LedgerError::IoError(format!("failed to persist {}: {e}", path.display()))
        })?;

        info!(
            path = %path.display(),
            bytes = payload.len(),
            "persisted batch artifact"
        );
        Ok(path)
    }

    /// Mark an artifact confirmed by renaming it.
    ///
    /// Idempotent: an already-confirmed artifact is returned unchanged. The
    /// rename is atomic, so after this returns a subsequent [`Self::query_last`]
    /// observes the confirmed state.
    pub fn finalize(&self, path: &Path) -> LedgerResult<PathBuf> {
        let file_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
            LedgerError::IoError(format!("artifact path has no file name: {}", path.display()))
        })?;

        if BatchName::is_confirmed_name(file_name) {
            debug!(path = %path.display(), "artifact already confirmed");
            return Ok(path.to_path_buf());
        }

        let Some(stem) = file_name.strip_suffix(BATCH_EXTENSION) else {
            debug!(path = %path.display(), "artifact name has no batch extension; leaving as is");
            return Ok(path.to_path_buf());
        };
        let confirmed_path = self
            .dir
            .join(format!("{stem}{CONFIRMED_MARKER}{BATCH_EXTENSION}"));

        fs::rename(path, &confirmed_path).map_err(|e| {
            LedgerError::IoError(format!(
                "failed to rename {} to {}: {e}",
                path.display(),
                confirmed_path.display()
            ))
        })?;

        info!(path = %confirmed_path.display(), "marked batch artifact confirmed");
        Ok(confirmed_path)
    }
}
