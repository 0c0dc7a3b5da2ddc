//! Batch artifact naming
//!
//! A batch artifact's file name carries the full resume state for that batch:
//! `batch_{sequence:04}_{first_index}[_confirmed].xml`. Sequence numbers are
//! zero-padded so lexicographic directory order equals sequence order, and the
//! confirmation flag flips by renaming the file, never by rewriting content.

use std::fmt;

/// File name prefix shared by every batch artifact.
pub const BATCH_PREFIX: &str = "batch_";

/// File name extension shared by every batch artifact.
pub const BATCH_EXTENSION: &str = ".xml";

/// Marker appended before the extension once a batch is confirmed.
pub const CONFIRMED_MARKER: &str = "_confirmed";

/// Typed form of a batch artifact file name.
///
/// The parse/format pair is the only place the naming scheme is spelled out;
/// everything else in the crate goes through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchName {
    /// Monotonically assigned batch sequence number, starting at 1.
    pub sequence: u32,
    /// First record's index as embedded in the name (filesystem-sanitized).
    pub first_index: String,
    /// Whether the confirmed marker is present.
    pub confirmed: bool,
}

impl BatchName {
    /// Create a name for a new artifact, sanitizing the embedded index.
    ///
    /// The index is an opaque string taken from the server's response;
    /// classification always compares the value extracted from XML content,
    /// so sanitizing the filename copy loses nothing.
    pub fn new(sequence: u32, first_index: &str, confirmed: bool) -> Self {
        Self {
            sequence,
            first_index: sanitize_index(first_index),
            confirmed,
        }
    }

    /// Parse an artifact file name back into its typed form.
    ///
    /// Returns `None` when the name does not follow the batch pattern.
    /// Callers treat that leniently: an unparseable last artifact defaults the
    /// last sequence number to 0 rather than failing the run.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name
            .strip_prefix(BATCH_PREFIX)?
            .strip_suffix(BATCH_EXTENSION)?;
        let (stem, confirmed) = match stem.strip_suffix(CONFIRMED_MARKER) {
            Some(rest) => (rest, true),
            None => (stem, false),
        };
        let (sequence, first_index) = stem.split_once('_')?;
        let sequence = sequence.parse().ok()?;
        Some(Self {
            sequence,
            first_index: first_index.to_string(),
            confirmed,
        })
    }

    /// Whether a file name matches the batch artifact pattern at all.
    ///
    /// This is the directory-scan filter; it is deliberately looser than
    /// [`BatchName::parse`] so that a malformed-but-prefixed name still
    /// participates in "last artifact" selection.
    pub fn matches(file_name: &str) -> bool {
        file_name.starts_with(BATCH_PREFIX) && file_name.ends_with(BATCH_EXTENSION)
    }

    /// Whether a file name carries the confirmed marker.
    pub fn is_confirmed_name(file_name: &str) -> bool {
        file_name.contains(CONFIRMED_MARKER)
    }

    /// The canonical file name for this record.
    pub fn file_name(&self) -> String {
        format!(
            "{}{:04}_{}{}{}",
            BATCH_PREFIX,
            self.sequence,
            self.first_index,
            if self.confirmed { CONFIRMED_MARKER } else { "" },
            BATCH_EXTENSION
        )
    }
}

impl fmt::Display for BatchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Sanitize an index value for filesystem safety.
///
/// Replaces directory separators and parent references so a hostile index
/// cannot escape the batch directory. The sanitized copy only ever serves as
/// a name component; index equality uses the XML-extracted value.
fn sanitize_index(index: &str) -> String {
    index.replace("..", "__").replace(['/', '\\', ':'], "_")
}
