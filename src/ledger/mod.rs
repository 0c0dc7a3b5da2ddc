//! Durable batch ledger
//!
//! The ledger is a directory of batch artifacts and nothing else: every fact
//! the downloader needs to resume (the next sequence number, the last first
//! record index, whether the last batch was confirmed) is recoverable from
//! the artifact file names plus one content read of the most recent artifact.
//! There is no companion database or session file to drift out of sync.

pub mod name;
pub mod store;

pub use name::BatchName;
pub use store::{BatchLedger, LastBatch};

/// Ledger errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
