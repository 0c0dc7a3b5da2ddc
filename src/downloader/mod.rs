//! Fetch/confirm cycle orchestration
//!
//! The cycle is the control loop that talks to the catalog service: request a
//! batch, classify it against the ledger's last entry, persist or discard it,
//! confirm receipt, and loop until the server reports no more data or retries
//! run out. One request is in flight at a time, because confirming a batch while
//! another fetch is outstanding would desynchronize the server's delivery
//! cursor from the ledger.
//!
//! # Components
//!
//! - [`cycle`] - The state machine itself
//! - [`retry`] - Bounded fixed-delay retry policy shared by both API calls
//! - [`progress`] - Download progress estimates for the per-cycle header
//! - [`config`] - Protocol constants
//!
//! # Error handling
//!
//! Exhausted fetch retries and malformed batch documents end the loop with
//! the ledger exactly as of the last successful finalize, so a future run
//! resumes cleanly. A failed confirm is not fatal: the unconfirmed artifact
//! stays on disk as the resume anchor and the next cycle re-confirms it when
//! the server re-sends the same batch.

pub mod config;
pub mod cycle;
pub mod progress;
pub mod retry;

pub use cycle::{CycleOutcome, CycleSummary, DownloadCycle};
pub use progress::ProgressEstimate;
pub use retry::RetryPolicy;

use crate::ledger::LedgerError;

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Ledger error
    #[error("ledger error: {0}")]
    LedgerError(#[from] LedgerError),
}
