//! The fetch/confirm state machine
//!
//! One iteration of the loop: consult the ledger, wait out the mandatory
//! pacing delay, fetch a batch, classify it as duplicate or new against the
//! last first-record index, persist it if new, confirm it, and loop. The loop
//! ends when the server returns an empty batch (download complete) or a fetch
//! cannot be completed even with retries (the ledger is left intact and a
//! future run resumes cleanly).
//!
//! Classification compares first-record indexes as opaque strings. A missing
//! index is never equal to anything, so a batch without one can never be
//! classified as a duplicate.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::downloader::config::{BATCH_PACING, DEFAULT_BATCH_SIZE, DEFAULT_TOTAL_RECORDS};
use crate::downloader::progress::ProgressEstimate;
use crate::downloader::DownloadError;
use crate::fetcher::{parser, CatalogApi};
use crate::ledger::BatchLedger;

/// How a download run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The server reported no more data.
    Complete,
    /// A fetch failed even with retries, or its body was not a valid batch
    /// document. The ledger is intact; a future run resumes cleanly.
    FetchFailed,
}

/// Counters accumulated over one download run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// How the run ended.
    pub outcome: CycleOutcome,
    /// New batch artifacts persisted by this run.
    pub batches_persisted: u64,
    /// Records in batches whose confirmation succeeded on the new-batch
    /// path. Advances only there, never on duplicate or failed-confirm
    /// paths.
    pub records_confirmed: u64,
}

/// The fetch/confirm download loop.
///
/// Owns its collaborators: a [`CatalogApi`] implementation (the HTTP client
/// in production) and the [`BatchLedger`] it reads and writes. Constructed
/// once at process start and consumed by [`DownloadCycle::run`].
pub struct DownloadCycle {
    api: Box<dyn CatalogApi>,
    ledger: BatchLedger,
    batch_size: u64,
    total_records: u64,
    pacing: Duration,
}

impl DownloadCycle {
    /// Create a cycle with the default pacing and progress guides.
    pub fn new(api: Box<dyn CatalogApi>, ledger: BatchLedger) -> Self {
        Self {
            api,
            ledger,
            batch_size: DEFAULT_BATCH_SIZE,
            total_records: DEFAULT_TOTAL_RECORDS,
            pacing: BATCH_PACING,
        }
    }

    /// Override the nominal records-per-batch guide.
    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Override the expected-total-records guide.
    pub fn with_total_records(mut self, total_records: u64) -> Self {
        self.total_records = total_records;
        self
    }

    /// Override the inter-request pacing delay.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Run the loop to completion.
    ///
    /// Errors are ledger write failures only; every network and parse
    /// failure is handled inside the loop as described on [`CycleOutcome`].
    pub async fn run(&self) -> Result<CycleSummary, DownloadError> {
        // Rebuild the in-memory resume state from the ledger: the first
        // index of the last artifact matters only while that artifact is
        // unconfirmed. A confirmed last batch means the server has already
        // advanced past it.
        let mut last_first_index = match self.ledger.query_last()? {
            Some(last) if !last.confirmed => last.first_index,
            _ => None,
        };

        let mut batches_persisted = 0u64;
        let mut records_confirmed = 0u64;

        let outcome = loop {
            let sequence = self.ledger.allocate_next()?;
            let already_downloaded = u64::from(sequence).saturating_sub(1) * self.batch_size;
            let estimate = ProgressEstimate::new(
                already_downloaded,
                self.total_records,
                self.batch_size,
                self.pacing,
            );
            info!(
                total_records = estimate.total_records,
                records_downloaded = estimate.records_downloaded,
                remaining = estimate.remaining(),
                batches_left = estimate.batches_left(),
                eta = %estimate.format_eta(),
                "starting batch cycle"
            );

            // Mandatory pacing once anything has been downloaded, including
            // on resume and on retry-as-duplicate cycles.
            if already_downloaded > 0 {
                info!(
                    delay_secs = self.pacing.as_secs(),
                    "waiting before next request"
                );
                sleep(self.pacing).await;
            }

            info!("requesting a new batch from getdb");
            let payload = match self.api.fetch_batch().await {
                Ok(payload) => payload,
                Err(e) => {
                    error!(error = %e, "failed to fetch batch after retries; stopping");
                    break CycleOutcome::FetchFailed;
                }
            };

            let batch = match parser::parse_batch(&payload) {
                Ok(batch) => batch,
                Err(e) => {
                    error!(error = %e, "batch response is not a valid document; stopping");
                    break CycleOutcome::FetchFailed;
                }
            };

            if batch.book_count == 0 {
                info!("no records returned by getdb; download complete");
                break CycleOutcome::Complete;
            }

            let duplicate = matches!(
                (&batch.first_index, &last_first_index),
                (Some(current), Some(last)) if current == last
            );

            if duplicate {
                // The server re-sent the batch it was last asked about: the
                // previous confirm call did not register. Confirm the resend
                // and mark the already-persisted artifact instead of storing
                // the payload twice.
                info!(
                    first_index = batch.first_index.as_deref().unwrap_or_default(),
                    "duplicate batch detected; re-confirming previous batch"
                );
                let Some(transaction_id) = batch.transaction_id.as_deref() else {
                    warn!("duplicate batch carries no transaction id; cannot confirm this cycle");
                    continue;
                };
                match self.api.confirm(transaction_id).await {
                    Ok(()) => {
                        if let Some(path) = self.ledger.last_artifact()? {
                            self.ledger.finalize(&path)?;
                        }
                        last_first_index = None;
                        info!("late confirmation succeeded");
                    }
                    Err(e) => {
                        warn!(error = %e, "confirmation failed on duplicate batch; will retry next cycle");
                    }
                }
                continue;
            }

            // New batch: persist first, confirm second. The unconfirmed
            // artifact is the resume anchor if anything past this point
            // fails.
            let index_for_name = batch.first_index.as_deref().unwrap_or("none");
            info!(
                sequence,
                first_index = index_for_name,
                books = batch.book_count,
                "persisting new batch"
            );
            let path = self.ledger.persist(&payload, sequence, index_for_name)?;
            batches_persisted += 1;

            let Some(transaction_id) = batch.transaction_id.as_deref() else {
                warn!("batch response carries no transaction id; leaving batch unconfirmed");
                last_first_index = batch.first_index.clone();
                continue;
            };
            match self.api.confirm(transaction_id).await {
                Ok(()) => {
                    self.ledger.finalize(&path)?;
                    last_first_index = None;
                    records_confirmed += batch.book_count as u64;
                    info!(sequence, "batch confirmed");
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "batch confirmation failed; will retry this batch next cycle"
                    );
                    last_first_index = batch.first_index.clone();
                }
            }
        };

        match outcome {
            CycleOutcome::Complete => info!(
                batches_persisted,
                records_confirmed, "download complete"
            ),
            CycleOutcome::FetchFailed => warn!(
                batches_persisted,
                records_confirmed, "download stopped; resume state preserved"
            ),
        }

        Ok(CycleSummary {
            outcome,
            batches_persisted,
            records_confirmed,
        })
    }
}
