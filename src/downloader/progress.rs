//! Download progress estimates
//!
//! The totals involved are guides, not promises: the server does not report
//! how many records remain, so the cycle estimates from the configured
//! catalog size, the nominal batch size, and the mandatory per-batch pacing
//! delay. These numbers feed the header logged before each request.

use std::time::Duration;

/// Point-in-time estimate of download progress.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEstimate {
    /// Records already downloaded (sequence-derived estimate).
    pub records_downloaded: u64,
    /// Expected total records in the catalog (guide).
    pub total_records: u64,
    /// Nominal records per batch (guide).
    pub batch_size: u64,
    /// Pacing delay between batch requests.
    pub pacing: Duration,
}

impl ProgressEstimate {
    /// Build an estimate for the upcoming request.
    pub fn new(
        records_downloaded: u64,
        total_records: u64,
        batch_size: u64,
        pacing: Duration,
    ) -> Self {
        Self {
            records_downloaded,
            total_records,
            batch_size,
            pacing,
        }
    }

    /// Records still expected, never negative.
    pub fn remaining(&self) -> u64 {
        self.total_records.saturating_sub(self.records_downloaded)
    }

    /// Batches still expected, rounding the last partial batch up.
    pub fn batches_left(&self) -> u64 {
        if self.batch_size == 0 {
            return 0;
        }
        self.remaining().div_ceil(self.batch_size)
    }

    /// Wall-clock estimate to completion: one pacing delay per remaining
    /// batch.
    pub fn estimated_time(&self) -> Duration {
        Duration::from_secs(self.pacing.as_secs().saturating_mul(self.batches_left()))
    }

    /// Human-readable form of [`Self::estimated_time`].
    pub fn format_eta(&self) -> String {
        format_duration(self.estimated_time())
    }
}

/// Render a duration as a compact human-readable string.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
