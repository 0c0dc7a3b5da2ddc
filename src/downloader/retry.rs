//! Bounded fixed-delay retry
//!
//! Both catalog calls (`getdb` and `confirm`) share one retry shape: a fixed
//! number of attempts with a fixed delay in between, retrying only transport
//! failures. The policy is a small value object so the two call sites cannot
//! drift apart.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::downloader::config::{MAX_ATTEMPTS, RETRY_DELAY};
use crate::fetcher::{FetcherError, FetcherResult};

/// Fixed-count, fixed-delay retry policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with an explicit attempt count and inter-retry delay.
    ///
    /// `max_attempts` is the total number of attempts, so it must be at
    /// least 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Total number of attempts this policy makes.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `operation` until it succeeds, fails non-retryably, or the
    /// attempt budget runs out. Exhaustion returns the last error observed.
    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> FetcherResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FetcherResult<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "{what} attempt failed"
                    );
                    last_error = Some(e);
                    if attempt < self.max_attempts {
                        info!(delay_secs = self.delay.as_secs(), "retrying {what}");
                        sleep(self.delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetcherError::NetworkError("retries exhausted".to_string())))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, RETRY_DELAY)
    }
}
