//! Protocol constants

use std::time::Duration;

/// Default base URL of the catalog servlet.
pub const DEFAULT_BASE_URL: &str = "http://services.azymut.pl/oferta/servlet/";

/// Number of attempts per API call. The service answers within one or two
/// attempts when healthy; anything still failing after three is down.
pub const MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between retry attempts. The protocol mandates a flat delay,
/// not backoff.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Per-attempt request timeout. Exceeding it counts as a retryable failure,
/// same as a non-200 status.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Mandatory delay between batch requests once at least one batch has been
/// downloaded. The service expects one request per minute.
pub const BATCH_PACING: Duration = Duration::from_secs(60);

/// Records per batch as delivered by the service. A guide for progress
/// estimates only; the server decides the actual page size.
pub const DEFAULT_BATCH_SIZE: u64 = 500;

/// Expected total records in the catalog. A guide for progress estimates
/// only.
pub const DEFAULT_TOTAL_RECORDS: u64 = 164_000;
