//! Catalog API client and response parsing

use async_trait::async_trait;
use bytes::Bytes;

pub mod client;
pub mod parser;

pub use client::CatalogHttpClient;
pub use parser::ParsedBatch;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP response with an unexpected status
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/transport error (connection, timeout)
    #[error("network error: {0}")]
    NetworkError(String),

    /// Response body parse error
    #[error("parse error: {0}")]
    ParseError(String),
}

impl FetcherError {
    /// Whether the bounded-retry policy should try again after this failure.
    ///
    /// Non-200 statuses and transport failures (including per-attempt
    /// timeouts) are transient; a body that fails to parse is not: the
    /// server answered, it just answered garbage.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetcherError::HttpError(_) | FetcherError::NetworkError(_) => true,
            FetcherError::ParseError(_) => false,
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// The two calls of the catalog delivery protocol.
///
/// [`CatalogHttpClient`] is the production implementation; tests drive the
/// download cycle with scripted implementations of this trait.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Request the next batch (`mode=getdb`), returning the raw response
    /// body after bounded transport retries.
    async fn fetch_batch(&self) -> FetcherResult<Bytes>;

    /// Confirm receipt of a batch (`mode=confirm`) using the transaction
    /// identifier from that batch's response.
    async fn confirm(&self, transaction_id: &str) -> FetcherResult<()>;
}
