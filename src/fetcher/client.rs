//! Catalog HTTP client
//!
//! Both protocol calls are GETs against one servlet endpoint, distinguished
//! by the `mode` query parameter. Credentials ride along on every request;
//! the server keeps no session. Each call is wrapped in the bounded-retry
//! policy; a strict 200 check makes any other status a retryable transport
//! failure, exactly like a connection error or timeout.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{CatalogApi, FetcherError, FetcherResult};
use crate::downloader::config::REQUEST_TIMEOUT;
use crate::downloader::retry::RetryPolicy;

/// HTTP implementation of [`CatalogApi`].
pub struct CatalogHttpClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    password: String,
    retry: RetryPolicy,
}

impl CatalogHttpClient {
    /// Create a client for one service endpoint and one set of credentials.
    ///
    /// The per-attempt timeout is fixed at the protocol default.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        password: impl Into<String>,
    ) -> FetcherResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetcherError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            client_id: client_id.into(),
            password: password.into(),
            retry: RetryPolicy::default(),
        })
    }

    /// Override the retry policy used for both calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// One GET attempt. Non-200 statuses are [`FetcherError::HttpError`] so
    /// the retry policy treats them as transient.
    async fn get(&self, params: &[(&str, &str)]) -> FetcherResult<Bytes> {
        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .send()
            .await
            .map_err(|e| FetcherError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(FetcherError::HttpError(format!(
                "unexpected status {status}"
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| FetcherError::NetworkError(format!("failed to read response body: {e}")))
    }
}

#[async_trait]
impl CatalogApi for CatalogHttpClient {
    async fn fetch_batch(&self) -> FetcherResult<Bytes> {
        debug!(base_url = %self.base_url, "requesting batch (mode=getdb)");
        let params = [
            ("mode", "getdb"),
            ("id", self.client_id.as_str()),
            ("p", self.password.as_str()),
        ];
        self.retry.run("getdb", || self.get(&params)).await
    }

    async fn confirm(&self, transaction_id: &str) -> FetcherResult<()> {
        debug!(transaction_id, "confirming batch (mode=confirm)");
        let params = [
            ("mode", "confirm"),
            ("id", self.client_id.as_str()),
            ("p", self.password.as_str()),
            ("transactionId", transaction_id),
        ];
        self.retry
            .run("confirm", || async { self.get(&params).await.map(|_| ()) })
            .await
    }
}
