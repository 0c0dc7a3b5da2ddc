//! Retry policy behavior tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use catalog_downloader::downloader::RetryPolicy;
use catalog_downloader::fetcher::{FetcherError, FetcherResult};

#[tokio::test]
async fn test_attempt_budget_is_total_attempts() {
    let calls = AtomicU32::new(0);
    let policy = RetryPolicy::new(5, Duration::ZERO);
    let _: FetcherResult<()> = policy
        .run("op", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FetcherError::NetworkError("down".to_string()))
        })
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_success_stops_consuming_attempts() {
    let calls = AtomicU32::new(0);
    let policy = RetryPolicy::new(5, Duration::ZERO);
    let result = policy
        .run("op", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(FetcherError::HttpError("status 502".to_string()))
            } else {
                Ok(n)
            }
        })
        .await;
    assert_eq!(result.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_parse_errors_never_retry() {
    let calls = AtomicU32::new(0);
    let policy = RetryPolicy::new(5, Duration::ZERO);
    let result: FetcherResult<()> = policy
        .run("op", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FetcherError::ParseError("not a document".to_string()))
        })
        .await;
    assert!(matches!(result, Err(FetcherError::ParseError(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
