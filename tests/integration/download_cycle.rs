//! End-to-end download cycle tests against a mock catalog service
//!
//! These drive the real HTTP client (retry policy included) against wiremock,
//! so the getdb/confirm protocol is exercised over the wire, not through a
//! scripted fake. Mocks are mounted in serving order: wiremock hands each
//! request to the first mock that still matches, and `up_to_n_times` retires
//! a mock once it has served its quota.

use std::time::Duration;

use catalog_downloader::downloader::{CycleOutcome, DownloadCycle, RetryPolicy};
use catalog_downloader::fetcher::CatalogHttpClient;
use catalog_downloader::ledger::BatchLedger;
use tempfile::TempDir;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BATCH_A1: &str =
    r#"<catalog transactionId="TX-1"><book indeks="A1"/><book indeks="A1b"/></catalog>"#;
const BATCH_A2: &str = r#"<catalog transactionId="TX-2"><book indeks="A2"/></catalog>"#;
const EMPTY_BATCH: &str = r#"<catalog transactionId="TX-END"></catalog>"#;

fn xml_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/xml")
}

async fn mount_getdb(server: &MockServer, body: &str, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(query_param("mode", "getdb"))
        .and(query_param("id", "CLIENT"))
        .and(query_param("p", "SECRET"))
        .respond_with(xml_response(body));
    match times {
        Some(n) => mock.up_to_n_times(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

fn client_for(server: &MockServer, attempts: u32) -> CatalogHttpClient {
    CatalogHttpClient::new(server.uri(), "CLIENT", "SECRET")
        .unwrap()
        .with_retry(RetryPolicy::new(attempts, Duration::ZERO))
}

fn cycle_for(server: &MockServer, dir: &TempDir, attempts: u32) -> DownloadCycle {
    let ledger = BatchLedger::new(dir.path()).unwrap();
    DownloadCycle::new(Box::new(client_for(server, attempts)), ledger)
        .with_pacing(Duration::ZERO)
}

fn ledger_names(dir: &TempDir) -> Vec<String> {
    BatchLedger::new(dir.path())
        .unwrap()
        .batch_files()
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_full_download_flow() {
    let server = MockServer::start().await;
    mount_getdb(&server, BATCH_A1, Some(1)).await;
    mount_getdb(&server, EMPTY_BATCH, None).await;
    Mock::given(method("GET"))
        .and(query_param("mode", "confirm"))
        .and(query_param("transactionId", "TX-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let summary = cycle_for(&server, &dir, 1).run().await.unwrap();

    assert_eq!(summary.outcome, CycleOutcome::Complete);
    assert_eq!(summary.batches_persisted, 1);
    assert_eq!(summary.records_confirmed, 2);
    assert_eq!(ledger_names(&dir), vec!["batch_0001_A1_confirmed.xml"]);
}

#[tokio::test]
async fn test_confirm_failure_recovers_via_duplicate() {
    let server = MockServer::start().await;
    // The server serves the same page twice because the first confirmation
    // never registers, then reports completion.
    mount_getdb(&server, BATCH_A2, Some(2)).await;
    mount_getdb(&server, EMPTY_BATCH, None).await;
    Mock::given(method("GET"))
        .and(query_param("mode", "confirm"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("mode", "confirm"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let summary = cycle_for(&server, &dir, 1).run().await.unwrap();

    assert_eq!(summary.outcome, CycleOutcome::Complete);
    // One artifact only: the resend confirmed the existing one.
    assert_eq!(summary.batches_persisted, 1);
    assert_eq!(ledger_names(&dir), vec!["batch_0001_A2_confirmed.xml"]);
}

#[tokio::test]
async fn test_transient_fetch_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("mode", "getdb"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_getdb(&server, BATCH_A1, Some(1)).await;
    mount_getdb(&server, EMPTY_BATCH, None).await;
    Mock::given(method("GET"))
        .and(query_param("mode", "confirm"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    // Three attempts: two 503s burn, the third lands the batch.
    let summary = cycle_for(&server, &dir, 3).run().await.unwrap();

    assert_eq!(summary.outcome, CycleOutcome::Complete);
    assert_eq!(summary.batches_persisted, 1);
}

#[tokio::test]
async fn test_exhausted_fetch_retries_stop_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("mode", "getdb"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let summary = cycle_for(&server, &dir, 2).run().await.unwrap();

    assert_eq!(summary.outcome, CycleOutcome::FetchFailed);
    assert!(ledger_names(&dir).is_empty());
    // Two attempts, no more.
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_resume_from_prior_run_on_disk() {
    let server = MockServer::start().await;
    // Ledger left by a run whose confirm never registered: the server
    // re-sends the same page to this run.
    let dir = TempDir::new().unwrap();
    {
        let ledger = BatchLedger::new(dir.path()).unwrap();
        ledger.persist(BATCH_A2.as_bytes(), 1, "A2").unwrap();
    }
    mount_getdb(&server, BATCH_A2, Some(1)).await;
    mount_getdb(&server, EMPTY_BATCH, None).await;
    Mock::given(method("GET"))
        .and(query_param("mode", "confirm"))
        .and(query_param("transactionId", "TX-2"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let summary = cycle_for(&server, &dir, 1).run().await.unwrap();

    assert_eq!(summary.outcome, CycleOutcome::Complete);
    assert_eq!(summary.batches_persisted, 0);
    assert_eq!(ledger_names(&dir), vec!["batch_0001_A2_confirmed.xml"]);
}

#[tokio::test]
async fn test_malformed_body_stops_without_persisting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("mode", "getdb"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<oops", "text/xml"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let summary = cycle_for(&server, &dir, 3).run().await.unwrap();

    assert_eq!(summary.outcome, CycleOutcome::FetchFailed);
    assert!(ledger_names(&dir).is_empty());
    // A parse failure is not a transport failure: no retries.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
