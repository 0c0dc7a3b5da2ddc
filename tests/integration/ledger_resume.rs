//! Resume-state properties of the batch ledger
//!
//! The ledger is the only state that survives a crash, so these tests
//! exercise the resume decisions across "process restarts": every cycle is a
//! fresh instance that rebuilds its in-memory state from disk.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use catalog_downloader::downloader::{CycleOutcome, DownloadCycle};
use catalog_downloader::fetcher::{CatalogApi, FetcherError, FetcherResult};
use catalog_downloader::ledger::{BatchLedger, BatchName};
use tempfile::TempDir;

/// Serves a fixed fetch script, then empty batches; confirms according to
/// its confirm script, then succeeds.
struct ReplayApi {
    fetches: Mutex<VecDeque<Bytes>>,
    confirms: Mutex<VecDeque<FetcherResult<()>>>,
}

impl ReplayApi {
    fn new(fetches: Vec<Bytes>, confirms: Vec<FetcherResult<()>>) -> Self {
        Self {
            fetches: Mutex::new(fetches.into()),
            confirms: Mutex::new(confirms.into()),
        }
    }
}

#[async_trait]
impl CatalogApi for ReplayApi {
    async fn fetch_batch(&self) -> FetcherResult<Bytes> {
        Ok(self
            .fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| batch(r#"<catalog transactionId="TX-END"></catalog>"#)))
    }

    async fn confirm(&self, _transaction_id: &str) -> FetcherResult<()> {
        self.confirms.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

fn batch(xml: &str) -> Bytes {
    Bytes::from(xml.to_string())
}

fn page(transaction_id: &str, first_index: &str) -> Bytes {
    batch(&format!(
        r#"<catalog transactionId="{transaction_id}"><book indeks="{first_index}"/></catalog>"#
    ))
}

async fn run_cycle(dir: &TempDir, api: ReplayApi) -> CycleOutcome {
    let ledger = BatchLedger::new(dir.path()).unwrap();
    DownloadCycle::new(Box::new(api), ledger)
        .with_pacing(Duration::ZERO)
        .run()
        .await
        .unwrap()
        .outcome
}

fn names(dir: &TempDir) -> Vec<BatchName> {
    BatchLedger::new(dir.path())
        .unwrap()
        .batch_files()
        .unwrap()
        .iter()
        .map(|p| BatchName::parse(p.file_name().unwrap().to_str().unwrap()).unwrap())
        .collect()
}

/// Confirm fails, the process "dies", and a new run sees the same page: it
/// must classify as duplicate and finish the confirmation, never persist a
/// second copy.
#[tokio::test]
async fn test_resume_idempotence_across_runs() {
    let dir = TempDir::new().unwrap();

    let first = ReplayApi::new(
        vec![page("TX-1", "A1")],
        vec![Err(FetcherError::HttpError("status 500".to_string()))],
    );
    run_cycle(&dir, first).await;
    assert_eq!(names(&dir).len(), 1);
    assert!(!names(&dir)[0].confirmed);

    let second = ReplayApi::new(vec![page("TX-2", "A1")], vec![Ok(())]);
    run_cycle(&dir, second).await;

    let after = names(&dir);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].sequence, 1);
    assert!(after[0].confirmed);
}

/// A long multi-run download keeps sequence numbers gapless and leaves at
/// most one unconfirmed artifact, always the most recent, no matter where
/// each run stops.
#[tokio::test]
async fn test_invariants_hold_across_interrupted_runs() {
    let dir = TempDir::new().unwrap();

    // Run 1: two batches, second confirm fails.
    let run1 = ReplayApi::new(
        vec![page("TX-1", "A1"), page("TX-2", "A2")],
        vec![
            Ok(()),
            Err(FetcherError::NetworkError("timed out".to_string())),
        ],
    );
    run_cycle(&dir, run1).await;

    // Run 2: server re-sends A2, then moves on to A3, then completes.
    let run2 = ReplayApi::new(vec![page("TX-3", "A2"), page("TX-4", "A3")], vec![]);
    let outcome = run_cycle(&dir, run2).await;
    assert_eq!(outcome, CycleOutcome::Complete);

    let all = names(&dir);
    let sequences: Vec<u32> = all.iter().map(|n| n.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert!(all.iter().all(|n| n.confirmed));
}

/// queryLast + allocateNext recover the same decision inputs whether or not
/// a confirmation happened in between.
#[tokio::test]
async fn test_query_last_tracks_finalization() {
    let dir = TempDir::new().unwrap();
    let ledger = BatchLedger::new(dir.path()).unwrap();

    let path = ledger
        .persist(&page("TX-1", "A1"), 1, "A1")
        .unwrap();
    let before = ledger.query_last().unwrap().unwrap();
    assert!(!before.confirmed);
    assert_eq!(before.first_index.as_deref(), Some("A1"));
    assert_eq!(ledger.allocate_next().unwrap(), 2);

    ledger.finalize(&path).unwrap();
    let after = ledger.query_last().unwrap().unwrap();
    assert!(after.confirmed);
    assert_eq!(after.first_index.as_deref(), Some("A1"));
    // Finalization never disturbs numbering.
    assert_eq!(ledger.allocate_next().unwrap(), 2);
}
