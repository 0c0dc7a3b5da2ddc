//! Download command implementation

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use super::CliError;
use crate::downloader::config::{DEFAULT_BASE_URL, DEFAULT_TOTAL_RECORDS, RETRY_DELAY};
use crate::downloader::{CycleOutcome, DownloadCycle, RetryPolicy};
use crate::fetcher::CatalogHttpClient;
use crate::ledger::BatchLedger;

/// Parse and validate the records-per-batch guide.
fn parse_batch_size(s: &str) -> Result<u64, String> {
    let value: u64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == 0 {
        return Err("batch size must be at least 1".to_string());
    }
    Ok(value)
}

/// Catalog Downloader CLI
#[derive(Parser, Debug)]
#[command(name = "catalog-downloader")]
#[command(about = "Download the Azymut book catalog in resumable batches", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Batch artifact directory (the durable resume state)
    #[arg(long, global = true, default_value = "batches")]
    pub batch_dir: PathBuf,

    /// Attempts per API call (default: 3, range: 1-20)
    #[arg(long, global = true, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: u32,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download catalog batches with confirm-based resume
    Download(DownloadArgs),

    /// Reshape persisted batches into CSV or JSON
    Export(super::ExportCommand),

    /// Check the batch ledger's invariants
    Validate(super::ValidateCommand),
}

/// Download command arguments
#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Client id for authentication
    #[arg(long)]
    pub client_id: String,

    /// Password for authentication
    #[arg(long)]
    pub password: String,

    /// Base URL for the catalog servlet
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Total expected records to download (guide only)
    #[arg(long, default_value_t = DEFAULT_TOTAL_RECORDS)]
    pub total_records: u64,

    /// Number of records per batch (guide only)
    #[arg(long, default_value = "500", value_parser = parse_batch_size)]
    pub batch_size: u64,

    /// Seconds to wait between batch requests
    #[arg(long, default_value_t = 60)]
    pub delay_secs: u64,
}

impl DownloadArgs {
    /// Run the fetch/confirm cycle with these arguments.
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let client = CatalogHttpClient::new(&self.base_url, &self.client_id, &self.password)?
            .with_retry(RetryPolicy::new(cli.max_retries, RETRY_DELAY));
        let ledger = BatchLedger::new(&cli.batch_dir)?;
        info!(
            batch_dir = %cli.batch_dir.display(),
            base_url = %self.base_url,
            "starting catalog download"
        );

        let summary = DownloadCycle::new(Box::new(client), ledger)
            .with_batch_size(self.batch_size)
            .with_total_records(self.total_records)
            .with_pacing(Duration::from_secs(self.delay_secs))
            .run()
            .await?;

        match summary.outcome {
            CycleOutcome::Complete => {
                println!("Download complete");
                println!("  New batches persisted : {}", summary.batches_persisted);
                println!("  Records confirmed     : {}", summary.records_confirmed);
                Ok(())
            }
            CycleOutcome::FetchFailed => {
                eprintln!(
                    "Download stopped early after {} new batch(es); resume state is intact; run again to continue",
                    summary.batches_persisted
                );
                Err(CliError::DownloadFailed(
                    "fetch retries exhausted".to_string(),
                ))
            }
        }
    }
}
