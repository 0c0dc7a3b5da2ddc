//! # Catalog Downloader Library
//!
//! A resumable batch downloader for the Azymut book catalog API. The service
//! delivers the catalog one page ("batch") at a time: each `getdb` call
//! returns the next batch together with a transaction identifier, and the
//! server only advances its delivery cursor once the client issues the paired
//! `confirm` call. This crate implements the client side of that protocol so
//! that an interrupted download always resumes exactly where it left off.
//!
//! ## Features
//!
//! - **Durable resume state**: every batch is persisted as an XML artifact
//!   whose filename encodes the sequence number, the first record's index and
//!   a confirmation marker; the directory of artifacts is the only state the
//!   downloader trusts across restarts
//! - **Duplicate detection**: a re-sent batch (the server did not register
//!   the previous confirmation) is recognized by its first record's index and
//!   re-confirmed instead of being stored twice
//! - **Bounded retries**: transport failures are retried a fixed number of
//!   times with a fixed delay before the cycle gives up and leaves the ledger
//!   intact for the next run
//! - **Request pacing**: a mandatory inter-request delay keeps the client
//!   within the service's rate expectations, including on resume
//! - **Export projections**: persisted batches reshape into per-batch CSV
//!   files or one aggregated JSON document
//!
//! ## Quick Start
//!
//! ```no_run
//! use catalog_downloader::downloader::DownloadCycle;
//! use catalog_downloader::fetcher::CatalogHttpClient;
//! use catalog_downloader::ledger::BatchLedger;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CatalogHttpClient::new(
//!     "http://services.azymut.pl/oferta/servlet/",
//!     "CLIENT_ID",
//!     "PASSWORD",
//! )?;
//! let ledger = BatchLedger::new("batches")?;
//!
//! let summary = DownloadCycle::new(Box::new(client), ledger).run().await?;
//! println!("confirmed {} records", summary.records_confirmed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`ledger`] - The batch ledger: filename-encoded durable resume state
//! - [`fetcher`] - Catalog API client and XML response parsing
//! - [`downloader`] - The fetch/confirm cycle and its retry policy
//! - [`output`] - CSV and JSON projections of persisted batches
//! - [`cli`] - Command implementations for the binary

#![warn(missing_docs)]
#![warn(clippy::all)]

/// CLI command implementations
pub mod cli;

/// Fetch/confirm cycle orchestration
pub mod downloader;

/// Catalog API client and response parsing
pub mod fetcher;

/// Durable batch ledger
pub mod ledger;

/// Export projections over persisted batches
pub mod output;

// Re-export commonly used types
pub use downloader::{CycleOutcome, CycleSummary, DownloadCycle};
pub use fetcher::CatalogHttpClient;
pub use ledger::{BatchLedger, BatchName};
