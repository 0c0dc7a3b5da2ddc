//! Export command implementation

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use super::CliError;
use crate::output::{self, json};

/// Export command for reshaping persisted batches
#[derive(Parser, Debug)]
pub struct ExportCommand {
    /// Output shape
    #[command(subcommand)]
    pub format: ExportFormat,
}

/// Output shapes available for export
#[derive(Subcommand, Debug)]
pub enum ExportFormat {
    /// One CSV file per batch document
    Csv {
        /// Directory to store CSV files
        #[arg(long, default_value = "csv")]
        output_dir: PathBuf,
    },
    /// One aggregated JSON document with every book
    Json {
        /// Output JSON file
        #[arg(long, default_value = "books.json")]
        output_file: PathBuf,
    },
}

impl ExportCommand {
    /// Execute the export against a batch directory.
    pub async fn execute(&self, batch_dir: &Path) -> Result<(), CliError> {
        if !batch_dir.is_dir() {
            return Err(CliError::InvalidArgument(format!(
                "batch directory {} does not exist",
                batch_dir.display()
            )));
        }
        match &self.format {
            ExportFormat::Csv { output_dir } => export_csv(batch_dir, output_dir),
            ExportFormat::Json { output_file } => {
                let export = json::export_json(batch_dir, output_file)?;
                println!(
                    "Converted {} book(s) from {} file(s) into {}",
                    export.books,
                    export.files,
                    export.output_path.display()
                );
                Ok(())
            }
        }
    }
}

/// Project every XML file in the batch directory into its own CSV file.
///
/// Per-file failures are logged and skipped so one corrupt batch cannot hide
/// the rest of the catalog.
fn export_csv(batch_dir: &Path, output_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(output_dir).map_err(|e| {
        CliError::InvalidArgument(format!(
            "failed to create output directory {}: {e}",
            output_dir.display()
        ))
    })?;

    let files = output::xml_files_by_name(batch_dir)?;
    info!(
        count = files.len(),
        dir = %batch_dir.display(),
        "found XML batch files"
    );

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );

    let mut written = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    for file in &files {
        match output::project_to_csv(file, output_dir) {
            Ok(Some(projection)) => {
                info!(
                    source = %file.display(),
                    target = %projection.csv_path.display(),
                    books = projection.books,
                    "wrote CSV projection"
                );
                written += 1;
            }
            Ok(None) => skipped += 1,
            Err(e) => {
                error!(path = %file.display(), error = %e, "failed to process batch file");
                failed += 1;
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    println!("CSV conversion complete");
    println!("  Files written : {written}");
    println!("  Files skipped : {skipped}");
    if failed > 0 {
        println!("  Files failed  : {failed}");
    }
    Ok(())
}
