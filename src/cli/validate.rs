//! Ledger validation subcommand

use clap::Parser;
use std::path::Path;

use super::CliError;
use crate::ledger::{BatchLedger, BatchName};

/// Validate command for checking batch ledger invariants
#[derive(Parser, Debug)]
pub struct ValidateCommand {}

impl ValidateCommand {
    /// Check the ledger at `batch_dir` against its structural invariants:
    /// parseable names, a gapless sequence starting at 1, and at most one
    /// unconfirmed artifact, which must be the most recent.
    pub async fn execute(&self, batch_dir: &Path) -> Result<(), CliError> {
        if !batch_dir.is_dir() {
            println!("No batch ledger found at {}", batch_dir.display());
            return Ok(());
        }

        let ledger = BatchLedger::new(batch_dir)?;
        let files = ledger.batch_files()?;
        if files.is_empty() {
            println!("Ledger at {} is empty", batch_dir.display());
            return Ok(());
        }

        let mut problems = Vec::new();
        let mut parsed = Vec::new();
        for path in &files {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            match BatchName::parse(file_name) {
                Some(name) => parsed.push(name),
                None => problems.push(format!("{file_name}: name does not parse")),
            }
        }

        let mut expected = 1u32;
        for name in &parsed {
            if name.sequence != expected {
                problems.push(format!(
                    "{}: expected sequence {expected}, found {}",
                    name.file_name(),
                    name.sequence
                ));
            }
            expected = name.sequence + 1;
        }

        let unconfirmed: Vec<&BatchName> = parsed.iter().filter(|n| !n.confirmed).collect();
        if unconfirmed.len() > 1 {
            problems.push(format!(
                "{} unconfirmed artifacts; at most one is allowed",
                unconfirmed.len()
            ));
        }
        if let Some(first_unconfirmed) = unconfirmed.first() {
            if let Some(last) = parsed.last() {
                if first_unconfirmed.sequence != last.sequence {
                    problems.push(format!(
                        "{}: unconfirmed artifact is not the most recent",
                        first_unconfirmed.file_name()
                    ));
                }
            }
        }

        println!("Checked {} artifact(s)", files.len());
        if problems.is_empty() {
            println!("Ledger invariants hold");
            return Ok(());
        }

        for problem in &problems {
            println!("  - {problem}");
        }
        Err(CliError::InvalidArgument(format!(
            "ledger validation failed with {} problem(s)",
            problems.len()
        )))
    }
}
