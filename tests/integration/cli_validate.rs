//! Binary-level tests for the validate subcommand

use assert_cmd::Command;
use tempfile::TempDir;

fn validate_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("catalog-downloader").unwrap();
    cmd.arg("validate").arg("--batch-dir").arg(dir.path());
    cmd
}

#[test]
fn test_validate_accepts_well_formed_ledger() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("batch_0001_A1_confirmed.xml"), b"<x/>").unwrap();
    std::fs::write(dir.path().join("batch_0002_A2_confirmed.xml"), b"<x/>").unwrap();
    std::fs::write(dir.path().join("batch_0003_A3.xml"), b"<x/>").unwrap();

    validate_cmd(&dir).assert().success();
}

#[test]
fn test_validate_accepts_empty_ledger() {
    let dir = TempDir::new().unwrap();
    validate_cmd(&dir).assert().success();
}

#[test]
fn test_validate_rejects_sequence_gap() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("batch_0001_A1_confirmed.xml"), b"<x/>").unwrap();
    std::fs::write(dir.path().join("batch_0003_A3.xml"), b"<x/>").unwrap();

    validate_cmd(&dir).assert().failure();
}

#[test]
fn test_validate_rejects_mid_ledger_unconfirmed_artifact() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("batch_0001_A1.xml"), b"<x/>").unwrap();
    std::fs::write(dir.path().join("batch_0002_A2_confirmed.xml"), b"<x/>").unwrap();

    validate_cmd(&dir).assert().failure();
}

#[test]
fn test_validate_rejects_unparseable_names() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("batch_garbage.xml"), b"<x/>").unwrap();

    validate_cmd(&dir).assert().failure();
}
