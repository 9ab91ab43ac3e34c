//! Integration tests for the credit-file CLI.
//!
//! These tests run the actual binary against CSV fixtures and inspect the
//! files it writes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

/// Binary with a clean credit-file environment writing into `out`
fn command(out: &Path) -> Command {
    let mut cmd = Command::cargo_bin("credit-file").unwrap();
    cmd.env("CREDIT_FILE_PASSWORD", "LBP1234567890")
        .env("CREDIT_FILE_OUTPUT_DIR", out)
        .env("CREDIT_FILE_DATE", "2025-06-18")
        .env_remove("CREDIT_FILE_FINALIZE");
    cmd
}

#[test]
fn test_generates_raw_file_and_archive() {
    let dir = tempfile::tempdir().unwrap();
    let zip_path = dir.path().join("00xx_20250618000002.zip");

    command(dir.path())
        .args([test_data_path("instructions.csv").as_str(), "00xx", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00xx_20250618000002.zip"));

    assert!(zip_path.exists());

    let raw = fs::read_to_string(dir.path().join("00xx_20250618000002.txt")).unwrap();
    let lines: Vec<&str> = raw.split("\r\n").collect();

    assert_eq!(lines.len(), 5, "header, 2 records, footer, trailing empty");
    assert_eq!(lines[0], "00xx_20250618000002");
    assert!(lines[1].starts_with("LBPT001722444438|CTC|20230518|073000|"));
    assert_eq!(lines[3], "2|205.36|81732508");
    assert_eq!(lines[4], "");
}

#[test]
fn test_archive_entry_matches_raw_file() {
    let dir = tempfile::tempdir().unwrap();

    command(dir.path())
        .args([test_data_path("instructions.csv").as_str(), "00xx"])
        .assert()
        .success();

    let raw = fs::read_to_string(dir.path().join("00xx_20250618000001.txt")).unwrap();
    let zip_file = File::open(dir.path().join("00xx_20250618000001.zip")).unwrap();
    let mut archive = ZipArchive::new(zip_file).unwrap();
    assert_eq!(archive.len(), 1);

    let mut entry = archive.by_index_decrypt(0, b"LBP1234567890").unwrap();
    assert_eq!(entry.name(), "00xx_20250618000001.txt");

    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    assert_eq!(content, raw);
}

#[test]
fn test_data_line_fields() {
    let dir = tempfile::tempdir().unwrap();

    command(dir.path())
        .args([test_data_path("instructions.csv").as_str(), "00xx"])
        .assert()
        .success();

    let raw = fs::read_to_string(dir.path().join("00xx_20250618000001.txt")).unwrap();
    let second = raw.split("\r\n").nth(2).unwrap();
    let fields: Vec<&str> = second.split('|').collect();

    assert_eq!(fields.len(), 32);
    assert_eq!(fields[7], "8656003520");
    assert_eq!(fields[8], "8655000861");
    assert_eq!(fields[9], "");
    assert_eq!(fields[10], "");
    assert_eq!(fields[11], "103.18");
    assert_eq!(fields[14], "");
    assert_eq!(fields[18], "LBCS");
    assert_eq!(fields[26], "payroll");
    assert_eq!(&fields[27..], ["null"; 5]);
}

#[test]
fn test_missing_amount_error() {
    let dir = tempfile::tempdir().unwrap();

    command(dir.path())
        .args([test_data_path("missing_amount.csv").as_str(), "00xx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("transaction_amount"));

    assert!(!dir.path().join("00xx_20250618000001.txt").exists());
}

#[test]
fn test_missing_file_error() {
    let dir = tempfile::tempdir().unwrap();

    command(dir.path())
        .args(["nonexistent.csv", "00xx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_missing_argument_error() {
    let dir = tempfile::tempdir().unwrap();

    command(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing arguments"));
}

#[test]
fn test_missing_password_error() {
    let dir = tempfile::tempdir().unwrap();

    command(dir.path())
        .env_remove("CREDIT_FILE_PASSWORD")
        .args([test_data_path("instructions.csv").as_str(), "00xx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CREDIT_FILE_PASSWORD"));
}

#[test]
fn test_invalid_sequence_error() {
    let dir = tempfile::tempdir().unwrap();

    command(dir.path())
        .args([test_data_path("instructions.csv").as_str(), "00xx", "two"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid sequence number"));
}
