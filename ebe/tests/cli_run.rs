//! CLI tests for `ebe run` and `ebe init`.
//!
//! Spawns the ebe binary and checks exit codes, collected outputs and that the
//! stage directory is left empty.

#![cfg(unix)]

use std::fs;
use std::process::Command;

use ebe::exit_codes;
use ebe::io::config::{EbeConfig, load_config};

#[test]
fn run_copies_staged_output_to_destination() {
    let temp = tempfile::tempdir().expect("tempdir");
    let stage = temp.path().join("stage");
    fs::create_dir_all(&stage).expect("stage dir");
    let src = temp.path().join("input.dat");
    let dest = temp.path().join("output.dat");
    fs::write(&src, b"\x00\x01binary").expect("seed");

    let status = Command::new(env!("CARGO_BIN_EXE_ebe"))
        .current_dir(temp.path())
        .arg("run")
        .arg("--tmp-dir")
        .arg(&stage)
        .arg("--")
        .arg("cp")
        .arg(format!("in:{}", src.display()))
        .arg(format!("out:{}", dest.display()))
        .status()
        .expect("ebe run");

    assert_eq!(status.code(), Some(exit_codes::OK));
    assert_eq!(fs::read(&dest).expect("dest"), b"\x00\x01binary");
    assert_eq!(fs::read_dir(&stage).expect("read stage").count(), 0);
}

#[test]
fn run_passes_through_command_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = Command::new(env!("CARGO_BIN_EXE_ebe"))
        .current_dir(temp.path())
        .env_remove("RUST_LOG")
        .args(["run", "--", "exit", "7"])
        .output()
        .expect("ebe run");

    assert_eq!(output.status.code(), Some(7));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("exit 7"), "stderr: {stderr}");
}

#[test]
fn run_no_warn_keeps_stderr_quiet() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = Command::new(env!("CARGO_BIN_EXE_ebe"))
        .current_dir(temp.path())
        .env_remove("RUST_LOG")
        .args(["run", "--no-warn", "--", "false"])
        .output()
        .expect("ebe run");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stderr.is_empty());
}

#[test]
fn run_with_missing_input_reports_staging_failure() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = Command::new(env!("CARGO_BIN_EXE_ebe"))
        .current_dir(temp.path())
        .args(["run", "--", "cat", "in:absent.txt"])
        .status()
        .expect("ebe run");

    assert_eq!(status.code(), Some(exit_codes::STAGING_FAILED));
}

#[test]
fn init_writes_default_config() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = Command::new(env!("CARGO_BIN_EXE_ebe"))
        .current_dir(temp.path())
        .arg("init")
        .status()
        .expect("ebe init");

    assert_eq!(status.code(), Some(exit_codes::OK));
    let cfg = load_config(&temp.path().join("ebe.toml")).expect("load");
    assert_eq!(cfg, EbeConfig::default());
}
