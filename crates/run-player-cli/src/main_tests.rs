// crates/run-player-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and bounded reads.
// Purpose: Ensure the command tree is well formed and reads fail closed.
// Dependencies: run-player-cli main helpers
// ============================================================================

//! ## Overview
//! Validates the clap command tree, user parsing, and `read_bytes_with_limit`.
//!
//! Security posture: CLI inputs are untrusted; size limits must fail closed.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use clap::CommandFactory;
use clap::Parser;

use super::Cli;
use super::Commands;
use super::ReadLimitError;
use super::RunCommand;
use super::parse_user;
use super::read_bytes_with_limit;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn command_tree_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn position_accepts_negative_sequences() {
    let cli = Cli::try_parse_from(["run-player", "run", "position", "--run", "r1", "--sequence", "-3"])
        .expect("parse position");
    match cli.command {
        Some(Commands::Run {
            command: RunCommand::Position(command),
        }) => {
            assert_eq!(command.sequence, -3);
            assert_eq!(command.target.run, "r1");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn nav_rejects_unknown_scope() {
    let result = Cli::try_parse_from([
        "run-player",
        "run",
        "nav",
        "--run",
        "r1",
        "--scope",
        "suite",
        "--direction",
        "next",
    ]);
    assert!(result.is_err());
}

#[test]
fn parse_user_rejects_zero_and_garbage() {
    assert!(parse_user("0").is_err());
    assert!(parse_user("alice").is_err());
    assert_eq!(parse_user(" 7 ").expect("user").get(), 7);
}

#[test]
fn read_bytes_with_limit_allows_small_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("small.json");
    fs::write(&path, b"ok").expect("write small file");

    let bytes = read_bytes_with_limit(&path, 16).expect("read small file");
    assert_eq!(bytes, b"ok");
}

#[test]
fn read_bytes_with_limit_rejects_large_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("large.json");
    let limit = 8_usize;
    fs::write(&path, vec![0_u8; limit + 1]).expect("write large file");

    let err = read_bytes_with_limit(&path, limit).expect_err("expected size limit failure");
    match err {
        ReadLimitError::TooLarge {
            size,
            limit: reported,
        } => {
            assert_eq!(size, 9);
            assert_eq!(reported, limit);
        }
        ReadLimitError::Io(err) => panic!("unexpected IO error: {err}"),
    }
}

#[test]
fn read_bytes_with_limit_reports_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = read_bytes_with_limit(&dir.path().join("absent.json"), 16)
        .expect_err("expected io failure");
    assert!(matches!(err, ReadLimitError::Io(_)));
}
