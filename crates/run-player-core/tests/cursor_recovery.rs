// crates/run-player-core/tests/cursor_recovery.rs
// ============================================================================
// Module: Cursor Recovery Tests
// Description: Behavior when stored play lists no longer match the cursor.
// Purpose: Validate the single `current` fallback and fail-closed elsewhere.
// Dependencies: run-player-core
// ============================================================================
//! ## Overview
//! Removes entries behind the engine's back to simulate corrupted data. Only
//! `current` may fall back to the first entry; every other operation must
//! surface a system-level error.
//!
//! Security posture: corrupted run data fails closed.
//! Threat model: TM-STORE-001 - Store corruption or load confusion.

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

mod common;

use run_player_core::AuditOutcome;
use run_player_core::InMemoryRunStore;
use run_player_core::NextRequest;
use run_player_core::PlayerAction;
use run_player_core::PlayerError;
use run_player_core::ProjectDefaults;
use run_player_core::RunRequest;
use run_player_core::RunStore;

use crate::common::Player;
use crate::common::player_on;
use crate::common::started;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Starts a run with its cursor on the last entry, then deletes that entry.
fn dangling_cursor() -> (Player, RunRequest) {
    let store = InMemoryRunStore::new();
    let player = player_on(store.clone(), ProjectDefaults::default());
    let request = started(&player, "run-1");
    player.test_last(&request).expect("test last");
    assert!(store.remove_entry(&request.run_id, 3).expect("remove entry"));
    (player, request)
}

// ============================================================================
// SECTION: Fallback
// ============================================================================

/// Verifies `current` falls back to the first entry and records the recovery.
#[test]
fn current_falls_back_to_first_entry() {
    let (player, request) = dangling_cursor();
    let before = player.store().load_run(&request.run_id).unwrap();

    let current = player.current(&request).unwrap();

    assert!(current.recovered);
    assert_eq!(current.entry.sequence, 1);
    assert_eq!(player.store().load_run(&request.run_id).unwrap(), before);
    let last = player.audit().events().pop().expect("audit event");
    assert_eq!(last.action, PlayerAction::Current);
    assert_eq!(last.outcome, AuditOutcome::Recovered);
}

/// Verifies the other reads treat a dangling cursor as a system error.
#[test]
fn current_test_and_step_fail_closed() {
    let (player, request) = dangling_cursor();

    let err = player.current_test(&request).unwrap_err();
    assert!(err.is_system_error());
    let err = player.current_step(&request).unwrap_err();
    assert!(err.is_system_error());
}

/// Verifies navigation refuses to move from a dangling cursor.
#[test]
fn navigation_fails_closed() {
    let (player, request) = dangling_cursor();

    let err = player.step_first(&request).unwrap_err();
    assert!(matches!(err, PlayerError::System { .. }));
}

/// Verifies `next` reports the dangling cursor as an invalid sequence.
#[test]
fn next_reports_sequence_invalid() {
    let (player, request) = dangling_cursor();

    let err = player.next(&NextRequest::new(&request)).unwrap_err();

    assert!(matches!(err, PlayerError::SequenceInvalid { .. }));
    let last = player.audit().events().pop().expect("audit event");
    assert_eq!(last.outcome, AuditOutcome::Failed);
    assert_eq!(last.error_kind.as_deref(), Some("sequence_invalid"));
}

/// Verifies a play list with a gap is rejected even by `current`.
#[test]
fn play_list_gap_is_a_system_error() {
    let store = InMemoryRunStore::new();
    let player = player_on(store.clone(), ProjectDefaults::default());
    let request = started(&player, "run-1");
    assert!(store.remove_entry(&request.run_id, 2).unwrap());

    let err = player.current(&request).unwrap_err();

    assert!(matches!(err, PlayerError::System { .. }));
    assert!(err.to_string().contains("invalid play list"));
}
