// crates/run-player-core/tests/play_list_builder.rs
// ============================================================================
// Module: Play-List Builder Tests
// Description: Run creation from authored test sets.
// Purpose: Validate play-list ordering, initial run state, and rejected inputs.
// Dependencies: run-player-core
// ============================================================================
//! ## Overview
//! Creates runs against the shared catalog and checks that every test in the
//! set yields exactly one entry in link order, that the initial state follows
//! project defaults, and that unusable test sets are rejected without writing.
//!
//! Security posture: runs are owned by their creator from the first write.

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
use run_player_core::OutcomeCode;
use run_player_core::PlayerAction;
use run_player_core::PlayerError;
use run_player_core::ProjectDefaults;
use run_player_core::RunId;
use run_player_core::RunState;
use run_player_core::RunStore;

use crate::common::create;
use crate::common::create_request;
use crate::common::empty_set;
use crate::common::foreign_set;
use crate::common::hollow_set;
use crate::common::owner;
use crate::common::player;
use crate::common::player_with;
use crate::common::test_id;

/// Verifies a three-test set yields three entries in link order.
#[test]
fn create_run_builds_one_entry_per_test_in_order() {
    let player = player();
    let created = create(&player, "run-1");

    let sequences: Vec<u32> = created.entries.iter().map(|entry| entry.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    let tests: Vec<_> = created.entries.iter().map(|entry| entry.test_id).collect();
    assert_eq!(tests, vec![test_id(101), test_id(102), test_id(103)]);
    assert!(created.entries.iter().all(|entry| entry.run_id == RunId::new("run-1")));
    assert_eq!(created.run.state, RunState::NotStarted);
    assert_eq!(created.run.owner, owner());
    assert_eq!(created.run.cursor, None);
    assert_eq!(created.run.version, 1);

    let stored = player.store().load_play_list(&RunId::new("run-1")).unwrap();
    assert_eq!(stored.len(), 3);
}

/// Verifies the created entries start without outcomes.
#[test]
fn create_run_entries_start_unjudged() {
    let player = player();
    let created = create(&player, "run-1");
    for entry in &created.entries {
        assert!(entry.run_code.is_none());
        assert!(entry.status.is_none());
        assert!(entry.step_results.is_empty());
    }
}

/// Verifies projects configured to create open runs get a cursor immediately.
#[test]
fn create_run_open_by_default_sets_cursor() {
    let player = player_with(ProjectDefaults {
        run_create_state: RunState::Open,
        run_create_code: Some(OutcomeCode::new("IN_PROGRESS")),
        ..ProjectDefaults::default()
    });
    let created = create(&player, "run-1");

    assert_eq!(created.run.state, RunState::Open);
    assert_eq!(created.run.run_code, Some(OutcomeCode::new("IN_PROGRESS")));
    let cursor = created.run.cursor.expect("cursor");
    assert_eq!(cursor.entry_id, created.entries[0].entry_id);
    assert_eq!(cursor.step, 1);
}

/// Verifies an empty test set is rejected before anything is written.
#[test]
fn create_run_rejects_empty_test_set() {
    let player = player();
    let err = player.create_run(&create_request("run-1", empty_set())).unwrap_err();

    assert!(matches!(err, PlayerError::TestSetEmpty(id) if id == empty_set()));
    assert!(player.store().load_run(&RunId::new("run-1")).unwrap().is_none());
}

/// Verifies a linked test without steps is rejected.
#[test]
fn create_run_rejects_test_without_steps() {
    let player = player();
    let err = player.create_run(&create_request("run-1", hollow_set())).unwrap_err();

    assert!(matches!(err, PlayerError::EmptyTest(id) if id == test_id(104)));
    assert!(player.store().load_run(&RunId::new("run-1")).unwrap().is_none());
}

/// Verifies a test set from another project is not visible.
#[test]
fn create_run_rejects_foreign_test_set() {
    let player = player();
    let err = player.create_run(&create_request("run-1", foreign_set())).unwrap_err();
    assert_eq!(err.kind(), "test_set_not_found");
}

/// Verifies run identifiers cannot be reused.
#[test]
fn create_run_rejects_duplicate_run_id() {
    let player = player();
    create(&player, "run-1");
    let err = player.create_run(&create_request("run-1", common::regression_set())).unwrap_err();

    assert!(matches!(err, PlayerError::RunAlreadyExists(_)));
    let events = player.audit().events();
    let last = events.last().expect("audit event");
    assert_eq!(last.action, PlayerAction::CreateRun);
    assert_eq!(last.outcome, AuditOutcome::Failed);
    assert_eq!(last.error_kind.as_deref(), Some("run_already_exists"));
}
