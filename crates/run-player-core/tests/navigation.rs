// crates/run-player-core/tests/navigation.rs
// ============================================================================
// Module: Cursor Navigation Tests
// Description: Run-wide, test-level, and within-test cursor movement.
// Purpose: Validate landings, boundary no-ops, the forward-move guard, and position.
// Dependencies: run-player-core
// ============================================================================
//! ## Overview
//! Uses the shared three-test run (two, three, and one step) to exercise all
//! twelve named moves plus `position`. Forward moves must be refused until the
//! current step is judged; moves past either end leave the run untouched.

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
use run_player_core::CursorMove;
use run_player_core::MoveDirection;
use run_player_core::MoveResult;
use run_player_core::MoveScope;
use run_player_core::NavigateRequest;
use run_player_core::NextRequest;
use run_player_core::PlayerAction;
use run_player_core::PlayerError;
use run_player_core::PositionRequest;
use run_player_core::RunRequest;
use run_player_core::RunState;
use run_player_core::RunStore;

use crate::common::Player;
use crate::common::player;
use crate::common::started;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Returns `(entry sequence, step sequence)` for a move result.
fn at(result: &MoveResult) -> (u32, u32) {
    (result.entry.sequence, result.step.sequence)
}

/// Returns the cursor position as `(entry sequence, step sequence)`.
fn position_of(player: &Player, request: &RunRequest) -> (u32, u32) {
    let step = player.current_step(request).expect("current step");
    (step.entry.sequence, step.step.sequence)
}

/// Judges the current step and moves run-wide to the next step.
fn pass_and_step(player: &Player, request: &RunRequest) -> MoveResult {
    player.record_pass(request).expect("record pass");
    player.step_next(request).expect("step next")
}

/// Builds a position request for the owner.
fn position_request(request: &RunRequest, sequence: i64) -> PositionRequest {
    PositionRequest {
        run_id: request.run_id.clone(),
        actor: request.actor,
        sequence,
    }
}

// ============================================================================
// SECTION: Forward Guard
// ============================================================================

/// Verifies `next` refuses to advance from an unjudged step.
#[test]
fn next_before_outcome_fails_step_not_terminated() {
    let player = player();
    let request = started(&player, "run-1");
    let before = player.store().load_run(&request.run_id).unwrap();

    let err = player.next(&NextRequest::new(&request)).unwrap_err();

    assert!(matches!(err, PlayerError::StepNotTerminated { sequence: 1, step: 1, .. }));
    assert!(err.is_user_actionable());
    let after = player.store().load_run(&request.run_id).unwrap();
    assert_eq!(before, after);
}

/// Verifies every `Next` move is guarded.
#[test]
fn forward_moves_require_recorded_outcome() {
    let player = player();
    let request = started(&player, "run-1");

    for result in [
        player.step_next(&request),
        player.test_next(&request),
        player.test_step_next(&request),
    ] {
        assert!(matches!(result, Err(PlayerError::StepNotTerminated { .. })));
    }
    assert_eq!(position_of(&player, &request), (1, 1));
}

/// Verifies backward and lateral moves do not require an outcome.
#[test]
fn lateral_moves_do_not_require_outcome() {
    let player = player();
    let request = started(&player, "run-1");

    let last = player.step_last(&request).unwrap();
    assert_eq!(at(&last), (3, 1));
    let previous = player.step_previous(&request).unwrap();
    assert_eq!(at(&previous), (2, 3));
    let first = player.test_first(&request).unwrap();
    assert_eq!(at(&first), (1, 1));
}

// ============================================================================
// SECTION: Run-Wide Moves
// ============================================================================

/// Verifies run-wide moves walk steps across test boundaries.
#[test]
fn step_moves_cross_test_boundaries() {
    let player = player();
    let request = started(&player, "run-1");

    assert_eq!(at(&pass_and_step(&player, &request)), (1, 2));
    assert_eq!(at(&pass_and_step(&player, &request)), (2, 1));
    assert_eq!(at(&player.step_previous(&request).unwrap()), (1, 2));
    assert_eq!(at(&player.step_first(&request).unwrap()), (1, 1));
    assert_eq!(at(&player.step_last(&request).unwrap()), (3, 1));
}

/// Verifies moving past the end of the run is a persisted no-op.
#[test]
fn step_next_at_end_of_run_is_noop() {
    let player = player();
    let request = started(&player, "run-1");
    player.step_last(&request).unwrap();
    player.record_pass(&request).unwrap();
    let version = player.store().load_run(&request.run_id).unwrap().unwrap().version;

    let result = player.step_next(&request).unwrap();

    assert!(!result.moved);
    assert_eq!(at(&result), (3, 1));
    assert_eq!(result.run.state, RunState::Open);
    assert_eq!(player.store().load_run(&request.run_id).unwrap().unwrap().version, version);
    let last = player.audit().events().pop().expect("audit event");
    assert_eq!(last.action, PlayerAction::StepMove);
    assert_eq!(last.outcome, AuditOutcome::Unchanged);
}

/// Verifies moving before the first step is a no-op.
#[test]
fn step_previous_at_start_is_noop() {
    let player = player();
    let request = started(&player, "run-1");

    let result = player.step_previous(&request).unwrap();

    assert!(!result.moved);
    assert_eq!(at(&result), (1, 1));
}

// ============================================================================
// SECTION: Test Moves
// ============================================================================

/// Verifies test moves always land on the target test's first step.
#[test]
fn test_moves_land_on_first_step() {
    let player = player();
    let request = started(&player, "run-1");

    player.record_pass(&request).unwrap();
    assert_eq!(at(&player.test_next(&request).unwrap()), (2, 1));
    assert_eq!(at(&player.test_step_last(&request).unwrap()), (2, 3));
    assert_eq!(at(&player.test_previous(&request).unwrap()), (1, 1));
    assert_eq!(at(&player.test_last(&request).unwrap()), (3, 1));
    assert_eq!(at(&player.test_first(&request).unwrap()), (1, 1));
}

/// Verifies test moves past either end do not move.
#[test]
fn test_moves_at_boundaries_are_noops() {
    let player = player();
    let request = started(&player, "run-1");

    let previous = player.test_previous(&request).unwrap();
    assert!(!previous.moved);
    assert_eq!(at(&previous), (1, 1));

    player.test_last(&request).unwrap();
    player.record_fail(&request).unwrap();
    let next = player.test_next(&request).unwrap();
    assert!(!next.moved);
    assert_eq!(at(&next), (3, 1));
}

// ============================================================================
// SECTION: Within-Test Moves
// ============================================================================

/// Verifies within-test moves never change the current entry.
#[test]
fn test_step_moves_stay_within_test() {
    let player = player();
    let request = started(&player, "run-1");
    player.record_pass(&request).unwrap();
    player.test_next(&request).unwrap();

    assert_eq!(at(&player.test_step_last(&request).unwrap()), (2, 3));
    assert_eq!(at(&player.test_step_previous(&request).unwrap()), (2, 2));
    assert_eq!(at(&player.test_step_first(&request).unwrap()), (2, 1));
    player.record_pass(&request).unwrap();
    assert_eq!(at(&player.test_step_next(&request).unwrap()), (2, 2));
}

/// Verifies within-test moves past the test's ends are no-ops.
#[test]
fn test_step_moves_at_boundaries_are_noops() {
    let player = player();
    let request = started(&player, "run-1");

    let previous = player.test_step_previous(&request).unwrap();
    assert!(!previous.moved);

    player.test_step_last(&request).unwrap();
    player.record_pass(&request).unwrap();
    let next = player.test_step_next(&request).unwrap();
    assert!(!next.moved);
    assert_eq!(at(&next), (1, 2));
}

/// Verifies the generic entry point matches the named moves.
#[test]
fn navigate_matches_named_moves() {
    let player = player();
    let request = started(&player, "run-1");

    let result = player
        .navigate(&NavigateRequest::new(
            &request,
            CursorMove::new(MoveScope::Run, MoveDirection::Last),
        ))
        .unwrap();

    assert!(result.moved);
    assert_eq!(at(&result), (3, 1));
    assert_eq!(position_of(&player, &request), (3, 1));
}

// ============================================================================
// SECTION: Position
// ============================================================================

/// Verifies `position(0)` rewinds to the first entry and keeps the run open.
#[test]
fn position_zero_rewinds_to_first_entry() {
    let player = player();
    let request = started(&player, "run-1");
    pass_and_step(&player, &request);
    pass_and_step(&player, &request);

    let result = player.position(&position_request(&request, 0)).unwrap();

    assert!(result.moved);
    assert_eq!(at(&result), (1, 1));
    assert_eq!(result.run.state, RunState::Open);
    assert_eq!(position_of(&player, &request), (1, 1));
}

/// Verifies negative sequences also rewind.
#[test]
fn position_negative_rewinds() {
    let player = player();
    let request = started(&player, "run-1");
    player.test_last(&request).unwrap();

    let result = player.position(&position_request(&request, -4)).unwrap();
    assert_eq!(at(&result), (1, 1));
}

/// Verifies positioning lands on the target entry's first step.
#[test]
fn position_targets_entry_first_step() {
    let player = player();
    let request = started(&player, "run-1");

    let result = player.position(&position_request(&request, 2)).unwrap();
    assert_eq!(at(&result), (2, 1));

    let again = player.position(&position_request(&request, 2)).unwrap();
    assert!(!again.moved);
}

/// Verifies unknown sequences fail with `SequenceNotFound`.
#[test]
fn position_unknown_sequence_fails() {
    let player = player();
    let request = started(&player, "run-1");

    let err = player.position(&position_request(&request, 9)).unwrap_err();

    assert!(matches!(err, PlayerError::SequenceNotFound { sequence: 9, .. }));
    assert_eq!(position_of(&player, &request), (1, 1));
}
