// crates/run-player-core/src/runtime/transitions.rs
// ============================================================================
// Module: Run State Machine
// Description: Guards and transitions for the NotStarted -> Open -> Closed lifecycle.
// Purpose: Decide operation legality and apply start/close without touching storage.
// Dependencies: crate::{core, runtime::errors}
// ============================================================================

//! ## Overview
//! Transition helpers mutate a [`Run`] in place and report whether anything
//! changed so the engine persists only real transitions. Guards run in a fixed
//! order: ownership first, then state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Cursor;
use crate::core::OutcomeCode;
use crate::core::PlayerAction;
use crate::core::Run;
use crate::core::RunState;
use crate::core::UserId;
use crate::runtime::errors::PlayerError;

// ============================================================================
// SECTION: Guards
// ============================================================================

/// Rejects actors other than the run owner.
///
/// # Errors
///
/// Returns [`PlayerError::RunAccessDenied`] on mismatch.
pub fn ensure_owner(run: &Run, actor: UserId, action: PlayerAction) -> Result<(), PlayerError> {
    if run.is_owned_by(actor) {
        return Ok(());
    }
    Err(PlayerError::RunAccessDenied {
        run_id: run.run_id.clone(),
        actor,
        action,
    })
}

/// Requires the run to be open.
///
/// # Errors
///
/// Returns [`PlayerError::RunNotStarted`] or [`PlayerError::RunClosed`].
pub fn ensure_open(run: &Run, action: PlayerAction) -> Result<(), PlayerError> {
    match run.state {
        RunState::Open => Ok(()),
        RunState::NotStarted => Err(PlayerError::RunNotStarted {
            run_id: run.run_id.clone(),
            action,
        }),
        RunState::Closed => Err(PlayerError::RunClosed {
            run_id: run.run_id.clone(),
            action,
        }),
    }
}

/// Returns the cursor for read operations, which are legal while open or closed.
///
/// # Errors
///
/// Returns [`PlayerError::RunNotStarted`] when the cursor was never set.
pub fn readable_cursor(run: &Run, action: PlayerAction) -> Result<&Cursor, PlayerError> {
    run.cursor.as_ref().ok_or_else(|| PlayerError::RunNotStarted {
        run_id: run.run_id.clone(),
        action,
    })
}

// ============================================================================
// SECTION: Transitions
// ============================================================================

/// Returns true when starting `run` must first compute an initial cursor.
#[must_use]
pub const fn start_needs_cursor(run: &Run) -> bool {
    !matches!(run.state, RunState::Open) && run.cursor.is_none()
}

/// Opens the run. Returns true when the run changed.
///
/// A re-opened run keeps its cursor; `initial_cursor` fills it only when unset.
pub fn apply_start(run: &mut Run, initial_cursor: Option<Cursor>) -> bool {
    if run.state == RunState::Open {
        return false;
    }
    run.state = RunState::Open;
    if run.cursor.is_none() {
        run.cursor = initial_cursor;
    }
    true
}

/// Closes the run. Returns true when the run changed.
///
/// `code` is the run code to write; the comment is replaced only when given.
pub fn apply_close(run: &mut Run, code: OutcomeCode, comment: Option<String>) -> bool {
    if run.state == RunState::Closed {
        return false;
    }
    run.state = RunState::Closed;
    run.run_code = Some(code);
    if let Some(comment) = comment {
        run.comment = Some(comment);
    }
    true
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::*;
    use crate::core::PlayEntryId;
    use crate::core::ProjectId;
    use crate::core::RunId;
    use crate::core::TestSetId;

    fn run(state: RunState) -> Run {
        Run {
            run_id: RunId::new("run"),
            project_id: ProjectId::from_raw(1).unwrap(),
            test_set_id: TestSetId::from_raw(1).unwrap(),
            owner: UserId::from_raw(7).unwrap(),
            state,
            cursor: None,
            run_code: None,
            comment: Some("keep".to_string()),
            version: 1,
        }
    }

    #[test]
    fn reopening_keeps_existing_cursor() {
        let mut closed = run(RunState::Closed);
        let original = Cursor::new(PlayEntryId::new("run/0002"), 3);
        closed.cursor = Some(original.clone());
        assert!(!start_needs_cursor(&closed));
        assert!(apply_start(&mut closed, Some(Cursor::new(PlayEntryId::new("run/0001"), 1))));
        assert_eq!(closed.state, RunState::Open);
        assert_eq!(closed.cursor, Some(original));
    }

    #[test]
    fn closing_twice_is_a_no_op() {
        let mut open = run(RunState::Open);
        assert!(apply_close(&mut open, OutcomeCode::new("INCOMPLETE"), None));
        assert_eq!(open.comment.as_deref(), Some("keep"));
        let snapshot = open.clone();
        assert!(!apply_close(&mut open, OutcomeCode::new("OTHER"), Some("new".to_string())));
        assert_eq!(open, snapshot);
    }

    #[test]
    fn guards_report_stable_kinds() {
        let closed = run(RunState::Closed);
        let stranger = UserId::from_raw(8).unwrap();
        let err = ensure_owner(&closed, stranger, PlayerAction::Next).unwrap_err();
        assert_eq!(err.kind(), "run_access_denied");
        let err = ensure_open(&closed, PlayerAction::Next).unwrap_err();
        assert_eq!(err.kind(), "run_closed");
    }
}
