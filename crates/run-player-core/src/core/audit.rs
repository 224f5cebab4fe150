// crates/run-player-core/src/core/audit.rs
// ============================================================================
// Module: Run Audit Events
// Description: Structured audit records emitted by every engine operation.
// Purpose: Reconstruct who did what to which run, and how it ended.
// Dependencies: crate::core::{identifiers, run, time}, serde
// ============================================================================

//! ## Overview
//! The engine emits one [`RunAuditEvent`] per operation, successful or not.
//! Labels are stable so downstream log processors can key on them.
//! Security posture: events carry identifiers and outcome codes only; tester
//! comments are never copied into audit records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RunId;
use crate::core::identifiers::UserId;
use crate::core::run::RunState;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Engine operation classification.
///
/// # Invariants
/// - Variants are stable for audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerAction {
    /// Run creation and play-list build.
    CreateRun,
    /// Start or re-open.
    Start,
    /// Close.
    Close,
    /// Read of the current entry.
    Current,
    /// Read of the current test.
    CurrentTest,
    /// Read of the current step.
    CurrentStep,
    /// Run-wide step navigation.
    StepMove,
    /// Test-boundary navigation.
    TestMove,
    /// Step navigation inside the current test.
    TestStepMove,
    /// Outcome recording.
    RecordOutcome,
    /// Fused record-and-advance.
    Next,
    /// Reposition by entry sequence.
    Position,
}

impl PlayerAction {
    /// Returns a stable label for the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateRun => "create_run",
            Self::Start => "start",
            Self::Close => "close",
            Self::Current => "current",
            Self::CurrentTest => "current_test",
            Self::CurrentStep => "current_step",
            Self::StepMove => "step_move",
            Self::TestMove => "test_move",
            Self::TestStepMove => "test_step_move",
            Self::RecordOutcome => "record_outcome",
            Self::Next => "next",
            Self::Position => "position",
        }
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Operation changed and persisted run state.
    Applied,
    /// Operation succeeded without persisting anything.
    Unchanged,
    /// Current-entry read recovered from a dangling cursor.
    Recovered,
    /// Operation failed.
    Failed,
}

impl AuditOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Unchanged => "unchanged",
            Self::Recovered => "recovered",
            Self::Failed => "failed",
        }
    }
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// Audit record for one engine operation.
///
/// # Invariants
/// - `error_kind` is set iff `outcome` is [`AuditOutcome::Failed`].
/// - State fields are `None` when the run could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAuditEvent {
    /// Operation performed.
    pub action: PlayerAction,
    /// Target run.
    pub run_id: RunId,
    /// Acting user.
    pub actor: UserId,
    /// Outcome classification.
    pub outcome: AuditOutcome,
    /// Stable error label on failure.
    pub error_kind: Option<String>,
    /// Run state before the operation.
    pub state_before: Option<RunState>,
    /// Run state after the operation.
    pub state_after: Option<RunState>,
    /// Cursor entry sequence after the operation.
    pub entry_sequence: Option<u32>,
    /// Cursor step after the operation.
    pub step: Option<u32>,
    /// Event time.
    pub recorded_at: Timestamp,
}
