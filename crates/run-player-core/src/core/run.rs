// crates/run-player-core/src/core/run.rs
// ============================================================================
// Module: Run Aggregate
// Description: Run, play entry, cursor, and per-step outcome records.
// Purpose: Hold the mutable execution state the engine reads and persists.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! A [`Run`] is one execution of a test set. Its play list is a fixed,
//! sequence-ordered list of [`PlayEntry`] slots, one per linked test. The
//! run's [`Cursor`] names the current entry by id and the current step by
//! its sequence within the entry's test. The cursor lives on the run itself;
//! there is no session-scoped position state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::OutcomeCode;
use crate::core::identifiers::PlayEntryId;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::TestId;
use crate::core::identifiers::TestSetId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Run State
// ============================================================================

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Created but never opened.
    NotStarted,
    /// Open for navigation and outcome recording.
    Open,
    /// Closed; only reads are permitted until re-started.
    Closed,
}

impl RunState {
    /// Returns the stable numeric code for the state.
    #[must_use]
    pub const fn as_code(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Open => 1,
            Self::Closed => 2,
        }
    }

    /// Parses a numeric state code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::NotStarted),
            1 => Some(Self::Open),
            2 => Some(Self::Closed),
            _ => None,
        }
    }

    /// Returns a stable label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

// ============================================================================
// SECTION: Cursor
// ============================================================================

/// Current position of a run.
///
/// # Invariants
/// - `entry_id` names an entry of the owning run.
/// - `step` is the sequence of a step belonging to that entry's test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
    /// Current play entry.
    pub entry_id: PlayEntryId,
    /// Sequence of the current step within the entry's test.
    pub step: u32,
}

impl Cursor {
    /// Creates a cursor.
    #[must_use]
    pub const fn new(entry_id: PlayEntryId, step: u32) -> Self {
        Self {
            entry_id,
            step,
        }
    }
}

// ============================================================================
// SECTION: Run
// ============================================================================

/// One execution of a test set.
///
/// # Invariants
/// - `cursor` is `None` only while the run has never been opened.
/// - `version` increases by exactly one on every persisted mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Run identifier.
    pub run_id: RunId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Test set the play list was built from.
    pub test_set_id: TestSetId,
    /// Only user permitted to operate the run.
    pub owner: UserId,
    /// Lifecycle state.
    pub state: RunState,
    /// Current position.
    pub cursor: Option<Cursor>,
    /// Final or initial run outcome code.
    pub run_code: Option<OutcomeCode>,
    /// Free-text annotation.
    pub comment: Option<String>,
    /// Optimistic concurrency counter.
    pub version: u64,
}

impl Run {
    /// Returns true when `user` owns the run.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }
}

// ============================================================================
// SECTION: Play Entries
// ============================================================================

/// Outcome recorded against one step of an entry's test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Step sequence within the test.
    pub step: u32,
    /// Recorded outcome code.
    pub code: OutcomeCode,
    /// Optional tester note.
    pub comment: Option<String>,
}

/// One per-test slot in a run's play list.
///
/// # Invariants
/// - `sequence` is assigned once by the play-list builder and never changes.
/// - `step_results` holds at most one result per step, ordered by step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEntry {
    /// Entry identifier.
    pub entry_id: PlayEntryId,
    /// Owning run.
    pub run_id: RunId,
    /// 1-based position in the run.
    pub sequence: u32,
    /// Test played by this entry.
    pub test_id: TestId,
    /// Test outcome folded from the step results (fail wins).
    pub run_code: Option<OutcomeCode>,
    /// Execution status label written when the test completes.
    pub status: Option<String>,
    /// Free-text note.
    pub comment: Option<String>,
    /// Per-step outcomes.
    #[serde(default)]
    pub step_results: Vec<StepResult>,
}

impl PlayEntry {
    /// Creates an entry with no outcomes.
    #[must_use]
    pub fn new(run_id: &RunId, sequence: u32, test_id: TestId) -> Self {
        Self {
            entry_id: PlayEntryId::for_slot(run_id, sequence),
            run_id: run_id.clone(),
            sequence,
            test_id,
            run_code: None,
            status: None,
            comment: None,
            step_results: Vec::new(),
        }
    }

    /// Returns the outcome recorded for `step`, if any.
    #[must_use]
    pub fn step_result(&self, step: u32) -> Option<&StepResult> {
        self.step_results.iter().find(|result| result.step == step)
    }

    /// Returns true when `step` has a recorded outcome.
    #[must_use]
    pub fn is_step_terminated(&self, step: u32) -> bool {
        self.step_result(step).is_some()
    }

    /// Stores `result`, replacing any earlier result for the same step.
    /// Returns true when the stored value changed.
    pub fn set_step_result(&mut self, result: StepResult) -> bool {
        match self.step_results.binary_search_by_key(&result.step, |existing| existing.step) {
            Ok(index) => {
                if self.step_results[index] == result {
                    return false;
                }
                self.step_results[index] = result;
                true
            }
            Err(index) => {
                self.step_results.insert(index, result);
                true
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::*;

    #[test]
    fn state_codes_are_stable() {
        for state in [RunState::NotStarted, RunState::Open, RunState::Closed] {
            assert_eq!(RunState::from_code(state.as_code()), Some(state));
        }
        assert_eq!(RunState::from_code(3), None);
    }

    #[test]
    fn step_results_stay_sorted_and_report_changes() {
        let run_id = RunId::new("run");
        let mut entry = PlayEntry::new(&run_id, 1, TestId::from_raw(1).unwrap());
        let pass = |step| StepResult {
            step,
            code: OutcomeCode::new("P"),
            comment: None,
        };
        assert!(entry.set_step_result(pass(3)));
        assert!(entry.set_step_result(pass(1)));
        assert!(!entry.set_step_result(pass(1)));
        let steps: Vec<u32> = entry.step_results.iter().map(|result| result.step).collect();
        assert_eq!(steps, vec![1, 3]);
        assert!(entry.is_step_terminated(3));
        assert!(!entry.is_step_terminated(2));
    }
}
