// crates/run-player-core/src/core/play_list.rs
// ============================================================================
// Module: Ordered Play Views
// Description: Validated, sequence-ordered views over play entries and test steps.
// Purpose: Give the navigator first/previous/next/last lookups with checked invariants.
// Dependencies: crate::core::{catalog, identifiers, run}, thiserror
// ============================================================================

//! ## Overview
//! [`PlayList`] wraps a run's entries after checking that sequences are
//! unique, contiguous from 1, and that every entry belongs to the run.
//! [`StepList`] wraps a test's steps sorted by sequence; step sequences must
//! be unique but may have gaps.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::catalog::TestStep;
use crate::core::identifiers::PlayEntryId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::TestId;
use crate::core::run::PlayEntry;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Integrity failures detected while building an ordered view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayListError {
    /// Run has no play entries.
    #[error("run {0} has an empty play list")]
    Empty(RunId),
    /// Entry belongs to another run.
    #[error("play entry {entry_id} does not belong to run {run_id}")]
    ForeignEntry {
        /// Run the view was built for.
        run_id: RunId,
        /// Offending entry.
        entry_id: PlayEntryId,
    },
    /// Entry sequences are not contiguous from 1.
    #[error("run {run_id} play list expected sequence {expected}, found {found}")]
    SequenceGap {
        /// Run the view was built for.
        run_id: RunId,
        /// Sequence expected at this position.
        expected: u32,
        /// Sequence found at this position.
        found: u32,
    },
    /// Entry identifier appears more than once.
    #[error("play entry {0} appears more than once")]
    DuplicateEntry(PlayEntryId),
    /// Step belongs to another test.
    #[error("step {step} does not belong to test {test_id}")]
    ForeignStep {
        /// Test the view was built for.
        test_id: TestId,
        /// Offending step sequence.
        step: u32,
    },
    /// Step sequence appears more than once.
    #[error("test {test_id} has duplicate step sequence {step}")]
    DuplicateStep {
        /// Test the view was built for.
        test_id: TestId,
        /// Duplicated sequence.
        step: u32,
    },
}

// ============================================================================
// SECTION: Play List
// ============================================================================

/// Sequence-ordered play entries of one run.
///
/// # Invariants
/// - Non-empty.
/// - `entries[i].sequence == i + 1`.
/// - Every entry's `run_id` equals `run_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayList {
    /// Owning run.
    run_id: RunId,
    /// Entries sorted by sequence.
    entries: Vec<PlayEntry>,
}

impl PlayList {
    /// Validates and orders `entries` for `run_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PlayListError`] when the entries are empty, foreign,
    /// duplicated, or not contiguous from 1.
    pub fn new(run_id: &RunId, mut entries: Vec<PlayEntry>) -> Result<Self, PlayListError> {
        if entries.is_empty() {
            return Err(PlayListError::Empty(run_id.clone()));
        }
        entries.sort_by_key(|entry| entry.sequence);
        let mut expected: u32 = 1;
        for (index, entry) in entries.iter().enumerate() {
            if entry.run_id != *run_id {
                return Err(PlayListError::ForeignEntry {
                    run_id: run_id.clone(),
                    entry_id: entry.entry_id.clone(),
                });
            }
            if entries[.. index].iter().any(|earlier| earlier.entry_id == entry.entry_id) {
                return Err(PlayListError::DuplicateEntry(entry.entry_id.clone()));
            }
            if entry.sequence != expected {
                return Err(PlayListError::SequenceGap {
                    run_id: run_id.clone(),
                    expected,
                    found: entry.sequence,
                });
            }
            expected = expected.saturating_add(1);
        }
        Ok(Self {
            run_id: run_id.clone(),
            entries,
        })
    }

    /// Returns the owning run.
    #[must_use]
    pub const fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Returns the entries in sequence order.
    #[must_use]
    pub fn entries(&self) -> &[PlayEntry] {
        &self.entries
    }

    /// Consumes the view, returning the ordered entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<PlayEntry> {
        self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the first entry.
    #[must_use]
    pub fn first(&self) -> Option<&PlayEntry> {
        self.entries.first()
    }

    /// Returns the last entry.
    #[must_use]
    pub fn last(&self) -> Option<&PlayEntry> {
        self.entries.last()
    }

    /// Returns the entry at `sequence`.
    #[must_use]
    pub fn by_sequence(&self, sequence: u32) -> Option<&PlayEntry> {
        let index = usize::try_from(sequence.checked_sub(1)?).ok()?;
        self.entries.get(index)
    }

    /// Returns the entry with `entry_id`.
    #[must_use]
    pub fn by_id(&self, entry_id: &PlayEntryId) -> Option<&PlayEntry> {
        self.entries.iter().find(|entry| entry.entry_id == *entry_id)
    }

    /// Returns the entry following `sequence`.
    #[must_use]
    pub fn next_after(&self, sequence: u32) -> Option<&PlayEntry> {
        self.by_sequence(sequence.checked_add(1)?)
    }

    /// Returns the entry preceding `sequence`.
    #[must_use]
    pub fn previous_before(&self, sequence: u32) -> Option<&PlayEntry> {
        self.by_sequence(sequence.checked_sub(1)?)
    }
}

// ============================================================================
// SECTION: Step List
// ============================================================================

/// Sequence-ordered steps of one test.
///
/// # Invariants
/// - Step sequences are unique and sorted ascending.
/// - Every step belongs to `test_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepList {
    /// Owning test.
    test_id: TestId,
    /// Steps sorted by sequence.
    steps: Vec<TestStep>,
}

impl StepList {
    /// Validates and orders `steps` for `test_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PlayListError`] when a step belongs to another test or a
    /// sequence repeats.
    pub fn new(test_id: TestId, mut steps: Vec<TestStep>) -> Result<Self, PlayListError> {
        steps.sort_by_key(|step| step.sequence);
        for (index, step) in steps.iter().enumerate() {
            if step.test_id != test_id {
                return Err(PlayListError::ForeignStep {
                    test_id,
                    step: step.sequence,
                });
            }
            if index > 0 && steps[index - 1].sequence == step.sequence {
                return Err(PlayListError::DuplicateStep {
                    test_id,
                    step: step.sequence,
                });
            }
        }
        Ok(Self {
            test_id,
            steps,
        })
    }

    /// Returns the owning test.
    #[must_use]
    pub const fn test_id(&self) -> TestId {
        self.test_id
    }

    /// Returns the steps in sequence order.
    #[must_use]
    pub fn steps(&self) -> &[TestStep] {
        &self.steps
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true when the test has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the first step.
    #[must_use]
    pub fn first(&self) -> Option<&TestStep> {
        self.steps.first()
    }

    /// Returns the last step.
    #[must_use]
    pub fn last(&self) -> Option<&TestStep> {
        self.steps.last()
    }

    /// Returns the step with `sequence`.
    #[must_use]
    pub fn by_sequence(&self, sequence: u32) -> Option<&TestStep> {
        self.steps
            .binary_search_by_key(&sequence, |step| step.sequence)
            .ok()
            .and_then(|index| self.steps.get(index))
    }

    /// Returns the first step ordered after `sequence`.
    #[must_use]
    pub fn next_after(&self, sequence: u32) -> Option<&TestStep> {
        self.steps.iter().find(|step| step.sequence > sequence)
    }

    /// Returns the last step ordered before `sequence`.
    #[must_use]
    pub fn previous_before(&self, sequence: u32) -> Option<&TestStep> {
        self.steps.iter().rev().find(|step| step.sequence < sequence)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
