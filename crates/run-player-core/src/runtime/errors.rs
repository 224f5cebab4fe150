// crates/run-player-core/src/runtime/errors.rs
// ============================================================================
// Module: Run Player Errors
// Description: Typed failure taxonomy for engine operations.
// Purpose: Carry enough context to reconstruct every failure and classify it.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! Every engine failure is a [`PlayerError`] variant naming the run and, where
//! relevant, the entry sequence, step, or action. Classification helpers let
//! callers decide between prompting the user, retrying, or escalating.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::PlayListError;
use crate::core::PlayerAction;
use crate::core::RunId;
use crate::core::TestId;
use crate::core::TestSetId;
use crate::core::UserId;
use crate::interfaces::CatalogError;
use crate::interfaces::SettingsError;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Run player operation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling; see [`PlayerError::kind`].
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Run does not exist.
    #[error("run not found: {0}")]
    RunNotFound(RunId),
    /// Run identifier already taken.
    #[error("run already exists: {0}")]
    RunAlreadyExists(RunId),
    /// Play entry lookup failed.
    #[error("play entry {entry} not found in run {run_id}")]
    PlayEntryNotFound {
        /// Run searched.
        run_id: RunId,
        /// Entry reference that failed to resolve.
        entry: String,
    },
    /// Cursor step does not exist in the entry's test.
    #[error("step {step} not found in test {test_id} (run {run_id})")]
    StepNotFound {
        /// Run being operated.
        run_id: RunId,
        /// Test searched.
        test_id: TestId,
        /// Missing step sequence.
        step: u32,
    },
    /// Test set does not exist or belongs to another project.
    #[error("test set not found: {0}")]
    TestSetNotFound(TestSetId),
    /// Test does not exist.
    #[error("test not found: {0}")]
    TestNotFound(TestId),
    /// Test set has no linked tests.
    #[error("test set {0} has no linked tests")]
    TestSetEmpty(TestSetId),
    /// Test has no steps.
    #[error("test {0} has no steps")]
    EmptyTest(TestId),
    /// Actor does not own the run.
    #[error("user {actor} may not {action} run {run_id}")]
    RunAccessDenied {
        /// Target run.
        run_id: RunId,
        /// Acting user.
        actor: UserId,
        /// Attempted action.
        action: PlayerAction,
    },
    /// Run has not been started.
    #[error("run {run_id} is not started ({action})")]
    RunNotStarted {
        /// Target run.
        run_id: RunId,
        /// Attempted action.
        action: PlayerAction,
    },
    /// Run is closed.
    #[error("run {run_id} is closed ({action})")]
    RunClosed {
        /// Target run.
        run_id: RunId,
        /// Attempted action.
        action: PlayerAction,
    },
    /// Forward move attempted before the current step was judged.
    #[error("step {step} of entry {sequence} in run {run_id} has no recorded outcome")]
    StepNotTerminated {
        /// Target run.
        run_id: RunId,
        /// Current entry sequence.
        sequence: u32,
        /// Current step sequence.
        step: u32,
    },
    /// Run cursor does not resolve to one of its entries.
    #[error("run {run_id} cursor does not resolve to a play entry ({action})")]
    SequenceInvalid {
        /// Target run.
        run_id: RunId,
        /// Attempted action.
        action: PlayerAction,
    },
    /// Requested entry sequence does not exist.
    #[error("run {run_id} has no play entry with sequence {sequence}")]
    SequenceNotFound {
        /// Target run.
        run_id: RunId,
        /// Requested sequence.
        sequence: i64,
    },
    /// Run has no current step.
    #[error("run {run_id} has no current step")]
    NoCurrentStep {
        /// Target run.
        run_id: RunId,
    },
    /// Persisting a mutation failed; nothing may be assumed committed.
    #[error("failed to save run {run_id}: {source}")]
    SaveFailed {
        /// Target run.
        run_id: RunId,
        /// Store failure.
        source: StoreError,
    },
    /// Loading run state failed.
    #[error("failed to load run {run_id}: {source}")]
    LoadFailed {
        /// Target run.
        run_id: RunId,
        /// Store failure.
        source: StoreError,
    },
    /// Run changed between load and commit.
    #[error("run {run_id} was modified concurrently (expected version {expected}, found {actual})")]
    Conflict {
        /// Target run.
        run_id: RunId,
        /// Version the operation loaded.
        expected: u64,
        /// Version found at commit.
        actual: u64,
    },
    /// Internal invariant violation.
    #[error("system error for run {run_id}: {message}")]
    System {
        /// Target run.
        run_id: RunId,
        /// Violation description.
        message: String,
    },
    /// Catalog failure.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Settings failure.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl PlayerError {
    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RunNotFound(_) => "run_not_found",
            Self::RunAlreadyExists(_) => "run_already_exists",
            Self::PlayEntryNotFound {
                ..
            } => "play_entry_not_found",
            Self::StepNotFound {
                ..
            } => "step_not_found",
            Self::TestSetNotFound(_) => "test_set_not_found",
            Self::TestNotFound(_) => "test_not_found",
            Self::TestSetEmpty(_) => "test_set_empty",
            Self::EmptyTest(_) => "empty_test",
            Self::RunAccessDenied {
                ..
            } => "run_access_denied",
            Self::RunNotStarted {
                ..
            } => "run_not_started",
            Self::RunClosed {
                ..
            } => "run_closed",
            Self::StepNotTerminated {
                ..
            } => "step_not_terminated",
            Self::SequenceInvalid {
                ..
            } => "sequence_invalid",
            Self::SequenceNotFound {
                ..
            } => "sequence_not_found",
            Self::NoCurrentStep {
                ..
            } => "no_current_step",
            Self::SaveFailed {
                ..
            } => "save_failed",
            Self::LoadFailed {
                ..
            } => "load_failed",
            Self::Conflict {
                ..
            } => "conflict",
            Self::System {
                ..
            } => "system_error",
            Self::Catalog(_) => "catalog_error",
            Self::Settings(_) => "settings_error",
        }
    }

    /// Returns true when retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SaveFailed {
                ..
            } | Self::Conflict {
                ..
            }
        )
    }

    /// Returns true when the user can resolve the failure by acting on the run.
    #[must_use]
    pub const fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            Self::RunNotStarted {
                ..
            } | Self::RunClosed {
                ..
            } | Self::StepNotTerminated {
                ..
            } | Self::SequenceNotFound {
                ..
            }
        )
    }

    /// Returns true when the failure indicates corrupted run data.
    #[must_use]
    pub const fn is_system_error(&self) -> bool {
        matches!(
            self,
            Self::System {
                ..
            } | Self::SequenceInvalid {
                ..
            }
        )
    }

    /// Builds a system error for an inconsistent play list.
    pub(crate) fn invalid_play_list(run_id: &RunId, err: &PlayListError) -> Self {
        Self::System {
            run_id: run_id.clone(),
            message: format!("run has an invalid play list: {err}"),
        }
    }

    /// Maps a load failure.
    pub(crate) fn load_failed(run_id: &RunId, source: StoreError) -> Self {
        Self::LoadFailed {
            run_id: run_id.clone(),
            source,
        }
    }

    /// Maps a commit failure, surfacing optimistic conflicts distinctly.
    pub(crate) fn save_failed(run_id: &RunId, source: StoreError) -> Self {
        match source {
            StoreError::Conflict {
                expected,
                actual,
                ..
            } => Self::Conflict {
                run_id: run_id.clone(),
                expected,
                actual,
            },
            StoreError::AlreadyExists(existing) => Self::RunAlreadyExists(existing),
            source => Self::SaveFailed {
                run_id: run_id.clone(),
                source,
            },
        }
    }
}
