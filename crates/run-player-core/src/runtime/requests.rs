// crates/run-player-core/src/runtime/requests.rs
// ============================================================================
// Module: Run Player Requests and Results
// Description: Typed request and response payloads for engine operations.
// Purpose: Replace loosely typed parameter maps with one struct per operation.
// Dependencies: crate::{core, interfaces}, serde
// ============================================================================

//! ## Overview
//! Each engine operation takes one request struct and returns one result
//! struct. Requests carry the acting user explicitly; the `from_identity`
//! constructors read it from an [`IdentityContext`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::OutcomeCode;
use crate::core::PlayEntry;
use crate::core::ProjectId;
use crate::core::Run;
use crate::core::RunId;
use crate::core::TestCase;
use crate::core::TestSetId;
use crate::core::TestStep;
use crate::core::UserId;
use crate::interfaces::IdentityContext;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Request to create a run from a test set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRunRequest {
    /// New run identifier.
    pub run_id: RunId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Test set to build the play list from.
    pub test_set_id: TestSetId,
    /// Run owner.
    pub owner: UserId,
    /// Optional annotation.
    pub comment: Option<String>,
}

impl CreateRunRequest {
    /// Builds a request owned by the identity's user.
    #[must_use]
    pub fn from_identity(
        identity: &impl IdentityContext,
        run_id: RunId,
        project_id: ProjectId,
        test_set_id: TestSetId,
    ) -> Self {
        Self {
            run_id,
            project_id,
            test_set_id,
            owner: identity.current_user_id(),
            comment: None,
        }
    }
}

/// Request addressing a run with no further parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Target run.
    pub run_id: RunId,
    /// Acting user.
    pub actor: UserId,
}

impl RunRequest {
    /// Creates a request.
    #[must_use]
    pub const fn new(run_id: RunId, actor: UserId) -> Self {
        Self {
            run_id,
            actor,
        }
    }

    /// Builds a request acting as the identity's user.
    #[must_use]
    pub fn from_identity(identity: &impl IdentityContext, run_id: RunId) -> Self {
        Self::new(run_id, identity.current_user_id())
    }
}

/// Request to close a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseRequest {
    /// Target run.
    pub run_id: RunId,
    /// Acting user.
    pub actor: UserId,
    /// Run code; the project incomplete code when absent.
    pub code: Option<OutcomeCode>,
    /// Annotation; left untouched when absent.
    pub comment: Option<String>,
}

impl From<RunRequest> for CloseRequest {
    fn from(request: RunRequest) -> Self {
        Self {
            run_id: request.run_id,
            actor: request.actor,
            code: None,
            comment: None,
        }
    }
}

/// Cursor movement granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveScope {
    /// All steps of the run as one flat list.
    Run,
    /// Test boundaries; always lands on a test's first step.
    Test,
    /// Steps inside the current test only.
    TestStep,
}

/// Cursor movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    /// First position in scope.
    First,
    /// Previous position in scope.
    Previous,
    /// Next position in scope; requires a judged current step.
    Next,
    /// Last position in scope.
    Last,
}

impl MoveDirection {
    /// Returns true for moves that require the current step to be judged.
    #[must_use]
    pub const fn is_forward(self) -> bool {
        matches!(self, Self::Next)
    }
}

/// One cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorMove {
    /// Granularity.
    pub scope: MoveScope,
    /// Direction.
    pub direction: MoveDirection,
}

impl CursorMove {
    /// Creates a movement.
    #[must_use]
    pub const fn new(scope: MoveScope, direction: MoveDirection) -> Self {
        Self {
            scope,
            direction,
        }
    }
}

/// Request to move a run's cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateRequest {
    /// Target run.
    pub run_id: RunId,
    /// Acting user.
    pub actor: UserId,
    /// Movement to apply.
    pub movement: CursorMove,
}

impl NavigateRequest {
    /// Builds a navigation request for a run request.
    #[must_use]
    pub fn new(request: &RunRequest, movement: CursorMove) -> Self {
        Self {
            run_id: request.run_id.clone(),
            actor: request.actor,
            movement,
        }
    }
}

/// Judgement recorded against a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Step passed.
    Pass,
    /// Step failed.
    Fail,
}

/// Request to record an outcome on the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRequest {
    /// Target run.
    pub run_id: RunId,
    /// Acting user.
    pub actor: UserId,
    /// Pass or fail; selects the default code.
    pub verdict: Verdict,
    /// Explicit code overriding the verdict default.
    pub code: Option<OutcomeCode>,
    /// Note; an absent or empty note clears the existing one.
    pub comment: Option<String>,
}

impl OutcomeRequest {
    /// Builds an outcome request with no code or comment.
    #[must_use]
    pub fn new(request: &RunRequest, verdict: Verdict) -> Self {
        Self {
            run_id: request.run_id.clone(),
            actor: request.actor,
            verdict,
            code: None,
            comment: None,
        }
    }
}

/// Request for the fused record-and-advance operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextRequest {
    /// Target run.
    pub run_id: RunId,
    /// Acting user.
    pub actor: UserId,
    /// Execution status written when the test completes.
    pub status: Option<String>,
    /// Outcome code for the current step; when absent the step must already be judged.
    pub code: Option<OutcomeCode>,
    /// Note recorded with the code.
    pub comment: Option<String>,
}

impl NextRequest {
    /// Builds a next request with no outcome payload.
    #[must_use]
    pub fn new(request: &RunRequest) -> Self {
        Self {
            run_id: request.run_id.clone(),
            actor: request.actor,
            status: None,
            code: None,
            comment: None,
        }
    }
}

/// Request to reposition a run at an entry sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRequest {
    /// Target run.
    pub run_id: RunId,
    /// Acting user.
    pub actor: UserId,
    /// Entry sequence; values <= 0 rewind to the first entry.
    pub sequence: i64,
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Result of run creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRun {
    /// Persisted run.
    pub run: Run,
    /// Play list in sequence order.
    pub entries: Vec<PlayEntry>,
}

/// Result of a state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionResult {
    /// Run after the transition.
    pub run: Run,
    /// True when the transition was persisted.
    pub changed: bool,
}

/// Result of the current-entry read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentEntry {
    /// Run as loaded.
    pub run: Run,
    /// Entry under the cursor.
    pub entry: PlayEntry,
    /// True when the cursor was dangling and the first entry was returned.
    pub recovered: bool,
}

/// Result of the current-test read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentTest {
    /// Entry under the cursor.
    pub entry: PlayEntry,
    /// Test played by the entry.
    pub test: TestCase,
}

/// Result of the current-step read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStep {
    /// Entry under the cursor.
    pub entry: PlayEntry,
    /// Step under the cursor.
    pub step: TestStep,
}

/// Result of a cursor move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    /// Run after the move.
    pub run: Run,
    /// Entry under the cursor after the move.
    pub entry: PlayEntry,
    /// Step under the cursor after the move.
    pub step: TestStep,
    /// True when the cursor changed and was persisted.
    pub moved: bool,
}

/// Result of outcome recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeResult {
    /// Entry after recording.
    pub entry: PlayEntry,
    /// True when the entry changed and was persisted.
    pub changed: bool,
}

/// Result of the fused record-and-advance operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextResult {
    /// Run after the operation.
    pub run: Run,
    /// Entry under the cursor; `None` once the run closed.
    pub entry: Option<PlayEntry>,
    /// Step under the cursor; `None` once the run closed.
    pub next_step: Option<TestStep>,
}
