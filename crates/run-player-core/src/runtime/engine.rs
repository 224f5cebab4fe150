// crates/run-player-core/src/runtime/engine.rs
// ============================================================================
// Module: Run Player Engine
// Description: Guarded, audited execution of run lifecycle, navigation, and outcomes.
// Purpose: Provide the single canonical path for every run operation.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! [`RunPlayer`] loads a run, checks ownership before anything else, applies
//! the state guard for the operation, delegates to the pure builder,
//! transition, navigator, and recorder helpers, and commits only real changes
//! through an optimistic version check. Every call emits exactly one audit
//! event, including failures.
//!
//! Security posture: callers are untrusted; ownership is enforced here and
//! never delegated to the transport layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::AuditOutcome;
use crate::core::Clock;
use crate::core::Cursor;
use crate::core::PlayEntry;
use crate::core::PlayList;
use crate::core::PlayerAction;
use crate::core::Run;
use crate::core::RunAuditEvent;
use crate::core::RunId;
use crate::core::RunState;
use crate::core::StepList;
use crate::core::SystemClock;
use crate::core::TestId;
use crate::core::TestStep;
use crate::core::UserId;
use crate::interfaces::EntryLookup;
use crate::interfaces::ProjectSettings;
use crate::interfaces::RunAuditSink;
use crate::interfaces::RunCommit;
use crate::interfaces::RunStore;
use crate::interfaces::TestCatalog;
use crate::runtime::builder::build_play_list;
use crate::runtime::builder::new_run;
use crate::runtime::errors::PlayerError;
use crate::runtime::navigator::Landing;
use crate::runtime::navigator::Origin;
use crate::runtime::navigator::resolve_move;
use crate::runtime::recorder::apply_completion;
use crate::runtime::recorder::apply_outcome;
use crate::runtime::recorder::completion_code;
use crate::runtime::recorder::entry_code;
use crate::runtime::recorder::default_code;
use crate::runtime::requests::CloseRequest;
use crate::runtime::requests::CreateRunRequest;
use crate::runtime::requests::CreatedRun;
use crate::runtime::requests::CurrentEntry;
use crate::runtime::requests::CurrentStep;
use crate::runtime::requests::CurrentTest;
use crate::runtime::requests::CursorMove;
use crate::runtime::requests::MoveDirection;
use crate::runtime::requests::MoveResult;
use crate::runtime::requests::MoveScope;
use crate::runtime::requests::NavigateRequest;
use crate::runtime::requests::NextRequest;
use crate::runtime::requests::NextResult;
use crate::runtime::requests::OutcomeRequest;
use crate::runtime::requests::OutcomeResult;
use crate::runtime::requests::PositionRequest;
use crate::runtime::requests::RunRequest;
use crate::runtime::requests::TransitionResult;
use crate::runtime::requests::Verdict;
use crate::runtime::transitions::apply_close;
use crate::runtime::transitions::apply_start;
use crate::runtime::transitions::ensure_open;
use crate::runtime::transitions::ensure_owner;
use crate::runtime::transitions::readable_cursor;
use crate::runtime::transitions::start_needs_cursor;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the run player engine.
#[derive(Debug, Clone)]
pub struct RunPlayerConfig {
    /// Timestamp source for audit events.
    pub clock: Arc<dyn Clock>,
}

impl Default for RunPlayerConfig {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
        }
    }
}

impl RunPlayerConfig {
    /// Creates a configuration using `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
        }
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Run execution engine.
pub struct RunPlayer<S, C, P, A> {
    /// Run store implementation.
    store: S,
    /// Test catalog implementation.
    catalog: C,
    /// Project settings implementation.
    settings: P,
    /// Audit sink implementation.
    audit: A,
    /// Engine configuration.
    config: RunPlayerConfig,
}

impl<S, C, P, A> RunPlayer<S, C, P, A>
where
    S: RunStore,
    C: TestCatalog,
    P: ProjectSettings,
    A: RunAuditSink,
{
    /// Creates a new engine.
    pub fn new(store: S, catalog: C, settings: P, audit: A, config: RunPlayerConfig) -> Self {
        Self {
            store,
            catalog,
            settings,
            audit,
            config,
        }
    }

    /// Returns the run store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the audit sink.
    pub const fn audit(&self) -> &A {
        &self.audit
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Creates a run and its play list from a test set.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::TestSetEmpty`] or [`PlayerError::EmptyTest`]
    /// when the test set cannot back a run, and lookup or save errors.
    pub fn create_run(&self, request: &CreateRunRequest) -> Result<CreatedRun, PlayerError> {
        let run_id = &request.run_id;
        self.audited(PlayerAction::CreateRun, run_id, request.owner, |trail| {
            let existing =
                self.store.load_run(run_id).map_err(|err| PlayerError::load_failed(run_id, err))?;
            if existing.is_some() {
                return Err(PlayerError::RunAlreadyExists(run_id.clone()));
            }
            let defaults = self.settings.defaults(request.project_id)?;
            let test_set = self
                .catalog
                .load_test_set(request.test_set_id)?
                .filter(|test_set| test_set.project_id == request.project_id)
                .ok_or(PlayerError::TestSetNotFound(request.test_set_id))?;
            let entries = build_play_list(run_id, &test_set)?;
            let mut initial_cursor = None;
            for entry in &entries {
                if self.catalog.load_test(entry.test_id)?.is_none() {
                    return Err(PlayerError::TestNotFound(entry.test_id));
                }
                let steps = self.load_steps(run_id, entry.test_id)?;
                let first = steps.first().ok_or(PlayerError::EmptyTest(entry.test_id))?;
                if initial_cursor.is_none() {
                    initial_cursor = Some(Cursor::new(entry.entry_id.clone(), first.sequence));
                }
            }
            let run = new_run(request, &defaults, initial_cursor);
            self.store
                .insert_run(&run, &entries)
                .map_err(|err| PlayerError::save_failed(run_id, err))?;
            trail.settled(&run);
            trail.outcome = AuditOutcome::Applied;
            Ok(CreatedRun {
                run,
                entries,
            })
        })
    }

    /// Opens a run; re-opens a closed run at its previous cursor.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::RunAccessDenied`] for non-owners, and lookup or
    /// save errors.
    pub fn start(&self, request: &RunRequest) -> Result<TransitionResult, PlayerError> {
        let action = PlayerAction::Start;
        self.audited(action, &request.run_id, request.actor, |trail| {
            let mut run = self.load_owned(&request.run_id, request.actor, action, trail)?;
            let initial_cursor =
                if start_needs_cursor(&run) { Some(self.initial_cursor(&run)?) } else { None };
            if !apply_start(&mut run, initial_cursor) {
                return Ok(TransitionResult {
                    run,
                    changed: false,
                });
            }
            let run = self.persist(run, Vec::new(), trail)?;
            Ok(TransitionResult {
                run,
                changed: true,
            })
        })
    }

    /// Closes a run with the given code, or the project incomplete code.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::RunAccessDenied`] for non-owners, and lookup or
    /// save errors.
    pub fn close(&self, request: &CloseRequest) -> Result<TransitionResult, PlayerError> {
        let action = PlayerAction::Close;
        self.audited(action, &request.run_id, request.actor, |trail| {
            let mut run = self.load_owned(&request.run_id, request.actor, action, trail)?;
            if run.state == RunState::Closed {
                return Ok(TransitionResult {
                    run,
                    changed: false,
                });
            }
            let code = match &request.code {
                Some(code) => code.clone(),
                None => self.settings.defaults(run.project_id)?.run_incomplete_code,
            };
            apply_close(&mut run, code, request.comment.clone());
            let run = self.persist(run, Vec::new(), trail)?;
            Ok(TransitionResult {
                run,
                changed: true,
            })
        })
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Returns the entry under the cursor.
    ///
    /// A cursor naming a missing entry falls back to the first entry and is
    /// audited as recovered; nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::RunNotStarted`] when the cursor was never set.
    pub fn current(&self, request: &RunRequest) -> Result<CurrentEntry, PlayerError> {
        let action = PlayerAction::Current;
        self.audited(action, &request.run_id, request.actor, |trail| {
            let run = self.load_owned(&request.run_id, request.actor, action, trail)?;
            let cursor = readable_cursor(&run, action)?.clone();
            let list = self.load_play_list(&run)?;
            if let Some(entry) = list.by_id(&cursor.entry_id) {
                trail.at(entry.sequence, Some(cursor.step));
                let entry = entry.clone();
                return Ok(CurrentEntry {
                    run,
                    entry,
                    recovered: false,
                });
            }
            let entry = list.first().cloned().ok_or_else(|| dangling(&run.run_id, &cursor))?;
            trail.at(entry.sequence, None);
            trail.outcome = AuditOutcome::Recovered;
            Ok(CurrentEntry {
                run,
                entry,
                recovered: true,
            })
        })
    }

    /// Returns the test of the entry under the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::RunNotStarted`] when the cursor was never set,
    /// or [`PlayerError::System`] when it names a missing entry.
    pub fn current_test(&self, request: &RunRequest) -> Result<CurrentTest, PlayerError> {
        let action = PlayerAction::CurrentTest;
        self.audited(action, &request.run_id, request.actor, |trail| {
            let run = self.load_owned(&request.run_id, request.actor, action, trail)?;
            let (_, entry, cursor) = self.resolve_entry(&run, action, CursorPolicy::Read)?;
            trail.at(entry.sequence, Some(cursor.step));
            let test =
                self.catalog.load_test(entry.test_id)?.ok_or(PlayerError::TestNotFound(entry.test_id))?;
            Ok(CurrentTest {
                entry,
                test,
            })
        })
    }

    /// Returns the step under the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::RunNotStarted`] when the cursor was never set,
    /// [`PlayerError::System`] when it names a missing entry, or
    /// [`PlayerError::StepNotFound`] when the step no longer exists.
    pub fn current_step(&self, request: &RunRequest) -> Result<CurrentStep, PlayerError> {
        let action = PlayerAction::CurrentStep;
        self.audited(action, &request.run_id, request.actor, |trail| {
            let run = self.load_owned(&request.run_id, request.actor, action, trail)?;
            let located = self.locate(&run, action, CursorPolicy::Read)?;
            trail.at(located.entry.sequence, Some(located.step.sequence));
            Ok(CurrentStep {
                entry: located.entry,
                step: located.step,
            })
        })
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Moves the cursor. Moves past either end of the scope are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::RunNotStarted`] or [`PlayerError::RunClosed`]
    /// unless the run is open, and [`PlayerError::StepNotTerminated`] for a
    /// forward move from an unjudged step.
    pub fn navigate(&self, request: &NavigateRequest) -> Result<MoveResult, PlayerError> {
        let action = match request.movement.scope {
            MoveScope::Run => PlayerAction::StepMove,
            MoveScope::Test => PlayerAction::TestMove,
            MoveScope::TestStep => PlayerAction::TestStepMove,
        };
        self.audited(action, &request.run_id, request.actor, |trail| {
            let run = self.load_owned(&request.run_id, request.actor, action, trail)?;
            ensure_open(&run, action)?;
            let located = self.locate(&run, action, CursorPolicy::Move)?;
            if request.movement.direction.is_forward() {
                ensure_terminated(&run, &located.entry, located.step.sequence)?;
            }
            let origin = Origin {
                list: &located.list,
                entry: &located.entry,
                steps: &located.steps,
                step: located.step.sequence,
            };
            let landing = resolve_move(origin, request.movement, |entry| {
                self.load_steps(&run.run_id, entry.test_id)
            })?;
            self.settle_move(run, located.entry, located.step, landing, trail)
        })
    }

    /// Moves to the first step of the run.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::navigate`].
    pub fn step_first(&self, request: &RunRequest) -> Result<MoveResult, PlayerError> {
        self.move_cursor(request, MoveScope::Run, MoveDirection::First)
    }

    /// Moves to the previous step of the run, crossing test boundaries.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::navigate`].
    pub fn step_previous(&self, request: &RunRequest) -> Result<MoveResult, PlayerError> {
        self.move_cursor(request, MoveScope::Run, MoveDirection::Previous)
    }

    /// Moves to the next step of the run, crossing test boundaries.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::navigate`].
    pub fn step_next(&self, request: &RunRequest) -> Result<MoveResult, PlayerError> {
        self.move_cursor(request, MoveScope::Run, MoveDirection::Next)
    }

    /// Moves to the last step of the run.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::navigate`].
    pub fn step_last(&self, request: &RunRequest) -> Result<MoveResult, PlayerError> {
        self.move_cursor(request, MoveScope::Run, MoveDirection::Last)
    }

    /// Moves to the first test.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::navigate`].
    pub fn test_first(&self, request: &RunRequest) -> Result<MoveResult, PlayerError> {
        self.move_cursor(request, MoveScope::Test, MoveDirection::First)
    }

    /// Moves to the previous test.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::navigate`].
    pub fn test_previous(&self, request: &RunRequest) -> Result<MoveResult, PlayerError> {
        self.move_cursor(request, MoveScope::Test, MoveDirection::Previous)
    }

    /// Moves to the next test.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::navigate`].
    pub fn test_next(&self, request: &RunRequest) -> Result<MoveResult, PlayerError> {
        self.move_cursor(request, MoveScope::Test, MoveDirection::Next)
    }

    /// Moves to the last test.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::navigate`].
    pub fn test_last(&self, request: &RunRequest) -> Result<MoveResult, PlayerError> {
        self.move_cursor(request, MoveScope::Test, MoveDirection::Last)
    }

    /// Moves to the first step of the current test.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::navigate`].
    pub fn test_step_first(&self, request: &RunRequest) -> Result<MoveResult, PlayerError> {
        self.move_cursor(request, MoveScope::TestStep, MoveDirection::First)
    }

    /// Moves to the previous step of the current test.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::navigate`].
    pub fn test_step_previous(&self, request: &RunRequest) -> Result<MoveResult, PlayerError> {
        self.move_cursor(request, MoveScope::TestStep, MoveDirection::Previous)
    }

    /// Moves to the next step of the current test.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::navigate`].
    pub fn test_step_next(&self, request: &RunRequest) -> Result<MoveResult, PlayerError> {
        self.move_cursor(request, MoveScope::TestStep, MoveDirection::Next)
    }

    /// Moves to the last step of the current test.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::navigate`].
    pub fn test_step_last(&self, request: &RunRequest) -> Result<MoveResult, PlayerError> {
        self.move_cursor(request, MoveScope::TestStep, MoveDirection::Last)
    }

    /// Repositions the cursor on an entry's first step.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::SequenceNotFound`] for an unknown positive
    /// sequence, and the usual guard errors.
    pub fn position(&self, request: &PositionRequest) -> Result<MoveResult, PlayerError> {
        let action = PlayerAction::Position;
        self.audited(action, &request.run_id, request.actor, |trail| {
            let mut run = self.load_owned(&request.run_id, request.actor, action, trail)?;
            ensure_open(&run, action)?;
            let lookup = if request.sequence <= 0 {
                Some(EntryLookup::First)
            } else {
                u32::try_from(request.sequence).ok().map(EntryLookup::Sequence)
            };
            let target = match lookup {
                Some(lookup) => self.find_entry(&run.run_id, &lookup)?,
                None => None,
            };
            let entry = target.ok_or_else(|| PlayerError::SequenceNotFound {
                run_id: run.run_id.clone(),
                sequence: request.sequence,
            })?;
            let step = self.first_step(&run.run_id, &entry)?;
            let cursor = Cursor::new(entry.entry_id.clone(), step.sequence);
            trail.at(entry.sequence, Some(step.sequence));
            if run.cursor.as_ref() == Some(&cursor) {
                return Ok(MoveResult {
                    run,
                    entry,
                    step,
                    moved: false,
                });
            }
            run.cursor = Some(cursor);
            let run = self.persist(run, Vec::new(), trail)?;
            Ok(MoveResult {
                run,
                entry,
                step,
                moved: true,
            })
        })
    }

    // ------------------------------------------------------------------------
    // Outcomes
    // ------------------------------------------------------------------------

    /// Records an outcome on the current step without moving the cursor.
    ///
    /// # Errors
    ///
    /// Returns the usual guard errors and save errors.
    pub fn record_outcome(&self, request: &OutcomeRequest) -> Result<OutcomeResult, PlayerError> {
        let action = PlayerAction::RecordOutcome;
        self.audited(action, &request.run_id, request.actor, |trail| {
            let run = self.load_owned(&request.run_id, request.actor, action, trail)?;
            ensure_open(&run, action)?;
            let located = self.locate(&run, action, CursorPolicy::Move)?;
            let defaults = self.settings.defaults(run.project_id)?;
            let code = match &request.code {
                Some(code) => code.clone(),
                None => default_code(request.verdict, &defaults),
            };
            let mut entry = located.entry;
            let step = located.step.sequence;
            trail.at(entry.sequence, Some(step));
            if !apply_outcome(&mut entry, step, code, request.comment.clone(), &defaults) {
                return Ok(OutcomeResult {
                    entry,
                    changed: false,
                });
            }
            self.persist(run, vec![entry.clone()], trail)?;
            Ok(OutcomeResult {
                entry,
                changed: true,
            })
        })
    }

    /// Records the project pass code on the current step.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::record_outcome`].
    pub fn record_pass(&self, request: &RunRequest) -> Result<OutcomeResult, PlayerError> {
        self.record_outcome(&OutcomeRequest::new(request, Verdict::Pass))
    }

    /// Records the project fail code on the current step.
    ///
    /// # Errors
    ///
    /// See [`RunPlayer::record_outcome`].
    pub fn record_fail(&self, request: &RunRequest) -> Result<OutcomeResult, PlayerError> {
        self.record_outcome(&OutcomeRequest::new(request, Verdict::Fail))
    }

    /// Records (optionally) and advances in one step.
    ///
    /// Inside a test the cursor moves to the next step. Leaving a test's last
    /// step writes the test outcome onto the entry and moves to the next
    /// entry's first step; after the last entry the run closes and no next
    /// step is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::SequenceInvalid`] when the cursor names a
    /// missing entry, [`PlayerError::NoCurrentStep`] when no step is current,
    /// [`PlayerError::StepNotTerminated`] when no code is supplied and the
    /// step is unjudged, and save errors.
    pub fn next(&self, request: &NextRequest) -> Result<NextResult, PlayerError> {
        let action = PlayerAction::Next;
        self.audited(action, &request.run_id, request.actor, |trail| {
            let mut run = self.load_owned(&request.run_id, request.actor, action, trail)?;
            ensure_open(&run, action)?;
            let Located {
                list,
                mut entry,
                steps,
                step,
            } = self.locate(&run, action, CursorPolicy::Advance)?;
            let defaults = self.settings.defaults(run.project_id)?;
            let mut entry_changed = false;
            if let Some(code) = &request.code {
                entry_changed |= apply_outcome(
                    &mut entry,
                    step.sequence,
                    code.clone(),
                    request.comment.clone(),
                    &defaults,
                );
            } else {
                ensure_terminated(&run, &entry, step.sequence)?;
            }

            if let Some(next_step) = steps.next_after(step.sequence).cloned() {
                run.cursor = Some(Cursor::new(entry.entry_id.clone(), next_step.sequence));
                trail.at(entry.sequence, Some(next_step.sequence));
                let run = self.persist(run, changed(entry_changed, &entry), trail)?;
                return Ok(NextResult {
                    run,
                    entry: Some(entry),
                    next_step: Some(next_step),
                });
            }

            let test_code = entry_code(&entry, &defaults).ok_or_else(|| {
                PlayerError::NoCurrentStep {
                    run_id: run.run_id.clone(),
                }
            })?;
            entry_changed |= apply_completion(
                &mut entry,
                request.status.clone(),
                test_code,
                request.comment.clone(),
            );
            let entries = changed(entry_changed, &entry);

            if let Some(next_entry) = list.next_after(entry.sequence).cloned() {
                let first = self.first_step(&run.run_id, &next_entry)?;
                run.cursor = Some(Cursor::new(next_entry.entry_id.clone(), first.sequence));
                trail.at(next_entry.sequence, Some(first.sequence));
                let run = self.persist(run, entries, trail)?;
                return Ok(NextResult {
                    run,
                    entry: Some(next_entry),
                    next_step: Some(first),
                });
            }

            let final_code = completion_code(
                list.entries().iter().map(|candidate| {
                    if candidate.entry_id == entry.entry_id { &entry } else { candidate }
                }),
                &defaults,
            );
            apply_close(&mut run, final_code, None);
            trail.at(entry.sequence, Some(step.sequence));
            let run = self.persist(run, entries, trail)?;
            Ok(NextResult {
                run,
                entry: None,
                next_step: None,
            })
        })
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Runs `op` and records one audit event for it.
    fn audited<T>(
        &self,
        action: PlayerAction,
        run_id: &RunId,
        actor: UserId,
        op: impl FnOnce(&mut Trail) -> Result<T, PlayerError>,
    ) -> Result<T, PlayerError> {
        let mut trail = Trail::default();
        let result = op(&mut trail);
        let (outcome, error_kind) = match &result {
            Ok(_) => (trail.outcome, None),
            Err(err) => (AuditOutcome::Failed, Some(err.kind().to_string())),
        };
        self.audit.record(&RunAuditEvent {
            action,
            run_id: run_id.clone(),
            actor,
            outcome,
            error_kind,
            state_before: trail.before,
            state_after: trail.after,
            entry_sequence: trail.entry_sequence,
            step: trail.step,
            recorded_at: self.config.clock.now(),
        });
        result
    }

    /// Loads a run and enforces ownership before any other check.
    fn load_owned(
        &self,
        run_id: &RunId,
        actor: UserId,
        action: PlayerAction,
        trail: &mut Trail,
    ) -> Result<Run, PlayerError> {
        let run = self
            .store
            .load_run(run_id)
            .map_err(|err| PlayerError::load_failed(run_id, err))?
            .ok_or_else(|| PlayerError::RunNotFound(run_id.clone()))?;
        trail.before = Some(run.state);
        trail.after = Some(run.state);
        ensure_owner(&run, actor, action)?;
        Ok(run)
    }

    /// Loads and validates a run's play list.
    fn load_play_list(&self, run: &Run) -> Result<PlayList, PlayerError> {
        let entries = self
            .store
            .load_play_list(&run.run_id)
            .map_err(|err| PlayerError::load_failed(&run.run_id, err))?;
        PlayList::new(&run.run_id, entries)
            .map_err(|err| PlayerError::invalid_play_list(&run.run_id, &err))
    }

    /// Looks up one play entry through the store.
    fn find_entry(
        &self,
        run_id: &RunId,
        lookup: &EntryLookup,
    ) -> Result<Option<PlayEntry>, PlayerError> {
        self.store.find_play_entry(run_id, lookup).map_err(|err| PlayerError::load_failed(run_id, err))
    }

    /// Loads and validates a test's steps.
    fn load_steps(&self, run_id: &RunId, test_id: TestId) -> Result<StepList, PlayerError> {
        let steps = self.catalog.load_steps(test_id)?;
        StepList::new(test_id, steps).map_err(|err| PlayerError::System {
            run_id: run_id.clone(),
            message: format!("test {test_id} has invalid steps: {err}"),
        })
    }

    /// Returns the first step of an entry's test.
    fn first_step(&self, run_id: &RunId, entry: &PlayEntry) -> Result<TestStep, PlayerError> {
        self.load_steps(run_id, entry.test_id)?
            .first()
            .cloned()
            .ok_or(PlayerError::EmptyTest(entry.test_id))
    }

    /// Computes the cursor a never-opened run starts at.
    fn initial_cursor(&self, run: &Run) -> Result<Cursor, PlayerError> {
        let first =
            self.find_entry(&run.run_id, &EntryLookup::First)?.ok_or_else(|| PlayerError::System {
                run_id: run.run_id.clone(),
                message: "run has an empty play list".to_string(),
            })?;
        let step = self.first_step(&run.run_id, &first)?;
        Ok(Cursor::new(first.entry_id.clone(), step.sequence))
    }

    /// Resolves the cursor entry without the `current` fallback.
    fn resolve_entry(
        &self,
        run: &Run,
        action: PlayerAction,
        policy: CursorPolicy,
    ) -> Result<(PlayList, PlayEntry, Cursor), PlayerError> {
        let cursor = match (&run.cursor, policy) {
            (Some(cursor), _) => cursor.clone(),
            (None, CursorPolicy::Read) => readable_cursor(run, action)?.clone(),
            (None, CursorPolicy::Advance) => {
                return Err(PlayerError::NoCurrentStep {
                    run_id: run.run_id.clone(),
                });
            }
            (None, CursorPolicy::Move) => {
                return Err(PlayerError::System {
                    run_id: run.run_id.clone(),
                    message: "open run has no cursor".to_string(),
                });
            }
        };
        let list = self.load_play_list(run)?;
        let Some(entry) = list.by_id(&cursor.entry_id).cloned() else {
            return Err(match policy {
                CursorPolicy::Advance => PlayerError::SequenceInvalid {
                    run_id: run.run_id.clone(),
                    action,
                },
                CursorPolicy::Read | CursorPolicy::Move => dangling(&run.run_id, &cursor),
            });
        };
        Ok((list, entry, cursor))
    }

    /// Resolves the cursor entry, its test's steps, and the current step.
    fn locate(
        &self,
        run: &Run,
        action: PlayerAction,
        policy: CursorPolicy,
    ) -> Result<Located, PlayerError> {
        let (list, entry, cursor) = self.resolve_entry(run, action, policy)?;
        let steps = self.load_steps(&run.run_id, entry.test_id)?;
        let Some(step) = steps.by_sequence(cursor.step).cloned() else {
            return Err(match policy {
                CursorPolicy::Advance => PlayerError::NoCurrentStep {
                    run_id: run.run_id.clone(),
                },
                CursorPolicy::Read | CursorPolicy::Move => PlayerError::StepNotFound {
                    run_id: run.run_id.clone(),
                    test_id: entry.test_id,
                    step: cursor.step,
                },
            });
        };
        Ok(Located {
            list,
            entry,
            steps,
            step,
        })
    }

    /// Applies a named movement.
    fn move_cursor(
        &self,
        request: &RunRequest,
        scope: MoveScope,
        direction: MoveDirection,
    ) -> Result<MoveResult, PlayerError> {
        self.navigate(&NavigateRequest::new(request, CursorMove::new(scope, direction)))
    }

    /// Persists a landing when it changes the cursor.
    fn settle_move(
        &self,
        mut run: Run,
        entry: PlayEntry,
        step: TestStep,
        landing: Option<Landing>,
        trail: &mut Trail,
    ) -> Result<MoveResult, PlayerError> {
        let Some(landing) = landing.filter(|landing| run.cursor.as_ref() != Some(&landing.cursor()))
        else {
            trail.at(entry.sequence, Some(step.sequence));
            return Ok(MoveResult {
                run,
                entry,
                step,
                moved: false,
            });
        };
        run.cursor = Some(landing.cursor());
        trail.at(landing.entry.sequence, Some(landing.step.sequence));
        let run = self.persist(run, Vec::new(), trail)?;
        Ok(MoveResult {
            run,
            entry: landing.entry,
            step: landing.step,
            moved: true,
        })
    }

    /// Commits a mutated run at the next version.
    fn persist(
        &self,
        mut run: Run,
        entries: Vec<PlayEntry>,
        trail: &mut Trail,
    ) -> Result<Run, PlayerError> {
        let expected_version = run.version;
        run.version = expected_version.checked_add(1).ok_or_else(|| PlayerError::System {
            run_id: run.run_id.clone(),
            message: "run version overflow".to_string(),
        })?;
        let commit = RunCommit {
            run,
            expected_version,
            entries,
        };
        self.store
            .commit(&commit)
            .map_err(|err| PlayerError::save_failed(&commit.run.run_id, err))?;
        trail.settled(&commit.run);
        trail.outcome = AuditOutcome::Applied;
        Ok(commit.run)
    }
}

// ============================================================================
// SECTION: Internal Types
// ============================================================================

/// How a missing or dangling cursor is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorPolicy {
    /// Read operations: unset cursor means the run never started.
    Read,
    /// Navigation and recording on an open run.
    Move,
    /// Fused record-and-advance.
    Advance,
}

/// Resolved cursor context.
struct Located {
    /// Validated play list.
    list: PlayList,
    /// Entry under the cursor.
    entry: PlayEntry,
    /// Steps of the entry's test.
    steps: StepList,
    /// Step under the cursor.
    step: TestStep,
}

/// Audit details gathered while an operation runs.
#[derive(Debug)]
struct Trail {
    /// State when loaded.
    before: Option<RunState>,
    /// State when finished.
    after: Option<RunState>,
    /// Cursor entry sequence when finished.
    entry_sequence: Option<u32>,
    /// Cursor step when finished.
    step: Option<u32>,
    /// Success classification.
    outcome: AuditOutcome,
}

impl Default for Trail {
    fn default() -> Self {
        Self {
            before: None,
            after: None,
            entry_sequence: None,
            step: None,
            outcome: AuditOutcome::Unchanged,
        }
    }
}

impl Trail {
    /// Records the run state after a successful write.
    const fn settled(&mut self, run: &Run) {
        self.after = Some(run.state);
    }

    /// Records the cursor position reported to the caller.
    const fn at(&mut self, entry_sequence: u32, step: Option<u32>) {
        self.entry_sequence = Some(entry_sequence);
        self.step = step;
    }
}

// ============================================================================
// SECTION: Helper Functions
// ============================================================================

/// Rejects forward moves from an unjudged step.
fn ensure_terminated(run: &Run, entry: &PlayEntry, step: u32) -> Result<(), PlayerError> {
    if entry.is_step_terminated(step) {
        return Ok(());
    }
    Err(PlayerError::StepNotTerminated {
        run_id: run.run_id.clone(),
        sequence: entry.sequence,
        step,
    })
}

/// Builds the system error for a cursor naming a missing entry.
fn dangling(run_id: &RunId, cursor: &Cursor) -> PlayerError {
    PlayerError::System {
        run_id: run_id.clone(),
        message: format!("cursor references missing play entry {}", cursor.entry_id),
    }
}

/// Returns the entry as a commit payload when it changed.
fn changed(entry_changed: bool, entry: &PlayEntry) -> Vec<PlayEntry> {
    if entry_changed { vec![entry.clone()] } else { Vec::new() }
}
