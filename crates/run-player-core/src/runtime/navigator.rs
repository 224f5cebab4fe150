// crates/run-player-core/src/runtime/navigator.rs
// ============================================================================
// Module: Play Cursor Navigator
// Description: Pure cursor arithmetic over a play list and its tests' steps.
// Purpose: Compute where a movement lands without loading or persisting anything.
// Dependencies: crate::{core, runtime::{errors, requests}}
// ============================================================================

//! ## Overview
//! [`resolve_move`] maps a [`CursorMove`] to the entry and step it lands on.
//! It returns `None` when the movement would leave the play list; callers
//! treat that as a no-op. Steps of other entries are fetched through the
//! supplied loader so run-wide moves can cross test boundaries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Cursor;
use crate::core::PlayEntry;
use crate::core::PlayList;
use crate::core::StepList;
use crate::core::TestStep;
use crate::runtime::errors::PlayerError;
use crate::runtime::requests::CursorMove;
use crate::runtime::requests::MoveDirection;
use crate::runtime::requests::MoveScope;

// ============================================================================
// SECTION: Landing
// ============================================================================

/// Entry and step a movement lands on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landing {
    /// Target entry.
    pub entry: PlayEntry,
    /// Target step.
    pub step: TestStep,
}

impl Landing {
    /// Returns the cursor pointing at this landing.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.entry.entry_id.clone(), self.step.sequence)
    }
}

/// Current position the navigator moves from.
#[derive(Debug, Clone, Copy)]
pub struct Origin<'a> {
    /// Run play list.
    pub list: &'a PlayList,
    /// Entry under the cursor.
    pub entry: &'a PlayEntry,
    /// Steps of the entry's test.
    pub steps: &'a StepList,
    /// Current step sequence.
    pub step: u32,
}

// ============================================================================
// SECTION: Movement
// ============================================================================

/// Resolves where `movement` lands from `origin`.
///
/// # Errors
///
/// Returns [`PlayerError::EmptyTest`] when a target test has no steps, or any
/// error produced by `steps_for`.
pub fn resolve_move<F>(
    origin: Origin<'_>,
    movement: CursorMove,
    mut steps_for: F,
) -> Result<Option<Landing>, PlayerError>
where
    F: FnMut(&PlayEntry) -> Result<StepList, PlayerError>,
{
    let Origin {
        list,
        entry,
        steps,
        step,
    } = origin;
    match (movement.scope, movement.direction) {
        (MoveScope::TestStep, direction) => {
            let target = match direction {
                MoveDirection::First => Some(first_step(entry, steps)?),
                MoveDirection::Last => Some(last_step(entry, steps)?),
                MoveDirection::Next => steps.next_after(step),
                MoveDirection::Previous => steps.previous_before(step),
            };
            Ok(target.map(|target| land(entry, target)))
        }
        (MoveScope::Test, direction) => {
            let target = match direction {
                MoveDirection::First => list.first(),
                MoveDirection::Last => list.last(),
                MoveDirection::Next => list.next_after(entry.sequence),
                MoveDirection::Previous => list.previous_before(entry.sequence),
            };
            target.map(|target| land_first(target, &mut steps_for)).transpose()
        }
        (MoveScope::Run, MoveDirection::First) => {
            list.first().map(|target| land_first(target, &mut steps_for)).transpose()
        }
        (MoveScope::Run, MoveDirection::Last) => {
            list.last().map(|target| land_last(target, &mut steps_for)).transpose()
        }
        (MoveScope::Run, MoveDirection::Next) => {
            if let Some(target) = steps.next_after(step) {
                return Ok(Some(land(entry, target)));
            }
            list.next_after(entry.sequence)
                .map(|target| land_first(target, &mut steps_for))
                .transpose()
        }
        (MoveScope::Run, MoveDirection::Previous) => {
            if let Some(target) = steps.previous_before(step) {
                return Ok(Some(land(entry, target)));
            }
            list.previous_before(entry.sequence)
                .map(|target| land_last(target, &mut steps_for))
                .transpose()
        }
    }
}

/// Returns the first step of an entry's test, landing on it.
///
/// # Errors
///
/// Returns [`PlayerError::EmptyTest`] when the test has no steps.
pub fn land_first<F>(entry: &PlayEntry, steps_for: &mut F) -> Result<Landing, PlayerError>
where
    F: FnMut(&PlayEntry) -> Result<StepList, PlayerError>,
{
    let steps = steps_for(entry)?;
    Ok(land(entry, first_step(entry, &steps)?))
}

/// Lands on the last step of an entry's test.
fn land_last<F>(entry: &PlayEntry, steps_for: &mut F) -> Result<Landing, PlayerError>
where
    F: FnMut(&PlayEntry) -> Result<StepList, PlayerError>,
{
    let steps = steps_for(entry)?;
    Ok(land(entry, last_step(entry, &steps)?))
}

/// Returns the first step, or `EmptyTest` for a test without steps.
fn first_step<'a>(entry: &PlayEntry, steps: &'a StepList) -> Result<&'a TestStep, PlayerError> {
    steps.first().ok_or(PlayerError::EmptyTest(entry.test_id))
}

/// Returns the last step, or `EmptyTest` for a test without steps.
fn last_step<'a>(entry: &PlayEntry, steps: &'a StepList) -> Result<&'a TestStep, PlayerError> {
    steps.last().ok_or(PlayerError::EmptyTest(entry.test_id))
}

/// Pairs an entry with the step the cursor lands on.
fn land(entry: &PlayEntry, step: &TestStep) -> Landing {
    Landing {
        entry: entry.clone(),
        step: step.clone(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
