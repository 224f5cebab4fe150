// crates/run-player-core/src/runtime/builder.rs
// ============================================================================
// Module: Play-List Builder
// Description: Expands a test set into a run's ordered play entries.
// Purpose: Assign immutable, contiguous entry sequences at run creation.
// Dependencies: crate::{core, runtime::errors}
// ============================================================================

//! ## Overview
//! One [`PlayEntry`] is created per linked test, in link-sequence order, with
//! entry sequences `1..=n`. A test set without links cannot back a run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Cursor;
use crate::core::PlayEntry;
use crate::core::ProjectDefaults;
use crate::core::Run;
use crate::core::RunId;
use crate::core::RunState;
use crate::core::TestSet;
use crate::runtime::errors::PlayerError;
use crate::runtime::requests::CreateRunRequest;

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds the play list for `run_id` from the test set's links.
///
/// # Errors
///
/// Returns [`PlayerError::TestSetEmpty`] when the set has no linked tests.
pub fn build_play_list(run_id: &RunId, test_set: &TestSet) -> Result<Vec<PlayEntry>, PlayerError> {
    let links = test_set.ordered_links();
    if links.is_empty() {
        return Err(PlayerError::TestSetEmpty(test_set.test_set_id));
    }
    let mut entries = Vec::with_capacity(links.len());
    let mut sequence: u32 = 0;
    for link in links {
        sequence = sequence.checked_add(1).ok_or_else(|| PlayerError::System {
            run_id: run_id.clone(),
            message: "play list exceeds sequence range".to_string(),
        })?;
        entries.push(PlayEntry::new(run_id, sequence, link.test_id));
    }
    Ok(entries)
}

/// Builds a fresh run record for a creation request.
///
/// `initial_cursor` is used only when the project creates runs already open.
#[must_use]
pub fn new_run(
    request: &CreateRunRequest,
    defaults: &ProjectDefaults,
    initial_cursor: Option<Cursor>,
) -> Run {
    let state = defaults.run_create_state;
    Run {
        run_id: request.run_id.clone(),
        project_id: request.project_id,
        test_set_id: request.test_set_id,
        owner: request.owner,
        state,
        cursor: if state == RunState::Open { initial_cursor } else { None },
        run_code: defaults.run_create_code.clone(),
        comment: request.comment.clone(),
        version: 1,
    }
}
