// crates/run-player-core/src/runtime/recorder.rs
// ============================================================================
// Module: Step Outcome Recorder
// Description: Applies outcome codes, statuses, and comments to play entries.
// Purpose: Keep outcome semantics pure so the engine only decides when to persist.
// Dependencies: crate::{core, runtime::requests}
// ============================================================================

//! ## Overview
//! Recording writes a [`StepResult`] for the current step, then rebuilds the
//! entry code from every step result: the project fail code when any step
//! failed, otherwise the code of the highest judged step. Each helper reports
//! whether it changed anything; unchanged entries are never persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::OutcomeCode;
use crate::core::PlayEntry;
use crate::core::ProjectDefaults;
use crate::core::StepResult;
use crate::runtime::requests::Verdict;

// ============================================================================
// SECTION: Recording
// ============================================================================

/// Returns the project default code for a verdict.
#[must_use]
pub fn default_code(verdict: Verdict, defaults: &ProjectDefaults) -> OutcomeCode {
    match verdict {
        Verdict::Pass => defaults.step_pass_code.clone(),
        Verdict::Fail => defaults.step_fail_code.clone(),
    }
}

/// Treats empty comments as absent.
#[must_use]
pub fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment.filter(|text| !text.is_empty())
}

/// Folds the entry's step results into one test code.
///
/// Returns `None` while no step is judged.
#[must_use]
pub fn entry_code(entry: &PlayEntry, defaults: &ProjectDefaults) -> Option<OutcomeCode> {
    if entry.step_results.iter().any(|result| result.code == defaults.step_fail_code) {
        return Some(defaults.step_fail_code.clone());
    }
    entry.step_results.iter().max_by_key(|result| result.step).map(|result| result.code.clone())
}

/// Records `code` against `step`. Returns true when the entry changed.
///
/// An absent or empty comment clears the entry's comment.
pub fn apply_outcome(
    entry: &mut PlayEntry,
    step: u32,
    code: OutcomeCode,
    comment: Option<String>,
    defaults: &ProjectDefaults,
) -> bool {
    let comment = normalize_comment(comment);
    let mut changed = entry.set_step_result(StepResult {
        step,
        code,
        comment: comment.clone(),
    });
    let folded = entry_code(entry, defaults);
    if entry.run_code != folded {
        entry.run_code = folded;
        changed = true;
    }
    if entry.comment != comment {
        entry.comment = comment;
        changed = true;
    }
    changed
}

/// Writes the whole-test outcome when the last step is left behind.
/// Returns true when the entry changed.
///
/// Status and comment are written only when supplied.
pub fn apply_completion(
    entry: &mut PlayEntry,
    status: Option<String>,
    code: OutcomeCode,
    comment: Option<String>,
) -> bool {
    let mut changed = false;
    if let Some(status) = status
        && entry.status.as_ref() != Some(&status)
    {
        entry.status = Some(status);
        changed = true;
    }
    if entry.run_code.as_ref() != Some(&code) {
        entry.run_code = Some(code);
        changed = true;
    }
    if let Some(comment) = normalize_comment(comment)
        && entry.comment.as_ref() != Some(&comment)
    {
        entry.comment = Some(comment);
        changed = true;
    }
    changed
}

/// Chooses the run code when the play list is exhausted: the fail code when
/// any entry failed, otherwise the pass code.
#[must_use]
pub fn completion_code<'a>(
    entries: impl IntoIterator<Item = &'a PlayEntry>,
    defaults: &ProjectDefaults,
) -> OutcomeCode {
    let failed = entries
        .into_iter()
        .any(|entry| entry.run_code.as_ref() == Some(&defaults.step_fail_code));
    if failed { defaults.step_fail_code.clone() } else { defaults.step_pass_code.clone() }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
