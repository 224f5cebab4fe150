// crates/run-player-core/src/core/settings.rs
// ============================================================================
// Module: Project Defaults
// Description: Project-configured outcome codes and initial run state.
// Purpose: Keep pass, fail, and incomplete codes out of the engine.
// Dependencies: crate::core::{identifiers, run}, serde
// ============================================================================

//! ## Overview
//! Every project configures the codes the engine writes when callers omit
//! one. The engine compares codes only for equality against these values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::OutcomeCode;
use crate::core::run::RunState;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Project-level defaults consulted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDefaults {
    /// Code recorded by a pass without an explicit code.
    pub step_pass_code: OutcomeCode,
    /// Code recorded by a fail without an explicit code.
    pub step_fail_code: OutcomeCode,
    /// Code written when a run is closed without an explicit code.
    pub run_incomplete_code: OutcomeCode,
    /// State a newly created run starts in.
    pub run_create_state: RunState,
    /// Code a newly created run starts with.
    pub run_create_code: Option<OutcomeCode>,
}

impl Default for ProjectDefaults {
    fn default() -> Self {
        Self {
            step_pass_code: OutcomeCode::new("PASS"),
            step_fail_code: OutcomeCode::new("FAIL"),
            run_incomplete_code: OutcomeCode::new("INCOMPLETE"),
            run_create_state: RunState::NotStarted,
            run_create_code: None,
        }
    }
}
