// crates/run-player-core/src/runtime/mod.rs
// ============================================================================
// Module: Run Player Runtime
// Description: Run execution engine, pure state helpers, and in-memory adapters.
// Purpose: Execute run lifecycle, navigation, and outcome recording.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the run player: play-list construction, run
//! state transitions, cursor navigation, and outcome recording. The helpers
//! are pure; [`RunPlayer`] is the only place that loads, guards, persists,
//! and audits, so every transport must call through it.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod builder;
pub mod engine;
pub mod errors;
pub mod navigator;
pub mod recorder;
pub mod requests;
pub mod store;
pub mod transitions;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditChainError;
pub use audit::GENESIS_HASH;
pub use audit::JsonlAuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::verify_chain;
pub use engine::RunPlayer;
pub use engine::RunPlayerConfig;
pub use errors::PlayerError;
pub use navigator::Landing;
pub use requests::CloseRequest;
pub use requests::CreateRunRequest;
pub use requests::CreatedRun;
pub use requests::CurrentEntry;
pub use requests::CurrentStep;
pub use requests::CurrentTest;
pub use requests::CursorMove;
pub use requests::MoveDirection;
pub use requests::MoveResult;
pub use requests::MoveScope;
pub use requests::NavigateRequest;
pub use requests::NextRequest;
pub use requests::NextResult;
pub use requests::OutcomeRequest;
pub use requests::OutcomeResult;
pub use requests::PositionRequest;
pub use requests::RunRequest;
pub use requests::TransitionResult;
pub use requests::Verdict;
pub use store::InMemoryCatalog;
pub use store::InMemoryRunStore;
pub use store::StaticIdentity;
pub use store::StaticProjectSettings;
