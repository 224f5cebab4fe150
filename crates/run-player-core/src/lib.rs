// crates/run-player-core/src/lib.rs
// ============================================================================
// Module: Run Player Core Library
// Description: Public API surface for the run player core.
// Purpose: Expose core types, interfaces, and the run execution engine.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Run player core turns an authored test set into a run: an ordered play
//! list plus a cursor that a tester drives through every step, recording a
//! verdict as they go. It is backend-agnostic; persistence, catalog access,
//! project defaults, and auditing plug in through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::CatalogError;
pub use interfaces::EntryLookup;
pub use interfaces::IdentityContext;
pub use interfaces::ProjectSettings;
pub use interfaces::RunAuditSink;
pub use interfaces::RunCommit;
pub use interfaces::RunStore;
pub use interfaces::SettingsError;
pub use interfaces::StoreError;
pub use interfaces::TestCatalog;
pub use runtime::CloseRequest;
pub use runtime::CreateRunRequest;
pub use runtime::CreatedRun;
pub use runtime::CurrentEntry;
pub use runtime::CurrentStep;
pub use runtime::CurrentTest;
pub use runtime::CursorMove;
pub use runtime::InMemoryCatalog;
pub use runtime::InMemoryRunStore;
pub use runtime::JsonlAuditSink;
pub use runtime::MemoryAuditSink;
pub use runtime::MoveDirection;
pub use runtime::MoveResult;
pub use runtime::MoveScope;
pub use runtime::NavigateRequest;
pub use runtime::NextRequest;
pub use runtime::NextResult;
pub use runtime::NoopAuditSink;
pub use runtime::OutcomeRequest;
pub use runtime::OutcomeResult;
pub use runtime::PlayerError;
pub use runtime::PositionRequest;
pub use runtime::RunPlayer;
pub use runtime::RunPlayerConfig;
pub use runtime::RunRequest;
pub use runtime::StaticIdentity;
pub use runtime::StaticProjectSettings;
pub use runtime::TransitionResult;
pub use runtime::Verdict;
