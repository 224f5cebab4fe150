// crates/run-player-core/src/core/mod.rs
// ============================================================================
// Module: Run Player Core Model
// Description: Identifiers, run aggregate, catalog records, and audit events.
// Purpose: Group the backend-agnostic data model consumed by the runtime.
// Dependencies: serde, serde_jcs, sha2, thiserror
// ============================================================================

//! ## Overview
//! Model types are plain serializable data. Behavior that touches storage
//! lives in [`crate::runtime`].

pub mod audit;
pub mod catalog;
pub mod hashing;
pub mod identifiers;
pub mod play_list;
pub mod run;
pub mod settings;
pub mod time;

pub use audit::AuditOutcome;
pub use audit::PlayerAction;
pub use audit::RunAuditEvent;
pub use catalog::TestCase;
pub use catalog::TestLink;
pub use catalog::TestSet;
pub use catalog::TestStep;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use identifiers::OutcomeCode;
pub use identifiers::PlayEntryId;
pub use identifiers::ProjectId;
pub use identifiers::RunId;
pub use identifiers::TestId;
pub use identifiers::TestSetId;
pub use identifiers::TestStepId;
pub use identifiers::UserId;
pub use play_list::PlayList;
pub use play_list::PlayListError;
pub use play_list::StepList;
pub use run::Cursor;
pub use run::PlayEntry;
pub use run::Run;
pub use run::RunState;
pub use run::StepResult;
pub use settings::ProjectDefaults;
pub use time::Clock;
pub use time::LogicalClock;
pub use time::SystemClock;
pub use time::Timestamp;
