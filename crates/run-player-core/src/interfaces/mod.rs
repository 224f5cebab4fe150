// crates/run-player-core/src/interfaces/mod.rs
// ============================================================================
// Module: Run Player Interfaces
// Description: Backend-agnostic contracts for storage, catalog, settings, identity, and audit.
// Purpose: Define the seams the run engine depends on.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The engine reaches every external collaborator through the traits in this
//! module. Implementations must fail closed: a missing or unreadable record is
//! reported as an error or `None`, never silently replaced.
//!
//! Security posture: store contents are untrusted on load; implementations
//! verify integrity before handing records to the engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::PlayEntry;
use crate::core::PlayEntryId;
use crate::core::ProjectDefaults;
use crate::core::ProjectId;
use crate::core::Run;
use crate::core::RunAuditEvent;
use crate::core::RunId;
use crate::core::TestCase;
use crate::core::TestId;
use crate::core::TestSet;
use crate::core::TestSetId;
use crate::core::TestStep;
use crate::core::UserId;

// ============================================================================
// SECTION: Run Store
// ============================================================================

/// Run store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("run store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("run store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("run store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("run store invalid data: {0}")]
    Invalid(String),
    /// Optimistic concurrency check failed.
    #[error("run {run_id} was modified concurrently (expected version {expected}, found {actual})")]
    Conflict {
        /// Run being committed.
        run_id: RunId,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },
    /// Run identifier already exists.
    #[error("run {0} already exists")]
    AlreadyExists(RunId),
    /// Store reported an error.
    #[error("run store error: {0}")]
    Store(String),
}

/// Play entry lookup modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryLookup {
    /// Entry with the exact sequence.
    Sequence(u32),
    /// Entry with the identifier.
    Id(PlayEntryId),
    /// Lowest sequence.
    First,
    /// Highest sequence.
    Last,
    /// Entry immediately after the sequence.
    After(u32),
    /// Entry immediately before the sequence.
    Before(u32),
}

/// Atomic write of a run and some of its entries.
///
/// # Invariants
/// - `run.version == expected_version + 1`.
/// - Every entry in `entries` already exists for `run.run_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCommit {
    /// New run state.
    pub run: Run,
    /// Version the writer loaded.
    pub expected_version: u64,
    /// Entries to overwrite.
    pub entries: Vec<PlayEntry>,
}

/// Persistence for runs and their play lists.
pub trait RunStore {
    /// Loads a run by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_run(&self, run_id: &RunId) -> Result<Option<Run>, StoreError>;

    /// Loads every play entry of a run, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_play_list(&self, run_id: &RunId) -> Result<Vec<PlayEntry>, StoreError>;

    /// Finds one play entry of a run.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn find_play_entry(
        &self,
        run_id: &RunId,
        lookup: &EntryLookup,
    ) -> Result<Option<PlayEntry>, StoreError> {
        let mut entries = self.load_play_list(run_id)?;
        entries.sort_by_key(|entry| entry.sequence);
        let found = match lookup {
            EntryLookup::Sequence(sequence) => {
                entries.into_iter().find(|entry| entry.sequence == *sequence)
            }
            EntryLookup::Id(entry_id) => {
                entries.into_iter().find(|entry| entry.entry_id == *entry_id)
            }
            EntryLookup::First => entries.into_iter().next(),
            EntryLookup::Last => entries.pop(),
            EntryLookup::After(sequence) => {
                entries.into_iter().find(|entry| entry.sequence > *sequence)
            }
            EntryLookup::Before(sequence) => {
                entries.into_iter().rev().find(|entry| entry.sequence < *sequence)
            }
        };
        Ok(found)
    }

    /// Inserts a new run with its full play list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] when the run identifier is taken,
    /// or another [`StoreError`] when saving fails.
    fn insert_run(&self, run: &Run, entries: &[PlayEntry]) -> Result<(), StoreError>;

    /// Atomically writes a run and the listed entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the stored version is not
    /// `expected_version`, or another [`StoreError`] when saving fails.
    fn commit(&self, commit: &RunCommit) -> Result<(), StoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Test Catalog
// ============================================================================

/// Catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog I/O error.
    #[error("test catalog io error: {0}")]
    Io(String),
    /// Catalog data is invalid.
    #[error("test catalog invalid data: {0}")]
    Invalid(String),
}

/// Read-only access to authored test sets, tests, and steps.
pub trait TestCatalog {
    /// Loads a test set with its links.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when loading fails.
    fn load_test_set(&self, test_set_id: TestSetId) -> Result<Option<TestSet>, CatalogError>;

    /// Loads a test.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when loading fails.
    fn load_test(&self, test_id: TestId) -> Result<Option<TestCase>, CatalogError>;

    /// Loads every step of a test, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when loading fails.
    fn load_steps(&self, test_id: TestId) -> Result<Vec<TestStep>, CatalogError>;

    /// Finds the step with `sequence` in a test.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when loading fails.
    fn find_step(&self, test_id: TestId, sequence: u32) -> Result<Option<TestStep>, CatalogError> {
        Ok(self.load_steps(test_id)?.into_iter().find(|step| step.sequence == sequence))
    }
}

// ============================================================================
// SECTION: Project Settings
// ============================================================================

/// Settings errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// No settings exist for the project.
    #[error("no settings for project {0}")]
    UnknownProject(ProjectId),
    /// Settings are invalid.
    #[error("project settings invalid: {0}")]
    Invalid(String),
}

/// Project-level defaults lookup.
pub trait ProjectSettings {
    /// Returns the defaults for a project.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the project has no usable settings.
    fn defaults(&self, project_id: ProjectId) -> Result<ProjectDefaults, SettingsError>;
}

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Authenticated caller identity.
pub trait IdentityContext {
    /// Returns the acting user.
    fn current_user_id(&self) -> UserId;
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink for engine operations.
pub trait RunAuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &RunAuditEvent);
}
