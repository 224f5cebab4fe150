// crates/run-player-core/src/runtime/store.rs
// ============================================================================
// Module: Run Player In-Memory Adapters
// Description: In-memory run store, catalog, settings, and identity.
// Purpose: Provide deterministic collaborators for tests and local demos.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! These adapters implement the engine interfaces without external
//! dependencies. The run store enforces the same optimistic version check as
//! durable stores. They are not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::PlayEntry;
use crate::core::ProjectDefaults;
use crate::core::ProjectId;
use crate::core::Run;
use crate::core::RunId;
use crate::core::TestCase;
use crate::core::TestId;
use crate::core::TestSet;
use crate::core::TestSetId;
use crate::core::TestStep;
use crate::core::UserId;
use crate::interfaces::CatalogError;
use crate::interfaces::IdentityContext;
use crate::interfaces::ProjectSettings;
use crate::interfaces::RunCommit;
use crate::interfaces::RunStore;
use crate::interfaces::SettingsError;
use crate::interfaces::StoreError;
use crate::interfaces::TestCatalog;

// ============================================================================
// SECTION: Run Store
// ============================================================================

/// Stored run with its entries keyed by sequence.
#[derive(Debug, Clone)]
struct StoredRun {
    /// Latest run record.
    run: Run,
    /// Entries keyed by sequence.
    entries: BTreeMap<u32, PlayEntry>,
}

/// In-memory run store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRunStore {
    /// Runs keyed by run identifier.
    runs: Arc<Mutex<BTreeMap<RunId, StoredRun>>>,
}

impl InMemoryRunStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runs: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Removes one entry from a run; used to simulate corrupted play lists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store lock is poisoned.
    pub fn remove_entry(&self, run_id: &RunId, sequence: u32) -> Result<bool, StoreError> {
        let mut guard = self.lock()?;
        Ok(guard.get_mut(run_id).is_some_and(|stored| stored.entries.remove(&sequence).is_some()))
    }

    /// Locks the run map.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<RunId, StoredRun>>, StoreError> {
        self.runs.lock().map_err(|_| StoreError::Store("run store mutex poisoned".to_string()))
    }
}

impl RunStore for InMemoryRunStore {
    fn load_run(&self, run_id: &RunId) -> Result<Option<Run>, StoreError> {
        Ok(self.lock()?.get(run_id).map(|stored| stored.run.clone()))
    }

    fn load_play_list(&self, run_id: &RunId) -> Result<Vec<PlayEntry>, StoreError> {
        Ok(self
            .lock()?
            .get(run_id)
            .map(|stored| stored.entries.values().cloned().collect())
            .unwrap_or_default())
    }

    fn insert_run(&self, run: &Run, entries: &[PlayEntry]) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&run.run_id) {
            return Err(StoreError::AlreadyExists(run.run_id.clone()));
        }
        let entries = entries.iter().map(|entry| (entry.sequence, entry.clone())).collect();
        guard.insert(
            run.run_id.clone(),
            StoredRun {
                run: run.clone(),
                entries,
            },
        );
        Ok(())
    }

    fn commit(&self, commit: &RunCommit) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let run_id = &commit.run.run_id;
        let stored = guard
            .get_mut(run_id)
            .ok_or_else(|| StoreError::Invalid(format!("run {run_id} does not exist")))?;
        if stored.run.version != commit.expected_version {
            return Err(StoreError::Conflict {
                run_id: run_id.clone(),
                expected: commit.expected_version,
                actual: stored.run.version,
            });
        }
        for entry in &commit.entries {
            let existing = stored.entries.get(&entry.sequence);
            if existing.is_none_or(|existing| existing.entry_id != entry.entry_id) {
                return Err(StoreError::Invalid(format!(
                    "play entry {} is not part of run {run_id}",
                    entry.entry_id
                )));
            }
        }
        for entry in &commit.entries {
            stored.entries.insert(entry.sequence, entry.clone());
        }
        stored.run = commit.run.clone();
        Ok(())
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Catalog contents keyed by identifier.
#[derive(Debug, Default)]
struct CatalogData {
    /// Test sets.
    test_sets: BTreeMap<TestSetId, TestSet>,
    /// Tests.
    tests: BTreeMap<TestId, TestCase>,
    /// Steps grouped by test.
    steps: BTreeMap<TestId, Vec<TestStep>>,
}

/// In-memory test catalog.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    /// Catalog contents.
    data: Arc<Mutex<CatalogData>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a test set.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog lock is poisoned.
    pub fn insert_test_set(&self, test_set: TestSet) -> Result<(), CatalogError> {
        self.lock()?.test_sets.insert(test_set.test_set_id, test_set);
        Ok(())
    }

    /// Adds or replaces a test and its steps.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog lock is poisoned.
    pub fn insert_test(&self, test: TestCase, steps: Vec<TestStep>) -> Result<(), CatalogError> {
        let mut guard = self.lock()?;
        guard.steps.insert(test.test_id, steps);
        guard.tests.insert(test.test_id, test);
        Ok(())
    }

    /// Locks the catalog contents.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, CatalogData>, CatalogError> {
        self.data.lock().map_err(|_| CatalogError::Io("catalog mutex poisoned".to_string()))
    }
}

impl TestCatalog for InMemoryCatalog {
    fn load_test_set(&self, test_set_id: TestSetId) -> Result<Option<TestSet>, CatalogError> {
        Ok(self.lock()?.test_sets.get(&test_set_id).cloned())
    }

    fn load_test(&self, test_id: TestId) -> Result<Option<TestCase>, CatalogError> {
        Ok(self.lock()?.tests.get(&test_id).cloned())
    }

    fn load_steps(&self, test_id: TestId) -> Result<Vec<TestStep>, CatalogError> {
        Ok(self.lock()?.steps.get(&test_id).cloned().unwrap_or_default())
    }
}

// ============================================================================
// SECTION: Settings and Identity
// ============================================================================

/// Project settings with one default and optional per-project overrides.
#[derive(Debug, Clone, Default)]
pub struct StaticProjectSettings {
    /// Defaults for projects without an override.
    fallback: ProjectDefaults,
    /// Per-project overrides.
    overrides: BTreeMap<ProjectId, ProjectDefaults>,
}

impl StaticProjectSettings {
    /// Creates settings that return `fallback` for every project.
    #[must_use]
    pub const fn new(fallback: ProjectDefaults) -> Self {
        Self {
            fallback,
            overrides: BTreeMap::new(),
        }
    }

    /// Adds a per-project override.
    #[must_use]
    pub fn with_project(mut self, project_id: ProjectId, defaults: ProjectDefaults) -> Self {
        self.overrides.insert(project_id, defaults);
        self
    }
}

impl ProjectSettings for StaticProjectSettings {
    fn defaults(&self, project_id: ProjectId) -> Result<ProjectDefaults, SettingsError> {
        Ok(self.overrides.get(&project_id).unwrap_or(&self.fallback).clone())
    }
}

/// Identity fixed to one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticIdentity(pub UserId);

impl IdentityContext for StaticIdentity {
    fn current_user_id(&self) -> UserId {
        self.0
    }
}
