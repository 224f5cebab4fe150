// crates/run-player-store-sqlite/src/catalog.rs
// ============================================================================
// Module: SQLite Test Catalog
// Description: TestCatalog reads and bulk catalog import over the run store database.
// Purpose: Serve authored test sets, tests, and steps from the same SQLite file as runs.
// Dependencies: run-player-core, rusqlite, serde
// ============================================================================

//! ## Overview
//! Test sets, tests, and steps live in plain relational tables next to the
//! run snapshots. They are written only by [`SqliteRunStore::import_catalog`],
//! which replaces each imported record wholesale inside one transaction.
//! Steps are validated with [`StepList`] before they reach the database, so
//! duplicate step sequences are rejected up front.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use run_player_core::CatalogError;
use run_player_core::ProjectId;
use run_player_core::StepList;
use run_player_core::TestCase;
use run_player_core::TestCatalog;
use run_player_core::TestId;
use run_player_core::TestLink;
use run_player_core::TestSet;
use run_player_core::TestSetId;
use run_player_core::TestStep;
use run_player_core::TestStepId;
use serde::Deserialize;
use serde::Serialize;

use crate::store::SqliteRunStore;
use crate::store::SqliteStoreError;
use crate::store::db_error;
use crate::store::parse_id;
use crate::store::parse_sequence;
use crate::store::sql_int;

// ============================================================================
// SECTION: Import Document
// ============================================================================

/// Step as written in a catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStep {
    /// Step identifier.
    pub step_id: TestStepId,
    /// 1-based order within the test.
    pub sequence: u32,
    /// Tester-facing instruction.
    #[serde(default)]
    pub instruction: String,
}

/// Test with its steps as written in a catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTest {
    /// Test identifier.
    pub test_id: TestId,
    /// Display name.
    pub name: String,
    /// Ordered steps.
    #[serde(default)]
    pub steps: Vec<CatalogStep>,
}

/// Catalog import document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Tests to upsert, each replacing its stored steps.
    #[serde(default)]
    pub tests: Vec<CatalogTest>,
    /// Test sets to upsert, each replacing its stored links.
    #[serde(default)]
    pub test_sets: Vec<TestSet>,
}

/// Counts of records written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Tests written.
    pub tests: usize,
    /// Steps written.
    pub steps: usize,
    /// Test sets written.
    pub test_sets: usize,
    /// Links written.
    pub links: usize,
}

impl CatalogTest {
    /// Converts the document form into catalog records.
    fn to_records(&self) -> Result<(TestCase, StepList), SqliteStoreError> {
        let steps = self
            .steps
            .iter()
            .map(|step| TestStep {
                step_id: step.step_id,
                test_id: self.test_id,
                sequence: step.sequence,
                instruction: step.instruction.clone(),
            })
            .collect();
        let steps = StepList::new(self.test_id, steps)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        Ok((
            TestCase {
                test_id: self.test_id,
                name: self.name.clone(),
            },
            steps,
        ))
    }
}

// ============================================================================
// SECTION: Import
// ============================================================================

impl SqliteRunStore {
    /// Imports tests and test sets in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when a test has inconsistent
    /// steps or a link names an unknown test, or another
    /// [`SqliteStoreError`] when writing fails. Nothing is written on error.
    pub fn import_catalog(
        &self,
        document: &CatalogDocument,
    ) -> Result<ImportSummary, SqliteStoreError> {
        let records = document
            .tests
            .iter()
            .map(CatalogTest::to_records)
            .collect::<Result<Vec<_>, _>>()?;
        let mut summary = ImportSummary::default();
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(db_error)?;
        for (test, steps) in &records {
            let test_id = sql_int(test.test_id.get())?;
            tx.execute(
                "INSERT INTO tests (test_id, name) VALUES (?1, ?2)
                 ON CONFLICT(test_id) DO UPDATE SET name = excluded.name",
                params![test_id, test.name],
            )
            .map_err(db_error)?;
            tx.execute("DELETE FROM test_steps WHERE test_id = ?1", params![test_id])
                .map_err(db_error)?;
            for step in steps.steps() {
                tx.execute(
                    "INSERT INTO test_steps (step_id, test_id, sequence, instruction)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        sql_int(step.step_id.get())?,
                        test_id,
                        step.sequence,
                        step.instruction
                    ],
                )
                .map_err(db_error)?;
                summary.steps += 1;
            }
            summary.tests += 1;
        }
        for test_set in &document.test_sets {
            let mut sequences = BTreeSet::new();
            for link in &test_set.links {
                if !sequences.insert(link.sequence) {
                    return Err(SqliteStoreError::Invalid(format!(
                        "test set {} repeats link sequence {}",
                        test_set.test_set_id, link.sequence
                    )));
                }
                if !test_exists(&tx, link.test_id)? {
                    return Err(SqliteStoreError::Invalid(format!(
                        "test set {} links unknown test {}",
                        test_set.test_set_id, link.test_id
                    )));
                }
            }
            let test_set_id = sql_int(test_set.test_set_id.get())?;
            tx.execute(
                "INSERT INTO test_sets (test_set_id, project_id, name) VALUES (?1, ?2, ?3)
                 ON CONFLICT(test_set_id) DO UPDATE SET project_id = excluded.project_id,
                     name = excluded.name",
                params![test_set_id, sql_int(test_set.project_id.get())?, test_set.name],
            )
            .map_err(db_error)?;
            tx.execute("DELETE FROM test_set_links WHERE test_set_id = ?1", params![test_set_id])
                .map_err(db_error)?;
            for link in &test_set.links {
                tx.execute(
                    "INSERT INTO test_set_links (test_set_id, test_id, sequence)
                     VALUES (?1, ?2, ?3)",
                    params![test_set_id, sql_int(link.test_id.get())?, link.sequence],
                )
                .map_err(db_error)?;
                summary.links += 1;
            }
            summary.test_sets += 1;
        }
        tx.commit().map_err(db_error)?;
        drop(guard);
        Ok(summary)
    }
}

/// Returns true when the test row exists.
fn test_exists(connection: &Connection, test_id: TestId) -> Result<bool, SqliteStoreError> {
    let found: Option<i64> = connection
        .query_row(
            "SELECT 1 FROM tests WHERE test_id = ?1",
            params![sql_int(test_id.get())?],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_error)?;
    Ok(found.is_some())
}

// ============================================================================
// SECTION: Catalog Reads
// ============================================================================

impl SqliteRunStore {
    /// Loads a test set row and its links.
    fn read_test_set(&self, test_set_id: TestSetId) -> Result<Option<TestSet>, SqliteStoreError> {
        let key = sql_int(test_set_id.get())?;
        let guard = self.lock()?;
        let row: Option<(i64, String)> = guard
            .query_row(
                "SELECT project_id, name FROM test_sets WHERE test_set_id = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(db_error)?;
        let Some((project_id, name)) = row else {
            return Ok(None);
        };
        let mut stmt = guard
            .prepare(
                "SELECT test_id, sequence FROM test_set_links WHERE test_set_id = ?1
                 ORDER BY sequence ASC",
            )
            .map_err(db_error)?;
        let rows = stmt
            .query_map(params![key], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))
            .map_err(db_error)?;
        let mut links = Vec::new();
        for row in rows {
            let (test_id, sequence) = row.map_err(db_error)?;
            links.push(TestLink {
                test_id: parse_id(test_id, TestId::from_raw, "test_id")?,
                sequence: parse_sequence(sequence, "link sequence")?,
            });
        }
        Ok(Some(TestSet {
            test_set_id,
            project_id: parse_id(project_id, ProjectId::from_raw, "project_id")?,
            name,
            links,
        }))
    }

    /// Loads a test row.
    fn read_test(&self, test_id: TestId) -> Result<Option<TestCase>, SqliteStoreError> {
        let guard = self.lock()?;
        let name: Option<String> = guard
            .query_row(
                "SELECT name FROM tests WHERE test_id = ?1",
                params![sql_int(test_id.get())?],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;
        Ok(name.map(|name| TestCase {
            test_id,
            name,
        }))
    }

    /// Loads the steps of a test ordered by sequence.
    fn read_steps(&self, test_id: TestId) -> Result<Vec<TestStep>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT step_id, sequence, instruction FROM test_steps WHERE test_id = ?1
                 ORDER BY sequence ASC",
            )
            .map_err(db_error)?;
        let rows = stmt
            .query_map(params![sql_int(test_id.get())?], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
            })
            .map_err(db_error)?;
        let mut steps = Vec::new();
        for row in rows {
            let (step_id, sequence, instruction) = row.map_err(db_error)?;
            steps.push(TestStep {
                step_id: parse_id(step_id, TestStepId::from_raw, "step_id")?,
                test_id,
                sequence: parse_sequence(sequence, "step sequence")?,
                instruction,
            });
        }
        Ok(steps)
    }
}

impl TestCatalog for SqliteRunStore {
    fn load_test_set(&self, test_set_id: TestSetId) -> Result<Option<TestSet>, CatalogError> {
        self.read_test_set(test_set_id).map_err(CatalogError::from)
    }

    fn load_test(&self, test_id: TestId) -> Result<Option<TestCase>, CatalogError> {
        self.read_test(test_id).map_err(CatalogError::from)
    }

    fn load_steps(&self, test_id: TestId) -> Result<Vec<TestStep>, CatalogError> {
        self.read_steps(test_id).map_err(CatalogError::from)
    }
}
