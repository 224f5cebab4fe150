// crates/run-player-core/src/core/catalog.rs
// ============================================================================
// Module: Test Catalog Model
// Description: Read-only test sets, tests, and test steps.
// Purpose: Describe the authored structures a run is built from and walks.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! Catalog records are authored elsewhere and are read-only to the run
//! player. Test-set links and test steps each carry a `sequence` that defines
//! their order; the run player sorts by it and never renumbers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ProjectId;
use crate::core::identifiers::TestId;
use crate::core::identifiers::TestSetId;
use crate::core::identifiers::TestStepId;

// ============================================================================
// SECTION: Test Sets
// ============================================================================

/// Link from a test set to one of its tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestLink {
    /// Linked test.
    pub test_id: TestId,
    /// Position of the test within the set.
    pub sequence: u32,
}

/// Ordered collection of tests a run can be based on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSet {
    /// Test set identifier.
    pub test_set_id: TestSetId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Display name.
    pub name: String,
    /// Test links, in any order.
    #[serde(default)]
    pub links: Vec<TestLink>,
}

impl TestSet {
    /// Returns the links sorted by their sequence.
    #[must_use]
    pub fn ordered_links(&self) -> Vec<&TestLink> {
        let mut links: Vec<&TestLink> = self.links.iter().collect();
        links.sort_by_key(|link| link.sequence);
        links
    }
}

// ============================================================================
// SECTION: Tests and Steps
// ============================================================================

/// Authored test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Test identifier.
    pub test_id: TestId,
    /// Display name.
    pub name: String,
}

/// One ordered instruction within a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    /// Step identifier.
    pub step_id: TestStepId,
    /// Owning test.
    pub test_id: TestId,
    /// Position within the test; unique per test.
    pub sequence: u32,
    /// Instruction text.
    pub instruction: String,
}
