// crates/run-player-core/src/core/identifiers.rs
// ============================================================================
// Module: Run Player Identifiers
// Description: Canonical opaque identifiers for runs, play entries, and catalog entities.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout the run
//! player. Identifiers are opaque and serialize as numbers or strings on the
//! wire. Numeric identifiers enforce non-zero, 1-based invariants at
//! construction boundaries, matching the row identifiers handed out by the
//! authoring subsystem.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU64;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Numeric Identifiers
// ============================================================================

/// Declares a non-zero numeric identifier newtype.
macro_rules! numeric_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        ///
        /// # Invariants
        /// - Always >= 1 (non-zero, 1-based).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            #[doc = concat!("Creates a new ", $label, " identifier from a non-zero value.")]
            #[must_use]
            pub const fn new(id: NonZeroU64) -> Self {
                Self(id)
            }

            #[doc = concat!("Creates a ", $label, " identifier from a raw value (returns `None` if zero).")]
            #[must_use]
            pub fn from_raw(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map(Self)
            }

            /// Returns the raw identifier value (always >= 1).
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.get().fmt(f)
            }
        }
    };
}

numeric_identifier!(
    /// Project identifier owning runs and test sets.
    ProjectId,
    "project"
);

numeric_identifier!(
    /// Authenticated user identifier.
    UserId,
    "user"
);

numeric_identifier!(
    /// Test set identifier (the ordered collection a run is based on).
    TestSetId,
    "test set"
);

numeric_identifier!(
    /// Test identifier.
    TestId,
    "test"
);

numeric_identifier!(
    /// Test step identifier.
    TestStepId,
    "test step"
);

// ============================================================================
// SECTION: Opaque String Identifiers
// ============================================================================

/// Run identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Creates a new run identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RunId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Play entry identifier, unique across runs.
///
/// # Invariants
/// - Entries created by the play-list builder use the `<run>/<sequence>` form,
///   so the identifier alone pins the owning run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayEntryId(String);

impl PlayEntryId {
    /// Creates a new play entry identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the identifier for the entry at `sequence` within `run_id`.
    #[must_use]
    pub fn for_slot(run_id: &RunId, sequence: u32) -> Self {
        Self(format!("{}/{sequence:04}", run_id.as_str()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PlayEntryId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Outcome code recorded against steps, play entries, and runs.
///
/// # Invariants
/// - Codes are project-configured; the engine never interprets them beyond
///   equality with the configured pass/fail/incomplete defaults.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeCode(String);

impl OutcomeCode {
    /// Creates a new outcome code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for OutcomeCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OutcomeCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
