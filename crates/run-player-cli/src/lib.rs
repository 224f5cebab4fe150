// crates/run-player-cli/src/lib.rs
// ============================================================================
// Module: Run Player CLI Library
// Description: Shared helpers for the run player command-line interface.
// Purpose: Provide reusable components (message catalog) for the CLI binary and tests.
// Dependencies: Standard library.
// ============================================================================

//! ## Overview
//! This library module houses the CLI message catalog. The binary entry point
//! (`src/main.rs`) imports it to keep all user-facing output consistent.
//!
//! Security posture: CLI inputs are untrusted and must be validated.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Message catalog and formatting helpers.
pub mod i18n;
