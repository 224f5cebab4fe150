// crates/run-player-config/src/lib.rs
// ============================================================================
// Module: Run Player Config Library
// Description: Canonical config model, loading guards, and validation.
// Purpose: Single source of truth for run-player.toml semantics.
// Dependencies: run-player-core, run-player-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `run-player-config` defines the configuration model for the run player.
//! It provides strict, fail-closed loading and validation, and converts the
//! validated model into store configuration and project settings.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
