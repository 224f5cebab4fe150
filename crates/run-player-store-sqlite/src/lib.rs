// crates/run-player-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Run Store
// Description: Durable RunStore and TestCatalog backend using SQLite WAL.
// Purpose: Provide production-grade persistence for runs and authored tests.
// Dependencies: run-player-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`RunStore`] implementation that
//! persists canonical run snapshots in a versioned history table, plus a
//! [`TestCatalog`] over the authored test sets stored in the same database.
//! Security posture: storage inputs are untrusted.
//!
//! [`RunStore`]: run_player_core::RunStore
//! [`TestCatalog`]: run_player_core::TestCatalog

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CatalogDocument;
pub use catalog::CatalogStep;
pub use catalog::CatalogTest;
pub use catalog::ImportSummary;
pub use store::MAX_SNAPSHOT_BYTES;
pub use store::RunSnapshot;
pub use store::RunSummary;
pub use store::RunVersionSummary;
pub use store::SqliteRunStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
