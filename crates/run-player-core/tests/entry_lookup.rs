// crates/run-player-core/tests/entry_lookup.rs
// ============================================================================
// Module: Play Entry Lookup Tests
// Description: Store-level lookups of single play entries.
// Purpose: Validate every lookup mode, including both play list boundaries.
// Dependencies: run-player-core
// ============================================================================
//! ## Overview
//! Creates the shared three-entry run and resolves entries by sequence, by
//! identifier, at either end, and relative to a sequence.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use run_player_core::EntryLookup;
use run_player_core::PlayEntryId;
use run_player_core::RunId;
use run_player_core::RunStore;

use crate::common::create;
use crate::common::player;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Returns the sequence found by `lookup`, if any.
fn found(store: &impl RunStore, run_id: &RunId, lookup: &EntryLookup) -> Option<u32> {
    store.find_play_entry(run_id, lookup).expect("lookup").map(|entry| entry.sequence)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Verifies exact lookups by sequence and identifier.
#[test]
fn lookup_by_sequence_and_id() {
    let player = player();
    let run_id = create(&player, "run-1").run.run_id;
    let store = player.store();

    assert_eq!(found(store, &run_id, &EntryLookup::Sequence(2)), Some(2));
    assert_eq!(found(store, &run_id, &EntryLookup::Sequence(4)), None);
    let id = PlayEntryId::for_slot(&run_id, 3);
    let entry = store.find_play_entry(&run_id, &EntryLookup::Id(id.clone())).unwrap().unwrap();
    assert_eq!(entry.entry_id, id);
    assert_eq!(entry.sequence, 3);
    let stranger = PlayEntryId::for_slot(&RunId::new("other"), 1);
    assert_eq!(found(store, &run_id, &EntryLookup::Id(stranger)), None);
}

/// Verifies first and last lookups.
#[test]
fn lookup_first_and_last() {
    let player = player();
    let run_id = create(&player, "run-1").run.run_id;
    let store = player.store();

    assert_eq!(found(store, &run_id, &EntryLookup::First), Some(1));
    assert_eq!(found(store, &run_id, &EntryLookup::Last), Some(3));
}

/// Verifies relative lookups and their boundaries.
#[test]
fn lookup_after_and_before() {
    let player = player();
    let run_id = create(&player, "run-1").run.run_id;
    let store = player.store();

    assert_eq!(found(store, &run_id, &EntryLookup::After(1)), Some(2));
    assert_eq!(found(store, &run_id, &EntryLookup::After(3)), None);
    assert_eq!(found(store, &run_id, &EntryLookup::Before(3)), Some(2));
    assert_eq!(found(store, &run_id, &EntryLookup::Before(1)), None);
}

/// Verifies lookups against an unknown run find nothing.
#[test]
fn lookup_on_unknown_run_is_empty() {
    let player = player();
    let missing = RunId::new("missing");

    assert_eq!(found(player.store(), &missing, &EntryLookup::First), None);
    assert_eq!(found(player.store(), &missing, &EntryLookup::Last), None);
}
