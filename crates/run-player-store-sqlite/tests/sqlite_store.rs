// crates/run-player-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Run Store Tests
// Description: Integrity, concurrency, and catalog tests for the SQLite store.
// Purpose: Validate versioned commits, corruption detection, retention,
//          catalog import, and a full engine run over SQLite.
// ============================================================================

//! ## Overview
//! Integration tests for `SqliteRunStore`:
//! - Optimistic version checks on commit
//! - Hash verification and schema version validation
//! - Retention pruning and listing APIs
//! - Catalog import through the `TestCatalog` seam
//! - An engine-driven run persisted across store reopen

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
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use rusqlite::Connection;
use rusqlite::params;
use run_player_core::EntryLookup;
use run_player_core::MemoryAuditSink;
use run_player_core::NextRequest;
use run_player_core::OutcomeCode;
use run_player_core::PlayEntry;
use run_player_core::PlayEntryId;
use run_player_core::ProjectDefaults;
use run_player_core::ProjectId;
use run_player_core::Run;
use run_player_core::RunCommit;
use run_player_core::RunId;
use run_player_core::RunPlayer;
use run_player_core::RunPlayerConfig;
use run_player_core::RunRequest;
use run_player_core::RunState;
use run_player_core::RunStore;
use run_player_core::StaticProjectSettings;
use run_player_core::StoreError;
use run_player_core::TestCatalog;
use run_player_core::TestId;
use run_player_core::TestLink;
use run_player_core::TestSet;
use run_player_core::TestSetId;
use run_player_core::TestStepId;
use run_player_core::UserId;
use run_player_store_sqlite::CatalogDocument;
use run_player_store_sqlite::CatalogStep;
use run_player_store_sqlite::CatalogTest;
use run_player_store_sqlite::SqliteRunStore;
use run_player_store_sqlite::SqliteStoreConfig;
use run_player_store_sqlite::SqliteStoreError;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("runs.db")
}

fn open(dir: &TempDir, max_versions: Option<u64>) -> SqliteRunStore {
    let mut config = SqliteStoreConfig::at(db_path(dir));
    config.max_versions = max_versions;
    SqliteRunStore::new(config).expect("open store")
}

fn project(raw: u64) -> ProjectId {
    ProjectId::from_raw(raw).expect("nonzero project id")
}

fn test_id(raw: u64) -> TestId {
    TestId::from_raw(raw).expect("nonzero test id")
}

fn owner() -> UserId {
    UserId::from_raw(7).expect("nonzero user id")
}

fn sample_run(run: &str, project_raw: u64) -> (Run, Vec<PlayEntry>) {
    let run_id = RunId::new(run);
    let entries = vec![
        PlayEntry::new(&run_id, 1, test_id(101)),
        PlayEntry::new(&run_id, 2, test_id(102)),
    ];
    let run = Run {
        run_id,
        project_id: project(project_raw),
        test_set_id: TestSetId::from_raw(10).expect("nonzero test set id"),
        owner: owner(),
        state: RunState::NotStarted,
        cursor: None,
        run_code: None,
        comment: None,
        version: 1,
    };
    (run, entries)
}

fn bump(store: &SqliteRunStore, run_id: &RunId) -> Run {
    let mut run = store.load_run(run_id).unwrap().expect("run exists");
    let expected_version = run.version;
    run.version += 1;
    store
        .commit(&RunCommit {
            run: run.clone(),
            expected_version,
            entries: Vec::new(),
        })
        .expect("commit");
    run
}

fn catalog_test(raw: u64, steps: u32) -> CatalogTest {
    CatalogTest {
        test_id: test_id(raw),
        name: format!("test {raw}"),
        steps: (1 ..= steps)
            .rev()
            .map(|sequence| CatalogStep {
                step_id: TestStepId::from_raw(raw * 100 + u64::from(sequence))
                    .expect("nonzero step id"),
                sequence,
                instruction: format!("step {sequence}"),
            })
            .collect(),
    }
}

fn regression_document() -> CatalogDocument {
    CatalogDocument {
        tests: vec![catalog_test(101, 2), catalog_test(102, 1)],
        test_sets: vec![TestSet {
            test_set_id: TestSetId::from_raw(10).expect("nonzero test set id"),
            project_id: project(1),
            name: "regression".to_string(),
            links: vec![
                TestLink {
                    test_id: test_id(102),
                    sequence: 20,
                },
                TestLink {
                    test_id: test_id(101),
                    sequence: 10,
                },
            ],
        }],
    }
}

// ============================================================================
// SECTION: Run Persistence
// ============================================================================

#[test]
fn inserted_runs_round_trip_in_sequence_order() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    let (run, mut entries) = sample_run("run-1", 1);
    entries.reverse();
    store.insert_run(&run, &entries).unwrap();

    assert_eq!(store.load_run(&run.run_id).unwrap(), Some(run.clone()));
    let sequences: Vec<u32> =
        store.load_play_list(&run.run_id).unwrap().iter().map(|entry| entry.sequence).collect();
    assert_eq!(sequences, vec![1, 2]);
    assert!(store.load_run(&RunId::new("missing")).unwrap().is_none());
    assert!(store.load_play_list(&RunId::new("missing")).unwrap().is_empty());
}

#[test]
fn find_play_entry_resolves_every_lookup() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    let (run, mut entries) = sample_run("run-1", 1);
    entries.push(PlayEntry::new(&run.run_id, 3, test_id(103)));
    store.insert_run(&run, &entries).unwrap();
    let find = |lookup: EntryLookup| {
        store.find_play_entry(&run.run_id, &lookup).unwrap().map(|entry| entry.sequence)
    };

    assert_eq!(find(EntryLookup::Sequence(2)), Some(2));
    assert_eq!(find(EntryLookup::Sequence(9)), None);
    assert_eq!(find(EntryLookup::Id(PlayEntryId::for_slot(&run.run_id, 3))), Some(3));
    assert_eq!(find(EntryLookup::First), Some(1));
    assert_eq!(find(EntryLookup::Last), Some(3));
    assert_eq!(find(EntryLookup::After(1)), Some(2));
    assert_eq!(find(EntryLookup::After(3)), None);
    assert_eq!(find(EntryLookup::Before(3)), Some(2));
    assert_eq!(find(EntryLookup::Before(1)), None);
}

#[test]
fn duplicate_insert_reports_already_exists() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    let (run, entries) = sample_run("run-1", 1);
    store.insert_run(&run, &entries).unwrap();
    let err = store.insert_run(&run, &entries).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(id) if id == run.run_id));
}

#[test]
fn stale_commit_is_rejected_as_conflict() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    let (run, entries) = sample_run("run-1", 1);
    store.insert_run(&run, &entries).unwrap();
    bump(&store, &run.run_id);

    let mut stale = run.clone();
    stale.version = 2;
    let err = store
        .commit(&RunCommit {
            run: stale,
            expected_version: 1,
            entries: Vec::new(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Conflict {
            expected: 1,
            actual: 2,
            ..
        }
    ));
}

#[test]
fn commit_must_advance_version_by_one() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    let (run, entries) = sample_run("run-1", 1);
    store.insert_run(&run, &entries).unwrap();
    let mut skipped = run.clone();
    skipped.version = 3;
    let err = store
        .commit(&RunCommit {
            run: skipped,
            expected_version: 1,
            entries: Vec::new(),
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[test]
fn commit_replaces_listed_entries_only() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    let (run, entries) = sample_run("run-1", 1);
    store.insert_run(&run, &entries).unwrap();

    let mut judged = entries[1].clone();
    judged.run_code = Some(OutcomeCode::new("PASS"));
    let mut next = run.clone();
    next.version = 2;
    store
        .commit(&RunCommit {
            run: next,
            expected_version: 1,
            entries: vec![judged.clone()],
        })
        .unwrap();

    let stored = store.load_play_list(&run.run_id).unwrap();
    assert_eq!(stored[0], entries[0]);
    assert_eq!(stored[1], judged);
}

#[test]
fn commit_rejects_entries_of_other_runs() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    let (run, entries) = sample_run("run-1", 1);
    store.insert_run(&run, &entries).unwrap();
    let (_, foreign) = sample_run("run-2", 1);
    let mut next = run.clone();
    next.version = 2;
    let err = store
        .commit(&RunCommit {
            run: next,
            expected_version: 1,
            entries: vec![foreign[0].clone()],
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
    assert_eq!(store.load_run(&run.run_id).unwrap().unwrap().version, 1);
}

#[test]
fn commit_to_unknown_run_is_invalid() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    let (mut run, _) = sample_run("ghost", 1);
    run.version = 2;
    let err = store
        .commit(&RunCommit {
            run,
            expected_version: 1,
            entries: Vec::new(),
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

// ============================================================================
// SECTION: Integrity
// ============================================================================

#[test]
fn tampered_snapshot_fails_closed() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    let (run, entries) = sample_run("run-1", 1);
    store.insert_run(&run, &entries).unwrap();

    let raw = Connection::open(db_path(&dir)).unwrap();
    let bytes: Vec<u8> = raw
        .query_row(
            "SELECT snapshot_json FROM run_versions WHERE run_id = ?1",
            params!["run-1"],
            |row| row.get(0),
        )
        .unwrap();
    let edited = String::from_utf8(bytes).unwrap().replace("not_started", "closed");
    raw.execute(
        "UPDATE run_versions SET snapshot_json = ?1 WHERE run_id = ?2",
        params![edited.into_bytes(), "run-1"],
    )
    .unwrap();

    let err = store.load_run(&run.run_id).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

#[test]
fn unsupported_schema_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    drop(open(&dir, None));
    let raw = Connection::open(db_path(&dir)).unwrap();
    raw.execute("UPDATE store_meta SET version = 99", params![]).unwrap();
    drop(raw);

    let err = SqliteRunStore::new(SqliteStoreConfig::at(db_path(&dir))).err().unwrap();
    assert!(matches!(err, SqliteStoreError::VersionMismatch(_)));
}

#[test]
fn store_path_must_not_be_a_directory() {
    let dir = TempDir::new().unwrap();
    let err = SqliteRunStore::new(SqliteStoreConfig::at(dir.path())).err().unwrap();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn zero_retention_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = SqliteStoreConfig::at(db_path(&dir));
    config.max_versions = Some(0);
    let err = SqliteRunStore::new(config).err().unwrap();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

// ============================================================================
// SECTION: History
// ============================================================================

#[test]
fn retention_prunes_old_versions() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, Some(2));
    let (run, entries) = sample_run("run-1", 1);
    store.insert_run(&run, &entries).unwrap();
    for _ in 0 .. 3 {
        bump(&store, &run.run_id);
    }

    let versions: Vec<u64> = store
        .list_run_versions(&run.run_id)
        .unwrap()
        .iter()
        .map(|summary| summary.version)
        .collect();
    assert_eq!(versions, vec![4, 3]);
    assert!(store.load_version(&run.run_id, 1).unwrap().is_none());
    assert_eq!(store.load_version(&run.run_id, 3).unwrap().unwrap().run.version, 3);
    assert!(matches!(
        store.load_version(&run.run_id, 0).unwrap_err(),
        SqliteStoreError::Invalid(_)
    ));
}

#[test]
fn list_runs_filters_by_project() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    for (name, project_raw) in [("run-a", 1), ("run-b", 2), ("run-c", 1)] {
        let (run, entries) = sample_run(name, project_raw);
        store.insert_run(&run, &entries).unwrap();
    }
    bump(&store, &RunId::new("run-c"));

    assert_eq!(store.list_runs(None).unwrap().len(), 3);
    let mut scoped = store.list_runs(Some(project(1))).unwrap();
    scoped.sort_by(|left, right| left.run_id.cmp(&right.run_id));
    let ids: Vec<&str> = scoped.iter().map(|summary| summary.run_id.as_str()).collect();
    assert_eq!(ids, vec!["run-a", "run-c"]);
    assert_eq!(scoped[1].latest_version, 2);
    assert_eq!(scoped[1].state, RunState::NotStarted);
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

#[test]
fn imported_catalog_serves_test_catalog_reads() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    let summary = store.import_catalog(&regression_document()).unwrap();
    assert_eq!(summary.tests, 2);
    assert_eq!(summary.steps, 3);
    assert_eq!(summary.test_sets, 1);
    assert_eq!(summary.links, 2);

    let set = store.load_test_set(TestSetId::from_raw(10).unwrap()).unwrap().unwrap();
    assert_eq!(set.project_id, project(1));
    let ordered: Vec<u64> = set.ordered_links().iter().map(|link| link.test_id.get()).collect();
    assert_eq!(ordered, vec![101, 102]);
    assert_eq!(store.load_test(test_id(101)).unwrap().unwrap().name, "test 101");
    let steps: Vec<u32> =
        store.load_steps(test_id(101)).unwrap().iter().map(|step| step.sequence).collect();
    assert_eq!(steps, vec![1, 2]);
    assert_eq!(store.find_step(test_id(101), 2).unwrap().unwrap().instruction, "step 2");
    assert!(store.load_test(test_id(999)).unwrap().is_none());
}

#[test]
fn reimport_replaces_steps_and_links() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    store.import_catalog(&regression_document()).unwrap();
    let mut document = regression_document();
    document.tests = vec![catalog_test(101, 1)];
    document.test_sets[0].links.truncate(1);
    store.import_catalog(&document).unwrap();

    assert_eq!(store.load_steps(test_id(101)).unwrap().len(), 1);
    assert_eq!(store.load_steps(test_id(102)).unwrap().len(), 1);
    let set = store.load_test_set(TestSetId::from_raw(10).unwrap()).unwrap().unwrap();
    assert_eq!(set.links.len(), 1);
}

#[test]
fn import_with_unknown_link_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    let mut document = regression_document();
    document.test_sets[0].links.push(TestLink {
        test_id: test_id(999),
        sequence: 30,
    });
    let err = store.import_catalog(&document).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
    assert!(store.load_test(test_id(101)).unwrap().is_none());
}

#[test]
fn import_rejects_duplicate_step_sequences() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    let mut test = catalog_test(101, 2);
    test.steps[1].sequence = test.steps[0].sequence;
    let document = CatalogDocument {
        tests: vec![test],
        test_sets: Vec::new(),
    };
    let err = store.import_catalog(&document).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

// ============================================================================
// SECTION: Engine
// ============================================================================

#[test]
fn engine_run_survives_store_reopen() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, None);
    store.import_catalog(&regression_document()).unwrap();
    let player = RunPlayer::new(
        store.clone(),
        store.clone(),
        StaticProjectSettings::new(ProjectDefaults::default()),
        MemoryAuditSink::new(),
        RunPlayerConfig::default(),
    );
    let created = player
        .create_run(&run_player_core::CreateRunRequest {
            run_id: RunId::new("run-e2e"),
            project_id: project(1),
            test_set_id: TestSetId::from_raw(10).unwrap(),
            owner: owner(),
            comment: None,
        })
        .unwrap();
    assert_eq!(created.entries.len(), 2);
    let request = RunRequest::new(RunId::new("run-e2e"), owner());
    player.start(&request).unwrap();

    let mut last = None;
    for code in ["PASS", "PASS", "FAIL"] {
        let mut next = NextRequest::new(&request);
        next.code = Some(OutcomeCode::new(code));
        last = Some(player.next(&next).unwrap());
    }
    let last = last.unwrap();
    assert_eq!(last.run.state, RunState::Closed);
    assert_eq!(last.run.run_code, Some(OutcomeCode::new("FAIL")));
    assert!(last.entry.is_none());
    drop(player);
    drop(store);

    let reopened = open(&dir, None);
    let run = reopened.load_run(&RunId::new("run-e2e")).unwrap().unwrap();
    assert_eq!(run, last.run);
    let versions = reopened.list_run_versions(&run.run_id).unwrap();
    assert_eq!(versions.first().map(|summary| summary.version), Some(run.version));
    let entries = reopened.load_play_list(&run.run_id).unwrap();
    assert_eq!(entries[0].step_results.len(), 2);
    assert_eq!(entries[1].run_code, Some(OutcomeCode::new("FAIL")));
}
