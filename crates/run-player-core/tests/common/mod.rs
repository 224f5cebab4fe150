// crates/run-player-core/tests/common/mod.rs
// =============================================================================
// Module: Run Player Test Helpers
// Description: Shared catalog fixtures and engine harness for integration tests.
// Purpose: Reduce duplication across integration tests for run-player-core.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(clippy::expect_used, reason = "Fixture setup failures abort the test.")]

use std::sync::Arc;

use run_player_core::CreateRunRequest;
use run_player_core::CreatedRun;
use run_player_core::InMemoryCatalog;
use run_player_core::InMemoryRunStore;
use run_player_core::LogicalClock;
use run_player_core::MemoryAuditSink;
use run_player_core::ProjectDefaults;
use run_player_core::ProjectId;
use run_player_core::RunId;
use run_player_core::RunPlayer;
use run_player_core::RunPlayerConfig;
use run_player_core::RunRequest;
use run_player_core::StaticProjectSettings;
use run_player_core::TestCase;
use run_player_core::TestId;
use run_player_core::TestLink;
use run_player_core::TestSet;
use run_player_core::TestSetId;
use run_player_core::TestStep;
use run_player_core::TestStepId;
use run_player_core::UserId;

/// Engine wired to in-memory collaborators.
pub type Player =
    RunPlayer<InMemoryRunStore, InMemoryCatalog, StaticProjectSettings, MemoryAuditSink>;

/// Project owning every fixture.
pub fn project() -> ProjectId {
    ProjectId::from_raw(1).expect("nonzero project id")
}

/// Run owner.
pub fn owner() -> UserId {
    UserId::from_raw(7).expect("nonzero user id")
}

/// A different authenticated user.
pub fn intruder() -> UserId {
    UserId::from_raw(8).expect("nonzero user id")
}

/// Three-test set: two, three, and one step.
pub fn regression_set() -> TestSetId {
    TestSetId::from_raw(10).expect("nonzero test set id")
}

/// Test set with no links.
pub fn empty_set() -> TestSetId {
    TestSetId::from_raw(11).expect("nonzero test set id")
}

/// Test set linking a test without steps.
pub fn hollow_set() -> TestSetId {
    TestSetId::from_raw(12).expect("nonzero test set id")
}

/// Test set owned by another project.
pub fn foreign_set() -> TestSetId {
    TestSetId::from_raw(13).expect("nonzero test set id")
}

/// Test identifier helper.
pub fn test_id(raw: u64) -> TestId {
    TestId::from_raw(raw).expect("nonzero test id")
}

/// Builds `count` steps for `test`, numbered from 1.
pub fn steps(test: u64, count: u32) -> Vec<TestStep> {
    (1 ..= count)
        .map(|sequence| TestStep {
            step_id: TestStepId::from_raw(test * 100 + u64::from(sequence))
                .expect("nonzero step id"),
            test_id: test_id(test),
            sequence,
            instruction: format!("test {test} step {sequence}"),
        })
        .collect()
}

/// Seeds the catalog shared by the suites.
pub fn catalog() -> InMemoryCatalog {
    let catalog = InMemoryCatalog::new();
    for (test, count) in [(101, 2), (102, 3), (103, 1), (104, 0)] {
        catalog
            .insert_test(
                TestCase {
                    test_id: test_id(test),
                    name: format!("test {test}"),
                },
                steps(test, count),
            )
            .expect("insert test");
    }
    // Links are stored out of order; the builder sorts by link sequence.
    catalog
        .insert_test_set(TestSet {
            test_set_id: regression_set(),
            project_id: project(),
            name: "regression".to_string(),
            links: vec![
                TestLink {
                    test_id: test_id(103),
                    sequence: 30,
                },
                TestLink {
                    test_id: test_id(101),
                    sequence: 10,
                },
                TestLink {
                    test_id: test_id(102),
                    sequence: 20,
                },
            ],
        })
        .expect("insert regression set");
    catalog
        .insert_test_set(TestSet {
            test_set_id: empty_set(),
            project_id: project(),
            name: "empty".to_string(),
            links: Vec::new(),
        })
        .expect("insert empty set");
    catalog
        .insert_test_set(TestSet {
            test_set_id: hollow_set(),
            project_id: project(),
            name: "hollow".to_string(),
            links: vec![
                TestLink {
                    test_id: test_id(101),
                    sequence: 1,
                },
                TestLink {
                    test_id: test_id(104),
                    sequence: 2,
                },
            ],
        })
        .expect("insert hollow set");
    catalog
        .insert_test_set(TestSet {
            test_set_id: foreign_set(),
            project_id: ProjectId::from_raw(2).expect("nonzero project id"),
            name: "foreign".to_string(),
            links: vec![TestLink {
                test_id: test_id(101),
                sequence: 1,
            }],
        })
        .expect("insert foreign set");
    catalog
}

/// Builds an engine with default project settings.
pub fn player() -> Player {
    player_with(ProjectDefaults::default())
}

/// Builds an engine with the given project defaults.
pub fn player_with(defaults: ProjectDefaults) -> Player {
    player_on(InMemoryRunStore::new(), defaults)
}

/// Builds an engine over an existing store.
pub fn player_on(store: InMemoryRunStore, defaults: ProjectDefaults) -> Player {
    RunPlayer::new(
        store,
        catalog(),
        StaticProjectSettings::new(defaults),
        MemoryAuditSink::new(),
        RunPlayerConfig::with_clock(Arc::new(LogicalClock::starting_at(0))),
    )
}

/// Owner request for `run`.
pub fn request(run: &str) -> RunRequest {
    RunRequest::new(RunId::new(run), owner())
}

/// Create request for `run` against `test_set`.
pub fn create_request(run: &str, test_set: TestSetId) -> CreateRunRequest {
    CreateRunRequest {
        run_id: RunId::new(run),
        project_id: project(),
        test_set_id: test_set,
        owner: owner(),
        comment: None,
    }
}

/// Creates `run` from the regression set.
pub fn create(player: &Player, run: &str) -> CreatedRun {
    player.create_run(&create_request(run, regression_set())).expect("create run")
}

/// Creates and starts `run`, returning the owner request.
pub fn started(player: &Player, run: &str) -> RunRequest {
    create(player, run);
    let request = request(run);
    player.start(&request).expect("start run");
    request
}
