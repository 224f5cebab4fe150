// crates/run-player-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the `config example` command.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `run-player.toml`. The example must always load and
//! validate; the crate tests pin that.

/// Returns a canonical example `run-player.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"# Reject projects that have no [projects.<id>] entry.
require_listed_projects = false

[store]
path = "run-player.db"
journal_mode = "wal"
sync_mode = "full"
busy_timeout_ms = 5000
max_versions = 1000

[audit]
path = "run-player-audit.jsonl"

[defaults]
step_pass_code = "PASS"
step_fail_code = "FAIL"
run_incomplete_code = "INCOMPLETE"
run_create_state = "not_started"

[projects.1]
step_pass_code = "OK"
step_fail_code = "NOK"
"#,
    )
}
