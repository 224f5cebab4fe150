// crates/run-player-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for run-player-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::io::Write;
use std::path::PathBuf;

use run_player_config::ConfigError;
use run_player_config::RunPlayerConfig;
use tempfile::NamedTempFile;

/// Result type shared by the suites.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into a `RunPlayerConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<RunPlayerConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<RunPlayerConfig, toml::de::Error> {
    config_from_toml("")
}

/// Writes `contents` to a temporary config file.
pub fn write_config(contents: &[u8]) -> Result<(NamedTempFile, PathBuf), String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(contents).map_err(|err| err.to_string())?;
    file.flush().map_err(|err| err.to_string())?;
    let path = file.path().to_path_buf();
    Ok((file, path))
}

/// Checks that `result` failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
