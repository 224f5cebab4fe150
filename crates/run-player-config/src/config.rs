// crates/run-player-config/src/config.rs
// ============================================================================
// Module: Run Player Configuration
// Description: Configuration loading and validation for the run player.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: run-player-core, run-player-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed. The validated model converts
//! into the `SQLite` store configuration and into [`ConfiguredProjectSettings`],
//! the [`ProjectSettings`] implementation the engine consults for outcome codes.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use run_player_core::OutcomeCode;
use run_player_core::ProjectDefaults;
use run_player_core::ProjectId;
use run_player_core::ProjectSettings;
use run_player_core::RunState;
use run_player_core::SettingsError;
use run_player_store_sqlite::SqliteStoreConfig;
use run_player_store_sqlite::SqliteStoreMode;
use run_player_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "run-player.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "RUN_PLAYER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of an outcome code.
pub(crate) const MAX_OUTCOME_CODE_LENGTH: usize = 64;
/// Maximum `SQLite` busy timeout.
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;
/// Maximum number of per-project overrides.
pub(crate) const MAX_PROJECT_OVERRIDES: usize = 1024;
/// Default database file.
const DEFAULT_STORE_PATH: &str = "run-player.db";
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Run player configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunPlayerConfig {
    /// Reject projects without a `[projects.<id>]` entry.
    #[serde(default)]
    pub require_listed_projects: bool,
    /// Run store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Audit log configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Defaults applied to every project.
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Per-project overrides keyed by project id.
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectOverrideConfig>,
}

impl RunPlayerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.audit.validate()?;
        validate_defaults("defaults", &self.defaults.to_project_defaults())?;
        if self.projects.len() > MAX_PROJECT_OVERRIDES {
            return Err(ConfigError::Invalid(format!(
                "projects exceeds {MAX_PROJECT_OVERRIDES} entries"
            )));
        }
        for (key, project) in &self.projects {
            parse_project_key(key)?;
            let merged = project.apply(self.defaults.to_project_defaults());
            validate_defaults(&format!("projects.{key}"), &merged)?;
        }
        if self.require_listed_projects && self.projects.is_empty() {
            return Err(ConfigError::Invalid(
                "require_listed_projects needs at least one [projects.<id>] entry".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the `SQLite` store configuration.
    #[must_use]
    pub fn store_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.store.path.clone(),
            busy_timeout_ms: self.store.busy_timeout_ms,
            journal_mode: self.store.journal_mode,
            sync_mode: self.store.sync_mode,
            max_versions: self.store.max_versions,
        }
    }

    /// Returns the audit log path, if one is configured.
    #[must_use]
    pub fn audit_path(&self) -> Option<&Path> {
        self.audit.path.as_deref()
    }

    /// Resolves project settings for the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a project key is not a valid identifier.
    pub fn project_settings(&self) -> Result<ConfiguredProjectSettings, ConfigError> {
        let fallback = self.defaults.to_project_defaults();
        let mut projects = BTreeMap::new();
        for (key, project) in &self.projects {
            projects.insert(parse_project_key(key)?, project.apply(fallback.clone()));
        }
        Ok(ConfiguredProjectSettings {
            fallback,
            projects,
            require_listed: self.require_listed_projects,
        })
    }
}

/// Run store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// `SQLite` database path.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Optional max versions to retain per run.
    #[serde(default)]
    pub max_versions: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            max_versions: None,
        }
    }
}

impl StoreConfig {
    /// Validates run store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.path", &self.path.to_string_lossy())?;
        if self.max_versions == Some(0) {
            return Err(ConfigError::Invalid(
                "store max_versions must be greater than zero".to_string(),
            ));
        }
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "store busy_timeout_ms must be <= {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Hash-chained JSONL audit log; events are discarded when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Project defaults section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Code recorded by a pass without an explicit code.
    #[serde(default = "default_pass_code")]
    pub step_pass_code: OutcomeCode,
    /// Code recorded by a fail without an explicit code.
    #[serde(default = "default_fail_code")]
    pub step_fail_code: OutcomeCode,
    /// Code written when a run is closed without an explicit code.
    #[serde(default = "default_incomplete_code")]
    pub run_incomplete_code: OutcomeCode,
    /// State a newly created run starts in.
    #[serde(default = "default_create_state")]
    pub run_create_state: RunState,
    /// Code a newly created run starts with.
    #[serde(default)]
    pub run_create_code: Option<OutcomeCode>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let defaults = ProjectDefaults::default();
        Self {
            step_pass_code: defaults.step_pass_code,
            step_fail_code: defaults.step_fail_code,
            run_incomplete_code: defaults.run_incomplete_code,
            run_create_state: defaults.run_create_state,
            run_create_code: defaults.run_create_code,
        }
    }
}

impl DefaultsConfig {
    /// Converts the section into engine defaults.
    #[must_use]
    pub fn to_project_defaults(&self) -> ProjectDefaults {
        ProjectDefaults {
            step_pass_code: self.step_pass_code.clone(),
            step_fail_code: self.step_fail_code.clone(),
            run_incomplete_code: self.run_incomplete_code.clone(),
            run_create_state: self.run_create_state,
            run_create_code: self.run_create_code.clone(),
        }
    }
}

/// Per-project override; unset fields inherit `[defaults]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectOverrideConfig {
    /// Pass code override.
    #[serde(default)]
    pub step_pass_code: Option<OutcomeCode>,
    /// Fail code override.
    #[serde(default)]
    pub step_fail_code: Option<OutcomeCode>,
    /// Incomplete code override.
    #[serde(default)]
    pub run_incomplete_code: Option<OutcomeCode>,
    /// Create state override.
    #[serde(default)]
    pub run_create_state: Option<RunState>,
    /// Create code override.
    #[serde(default)]
    pub run_create_code: Option<OutcomeCode>,
}

impl ProjectOverrideConfig {
    /// Layers the override on top of `base`.
    #[must_use]
    pub fn apply(&self, base: ProjectDefaults) -> ProjectDefaults {
        ProjectDefaults {
            step_pass_code: self.step_pass_code.clone().unwrap_or(base.step_pass_code),
            step_fail_code: self.step_fail_code.clone().unwrap_or(base.step_fail_code),
            run_incomplete_code: self
                .run_incomplete_code
                .clone()
                .unwrap_or(base.run_incomplete_code),
            run_create_state: self.run_create_state.unwrap_or(base.run_create_state),
            run_create_code: self.run_create_code.clone().or(base.run_create_code),
        }
    }
}

// ============================================================================
// SECTION: Project Settings
// ============================================================================

/// Project settings resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredProjectSettings {
    /// Defaults for unlisted projects.
    fallback: ProjectDefaults,
    /// Resolved per-project defaults.
    projects: BTreeMap<ProjectId, ProjectDefaults>,
    /// Reject unlisted projects instead of using the fallback.
    require_listed: bool,
}

impl ProjectSettings for ConfiguredProjectSettings {
    fn defaults(&self, project_id: ProjectId) -> Result<ProjectDefaults, SettingsError> {
        match self.projects.get(&project_id) {
            Some(defaults) => Ok(defaults.clone()),
            None if self.require_listed => Err(SettingsError::UnknownProject(project_id)),
            None => Ok(self.fallback.clone()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a resolved set of project defaults.
fn validate_defaults(section: &str, defaults: &ProjectDefaults) -> Result<(), ConfigError> {
    validate_code(section, "step_pass_code", &defaults.step_pass_code)?;
    validate_code(section, "step_fail_code", &defaults.step_fail_code)?;
    validate_code(section, "run_incomplete_code", &defaults.run_incomplete_code)?;
    if let Some(code) = &defaults.run_create_code {
        validate_code(section, "run_create_code", code)?;
    }
    if defaults.step_pass_code == defaults.step_fail_code {
        return Err(ConfigError::Invalid(format!(
            "{section}.step_pass_code and step_fail_code must differ"
        )));
    }
    if defaults.run_create_state == RunState::Closed {
        return Err(ConfigError::Invalid(format!(
            "{section}.run_create_state must be not_started or open"
        )));
    }
    Ok(())
}

/// Validates one outcome code.
fn validate_code(section: &str, field: &str, code: &OutcomeCode) -> Result<(), ConfigError> {
    let value = code.as_str();
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{section}.{field} must be non-empty")));
    }
    if value.len() > MAX_OUTCOME_CODE_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{section}.{field} exceeds {MAX_OUTCOME_CODE_LENGTH} bytes"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(ConfigError::Invalid(format!(
            "{section}.{field} must not contain control characters"
        )));
    }
    Ok(())
}

/// Parses a `[projects.<id>]` key.
fn parse_project_key(key: &str) -> Result<ProjectId, ConfigError> {
    key.parse::<u64>()
        .ok()
        .and_then(ProjectId::from_raw)
        .ok_or_else(|| ConfigError::Invalid(format!("projects.{key}: project id must be >= 1")))
}

/// Returns the default database path.
fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default pass code.
fn default_pass_code() -> OutcomeCode {
    ProjectDefaults::default().step_pass_code
}

/// Returns the default fail code.
fn default_fail_code() -> OutcomeCode {
    ProjectDefaults::default().step_fail_code
}

/// Returns the default incomplete code.
fn default_incomplete_code() -> OutcomeCode {
    ProjectDefaults::default().run_incomplete_code
}

/// Returns the default create state.
fn default_create_state() -> RunState {
    ProjectDefaults::default().run_create_state
}

// ============================================================================
// SECTION: Tests
// ============================================================================
