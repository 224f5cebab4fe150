// crates/run-player-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Run Store
// Description: Durable RunStore backed by SQLite WAL.
// Purpose: Persist run snapshots with optimistic versioning and integrity checks.
// Dependencies: run-player-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`RunStore`] using `SQLite`. A run and its
//! play list are stored together as one canonical JSON snapshot per version in
//! an append-only version table. Commits are rejected unless the writer read
//! the latest version, so concurrent writers surface as retryable conflicts.
//! Loads verify integrity via stored hashes and fail closed on corruption.
//! Security posture: database contents are untrusted on load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use run_player_core::CatalogError;
use run_player_core::PlayEntry;
use run_player_core::ProjectId;
use run_player_core::Run;
use run_player_core::RunCommit;
use run_player_core::RunId;
use run_player_core::RunState;
use run_player_core::RunStore;
use run_player_core::StoreError;
use run_player_core::UserId;
use run_player_core::core::hashing::DEFAULT_HASH_ALGORITHM;
use run_player_core::core::hashing::HashAlgorithm;
use run_player_core::core::hashing::canonical_json_bytes;
use run_player_core::core::hashing::hash_bytes;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum run snapshot size accepted by the store.
pub const MAX_SNAPSHOT_BYTES: usize = 8 * 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` run store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Optional maximum versions per run (older versions pruned).
    #[serde(default)]
    pub max_versions: Option<u64>,
}

impl SqliteStoreConfig {
    /// Builds a config for `path` with default tuning.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            max_versions: None,
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store data is corrupted.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Snapshot exceeds size limits.
    #[error("sqlite store snapshot too large: max_bytes={max_bytes} actual_bytes={actual_bytes}")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual bytes encountered.
        actual_bytes: usize,
    },
    /// Run identifier already exists.
    #[error("run {0} already exists")]
    AlreadyExists(RunId),
    /// Writer did not read the latest version.
    #[error("run {run_id} version conflict (expected {expected}, found {actual})")]
    Conflict {
        /// Run being committed.
        run_id: RunId,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "snapshot exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
            SqliteStoreError::AlreadyExists(run_id) => Self::AlreadyExists(run_id),
            SqliteStoreError::Conflict {
                run_id,
                expected,
                actual,
            } => Self::Conflict {
                run_id,
                expected,
                actual,
            },
        }
    }
}

impl From<SqliteStoreError> for CatalogError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) | SqliteStoreError::Db(message) => Self::Io(message),
            other => Self::Invalid(other.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Snapshots and Summaries
// ============================================================================

/// One persisted version of a run and its play list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Run record at this version.
    pub run: Run,
    /// Play list ordered by sequence.
    pub entries: Vec<PlayEntry>,
}

/// Summary row for a stored run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Run identifier.
    pub run_id: RunId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Run owner.
    pub owner: UserId,
    /// Lifecycle state at the latest version.
    pub state: RunState,
    /// Latest stored version.
    pub latest_version: u64,
    /// Save time of the latest version (unix millis).
    pub saved_at: i64,
}

/// Metadata for one stored run version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunVersionSummary {
    /// Version number.
    pub version: u64,
    /// Save time (unix millis).
    pub saved_at: i64,
    /// Snapshot digest (hex).
    pub snapshot_hash: String,
    /// Digest algorithm.
    pub hash_algorithm: HashAlgorithm,
    /// Canonical snapshot size.
    pub snapshot_bytes: usize,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed run store and test catalog.
#[derive(Clone)]
pub struct SqliteRunStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteRunStore {
    /// Opens (or creates) the `SQLite` store with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when initialization fails.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        if config.max_versions == Some(0) {
            return Err(SqliteStoreError::Invalid(
                "max_versions must be greater than zero".to_string(),
            ));
        }
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Locks the shared connection.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Lists stored runs, optionally restricted to one project, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn list_runs(
        &self,
        project_id: Option<ProjectId>,
    ) -> Result<Vec<RunSummary>, SqliteStoreError> {
        let project_filter = project_id.map(|project| sql_int(project.get())).transpose()?;
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT r.run_id, r.project_id, r.owner, r.state, r.latest_version, v.saved_at
                 FROM runs r
                 JOIN run_versions v ON v.run_id = r.run_id AND v.version = r.latest_version
                 WHERE ?1 IS NULL OR r.project_id = ?1
                 ORDER BY v.saved_at DESC, r.run_id ASC",
            )
            .map_err(db_error)?;
        let rows = stmt
            .query_map(params![project_filter], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })
            .map_err(db_error)?;
        let mut summaries = Vec::new();
        for row in rows {
            let (run_id, project, owner, state, latest_version, saved_at) =
                row.map_err(db_error)?;
            summaries.push(RunSummary {
                project_id: parse_id(project, ProjectId::from_raw, "project_id")?,
                owner: parse_id(owner, UserId::from_raw, "owner")?,
                state: parse_state(state)?,
                latest_version: parse_version(latest_version)?,
                run_id: RunId::new(run_id),
                saved_at,
            });
        }
        Ok(summaries)
    }

    /// Lists the retained versions of a run, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn list_run_versions(
        &self,
        run_id: &RunId,
    ) -> Result<Vec<RunVersionSummary>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut stmt = guard
            .prepare(
                "SELECT version, saved_at, snapshot_hash, hash_algorithm, length(snapshot_json)
                 FROM run_versions WHERE run_id = ?1 ORDER BY version DESC",
            )
            .map_err(db_error)?;
        let rows = stmt
            .query_map(params![run_id.as_str()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .map_err(db_error)?;
        let mut versions = Vec::new();
        for row in rows {
            let (version, saved_at, snapshot_hash, algorithm, bytes) = row.map_err(db_error)?;
            versions.push(RunVersionSummary {
                version: parse_version(version)?,
                saved_at,
                snapshot_hash,
                hash_algorithm: parse_hash_algorithm(&algorithm)?,
                snapshot_bytes: usize::try_from(bytes).map_err(|_| {
                    SqliteStoreError::Corrupt(format!("negative snapshot length for run {run_id}"))
                })?,
            });
        }
        Ok(versions)
    }

    /// Loads a specific retained version of a run.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the version is invalid or fails
    /// integrity checks.
    pub fn load_version(
        &self,
        run_id: &RunId,
        version: u64,
    ) -> Result<Option<RunSnapshot>, SqliteStoreError> {
        if version < 1 {
            return Err(SqliteStoreError::Invalid("version must be >= 1".to_string()));
        }
        let guard = self.lock()?;
        read_snapshot(&guard, run_id, version)
    }

    /// Loads the latest snapshot of a run.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when loading or verification fails.
    pub fn load_snapshot(&self, run_id: &RunId) -> Result<Option<RunSnapshot>, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(db_error)?;
        let Some(latest) = latest_version(&tx, run_id)? else {
            return Ok(None);
        };
        let snapshot = read_snapshot(&tx, run_id, latest)?.ok_or_else(|| missing_latest(run_id))?;
        tx.commit().map_err(db_error)?;
        drop(guard);
        Ok(Some(snapshot))
    }

    /// Inserts the first version of a run.
    fn insert_snapshot(&self, snapshot: &RunSnapshot) -> Result<(), SqliteStoreError> {
        let run_id = &snapshot.run.run_id;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(db_error)?;
        if latest_version(&tx, run_id)?.is_some() {
            return Err(SqliteStoreError::AlreadyExists(run_id.clone()));
        }
        if snapshot.run.version < 1 {
            return Err(SqliteStoreError::Invalid(format!(
                "run {run_id} must start at version 1 or later"
            )));
        }
        write_snapshot(&tx, snapshot, self.config.max_versions)?;
        tx.commit().map_err(db_error)?;
        drop(guard);
        Ok(())
    }

    /// Applies a commit on top of the latest version.
    fn commit_snapshot(&self, commit: &RunCommit) -> Result<(), SqliteStoreError> {
        let run_id = &commit.run.run_id;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(db_error)?;
        let Some(latest) = latest_version(&tx, run_id)? else {
            return Err(SqliteStoreError::Invalid(format!("run {run_id} does not exist")));
        };
        if latest != commit.expected_version {
            return Err(SqliteStoreError::Conflict {
                run_id: run_id.clone(),
                expected: commit.expected_version,
                actual: latest,
            });
        }
        if commit.expected_version.checked_add(1) != Some(commit.run.version) {
            return Err(SqliteStoreError::Invalid(format!(
                "run {run_id} commit must advance version {latest} by one"
            )));
        }
        let mut snapshot =
            read_snapshot(&tx, run_id, latest)?.ok_or_else(|| missing_latest(run_id))?;
        for entry in &commit.entries {
            let slot = snapshot
                .entries
                .iter_mut()
                .find(|stored| stored.sequence == entry.sequence)
                .filter(|stored| stored.entry_id == entry.entry_id)
                .ok_or_else(|| {
                    SqliteStoreError::Invalid(format!(
                        "play entry {} does not belong to run {run_id}",
                        entry.entry_id
                    ))
                })?;
            *slot = entry.clone();
        }
        snapshot.run = commit.run.clone();
        write_snapshot(&tx, &snapshot, self.config.max_versions)?;
        tx.commit().map_err(db_error)?;
        drop(guard);
        Ok(())
    }

    /// Runs a trivial query against the connection.
    fn check_connection(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.query_row("SELECT 1", params![], |row| row.get::<_, i64>(0)).map_err(db_error)?;
        Ok(())
    }
}

impl RunStore for SqliteRunStore {
    fn load_run(&self, run_id: &RunId) -> Result<Option<Run>, StoreError> {
        Ok(self.load_snapshot(run_id)?.map(|snapshot| snapshot.run))
    }

    fn load_play_list(&self, run_id: &RunId) -> Result<Vec<PlayEntry>, StoreError> {
        Ok(self.load_snapshot(run_id)?.map(|snapshot| snapshot.entries).unwrap_or_default())
    }

    fn insert_run(&self, run: &Run, entries: &[PlayEntry]) -> Result<(), StoreError> {
        let mut entries = entries.to_vec();
        entries.sort_by_key(|entry| entry.sequence);
        let snapshot = RunSnapshot {
            run: run.clone(),
            entries,
        };
        self.insert_snapshot(&snapshot).map_err(StoreError::from)
    }

    fn commit(&self, commit: &RunCommit) -> Result<(), StoreError> {
        self.commit_snapshot(commit).map_err(StoreError::from)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.check_connection().map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Snapshot IO
// ============================================================================

/// Returns the latest stored version of a run.
fn latest_version(
    connection: &Connection,
    run_id: &RunId,
) -> Result<Option<u64>, SqliteStoreError> {
    let latest: Option<i64> = connection
        .query_row(
            "SELECT latest_version FROM runs WHERE run_id = ?1",
            params![run_id.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_error)?;
    latest.map(parse_version).transpose()
}

/// Reads and verifies one snapshot version.
fn read_snapshot(
    connection: &Connection,
    run_id: &RunId,
    version: u64,
) -> Result<Option<RunSnapshot>, SqliteStoreError> {
    let sql_version = sql_int(version)?;
    let length: Option<i64> = connection
        .query_row(
            "SELECT length(snapshot_json) FROM run_versions WHERE run_id = ?1 AND version = ?2",
            params![run_id.as_str(), sql_version],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_error)?;
    let Some(length) = length else {
        return Ok(None);
    };
    let length = usize::try_from(length)
        .map_err(|_| SqliteStoreError::Corrupt(format!("negative snapshot length for run {run_id}")))?;
    if length > MAX_SNAPSHOT_BYTES {
        return Err(SqliteStoreError::TooLarge {
            max_bytes: MAX_SNAPSHOT_BYTES,
            actual_bytes: length,
        });
    }
    let (bytes, hash_value, hash_algorithm): (Vec<u8>, String, String) = connection
        .query_row(
            "SELECT snapshot_json, snapshot_hash, hash_algorithm FROM run_versions
             WHERE run_id = ?1 AND version = ?2",
            params![run_id.as_str(), sql_version],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .map_err(db_error)?;
    let algorithm = parse_hash_algorithm(&hash_algorithm)?;
    if hash_bytes(algorithm, &bytes).value != hash_value {
        return Err(SqliteStoreError::Corrupt(format!(
            "hash mismatch for run {run_id} version {version}"
        )));
    }
    let snapshot: RunSnapshot = serde_json::from_slice(&bytes)
        .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    if snapshot.run.run_id != *run_id {
        return Err(SqliteStoreError::Invalid(
            "run_id mismatch between key and payload".to_string(),
        ));
    }
    if snapshot.run.version != version {
        return Err(SqliteStoreError::Corrupt(format!(
            "version mismatch between key and payload for run {run_id}"
        )));
    }
    Ok(Some(snapshot))
}

/// Writes a snapshot as the new latest version.
fn write_snapshot(
    tx: &Transaction<'_>,
    snapshot: &RunSnapshot,
    max_versions: Option<u64>,
) -> Result<(), SqliteStoreError> {
    let run = &snapshot.run;
    let canonical_json =
        canonical_json_bytes(snapshot).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    if canonical_json.len() > MAX_SNAPSHOT_BYTES {
        return Err(SqliteStoreError::TooLarge {
            max_bytes: MAX_SNAPSHOT_BYTES,
            actual_bytes: canonical_json.len(),
        });
    }
    let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &canonical_json);
    let version = sql_int(run.version)?;
    tx.execute(
        "INSERT INTO runs (run_id, project_id, owner, state, latest_version)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(run_id) DO UPDATE SET state = excluded.state,
             latest_version = excluded.latest_version",
        params![
            run.run_id.as_str(),
            sql_int(run.project_id.get())?,
            sql_int(run.owner.get())?,
            i64::from(run.state.as_code()),
            version
        ],
    )
    .map_err(db_error)?;
    tx.execute(
        "INSERT INTO run_versions (run_id, version, snapshot_json, snapshot_hash, \
         hash_algorithm, saved_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            run.run_id.as_str(),
            version,
            canonical_json,
            digest.value,
            digest.algorithm.label(),
            unix_millis()
        ],
    )
    .map_err(db_error)?;
    enforce_retention(tx, run.run_id.as_str(), version, max_versions)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a rusqlite error into a store error.
#[allow(clippy::needless_pass_by_value, reason = "Used as a map_err adapter.")]
pub(crate) fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

/// Reports a latest version pointer with no matching row.
fn missing_latest(run_id: &RunId) -> SqliteStoreError {
    SqliteStoreError::Corrupt(format!("latest version missing for run {run_id}"))
}

/// Converts an unsigned value into an `SQLite` integer.
pub(crate) fn sql_int(value: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(value)
        .map_err(|_| SqliteStoreError::Invalid(format!("value {value} exceeds sqlite range")))
}

/// Parses a stored identifier column.
pub(crate) fn parse_id<T>(
    raw: i64,
    make: fn(u64) -> Option<T>,
    column: &str,
) -> Result<T, SqliteStoreError> {
    u64::try_from(raw)
        .ok()
        .and_then(make)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid {column}: {raw}")))
}

/// Parses a stored sequence column.
pub(crate) fn parse_sequence(raw: i64, column: &str) -> Result<u32, SqliteStoreError> {
    u32::try_from(raw).map_err(|_| SqliteStoreError::Corrupt(format!("invalid {column}: {raw}")))
}

/// Parses a stored version number.
fn parse_version(raw: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(raw)
        .ok()
        .filter(|version| *version >= 1)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid version: {raw}")))
}

/// Parses a stored run state code.
fn parse_state(raw: i64) -> Result<RunState, SqliteStoreError> {
    u8::try_from(raw)
        .ok()
        .and_then(RunState::from_code)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid run state: {raw}")))
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS runs (
                    run_id TEXT PRIMARY KEY,
                    project_id INTEGER NOT NULL,
                    owner INTEGER NOT NULL,
                    state INTEGER NOT NULL,
                    latest_version INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS run_versions (
                    run_id TEXT NOT NULL,
                    version INTEGER NOT NULL,
                    snapshot_json BLOB NOT NULL,
                    snapshot_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL,
                    saved_at INTEGER NOT NULL,
                    PRIMARY KEY (run_id, version),
                    FOREIGN KEY (run_id) REFERENCES runs(run_id) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_runs_project_id ON runs (project_id);
                CREATE TABLE IF NOT EXISTS tests (
                    test_id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS test_steps (
                    step_id INTEGER PRIMARY KEY,
                    test_id INTEGER NOT NULL,
                    sequence INTEGER NOT NULL,
                    instruction TEXT NOT NULL,
                    UNIQUE (test_id, sequence),
                    FOREIGN KEY (test_id) REFERENCES tests(test_id) ON DELETE CASCADE
                );
                CREATE TABLE IF NOT EXISTS test_sets (
                    test_set_id INTEGER PRIMARY KEY,
                    project_id INTEGER NOT NULL,
                    name TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS test_set_links (
                    test_set_id INTEGER NOT NULL,
                    test_id INTEGER NOT NULL,
                    sequence INTEGER NOT NULL,
                    PRIMARY KEY (test_set_id, sequence),
                    FOREIGN KEY (test_set_id) REFERENCES test_sets(test_set_id) ON DELETE CASCADE,
                    FOREIGN KEY (test_id) REFERENCES tests(test_id)
                );",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}

/// Enforces version retention if configured.
fn enforce_retention(
    tx: &Transaction<'_>,
    run_id: &str,
    latest_version: i64,
    max_versions: Option<u64>,
) -> Result<(), SqliteStoreError> {
    let Some(max_versions) = max_versions else {
        return Ok(());
    };
    let max_versions = i64::try_from(max_versions)
        .map_err(|_| SqliteStoreError::Invalid("max_versions too large".to_string()))?;
    if latest_version > max_versions {
        let min_version = latest_version - max_versions + 1;
        tx.execute(
            "DELETE FROM run_versions WHERE run_id = ?1 AND version < ?2",
            params![run_id, min_version],
        )
        .map_err(db_error)?;
    }
    Ok(())
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

/// Parses a hash algorithm label.
fn parse_hash_algorithm(label: &str) -> Result<HashAlgorithm, SqliteStoreError> {
    HashAlgorithm::from_label(label)
        .ok_or_else(|| SqliteStoreError::Invalid(format!("unsupported hash algorithm: {label}")))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::*;

    #[test]
    fn store_path_guards_reject_overlong_components() {
        let long = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let err = validate_store_path(Path::new(&format!("/tmp/{long}.db"))).unwrap_err();
        assert!(matches!(err, SqliteStoreError::Invalid(_)));
        let err = validate_store_path(Path::new("")).unwrap_err();
        assert!(matches!(err, SqliteStoreError::Invalid(_)));
    }

    #[test]
    fn stored_columns_are_range_checked() {
        assert!(parse_version(0).is_err());
        assert_eq!(parse_version(3).unwrap(), 3);
        assert!(parse_state(9).is_err());
        assert_eq!(parse_state(1).unwrap(), RunState::Open);
        assert!(parse_id(-1, ProjectId::from_raw, "project_id").is_err());
        assert!(parse_sequence(i64::from(u32::MAX) + 1, "sequence").is_err());
    }

    #[test]
    fn conflicts_stay_retryable_through_conversion() {
        let err = StoreError::from(SqliteStoreError::Conflict {
            run_id: RunId::new("run"),
            expected: 2,
            actual: 3,
        });
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }
}
