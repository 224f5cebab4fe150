// crates/run-player-cli/src/main.rs
// ============================================================================
// Module: Run Player CLI Entry Point
// Description: Command dispatcher for catalog, run, store, and audit workflows.
// Purpose: Drive the run player engine against the durable SQLite store.
// Dependencies: clap, run-player-config, run-player-core, run-player-store-sqlite, serde_json.
// ============================================================================

//! ## Overview
//! The `run-player` binary wires the engine to the `SQLite` store, the
//! configured project settings, and the optional hash-chained audit log, then
//! executes one operation per invocation. Results are printed as canonical
//! JSON on stdout; failures go to stderr with a failure exit code. The acting
//! user comes from `--user` or the `RUN_PLAYER_USER` environment variable.
//! Security posture: inputs are untrusted and must be validated.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use run_player_cli::t;
use run_player_config::ConfiguredProjectSettings;
use run_player_config::RunPlayerConfig;
use run_player_config::config_toml_example;
use run_player_core::CloseRequest;
use run_player_core::CreateRunRequest;
use run_player_core::CursorMove;
use run_player_core::JsonlAuditSink;
use run_player_core::MoveDirection;
use run_player_core::MoveScope;
use run_player_core::NavigateRequest;
use run_player_core::NextRequest;
use run_player_core::NoopAuditSink;
use run_player_core::OutcomeCode;
use run_player_core::OutcomeRequest;
use run_player_core::PlayerError;
use run_player_core::PositionRequest;
use run_player_core::ProjectId;
use run_player_core::RunAuditEvent;
use run_player_core::RunAuditSink;
use run_player_core::RunId;
use run_player_core::RunPlayer;
use run_player_core::RunRequest;
use run_player_core::StaticIdentity;
use run_player_core::TestSetId;
use run_player_core::UserId;
use run_player_core::Verdict;
use run_player_core::core::hashing::canonical_json_bytes;
use run_player_core::runtime::verify_chain;
use run_player_store_sqlite::CatalogDocument;
use run_player_store_sqlite::SqliteRunStore;
use run_player_store_sqlite::SqliteStoreError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a catalog import document.
const MAX_CATALOG_BYTES: usize = 16 * 1024 * 1024;
/// Maximum size of a JSON response printed to stdout.
const MAX_OUTPUT_BYTES: usize = 16 * 1024 * 1024;
/// Environment variable naming the acting user.
const USER_ENV: &str = "RUN_PLAYER_USER";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "run-player", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Config file path (defaults to run-player.toml or `RUN_PLAYER_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Acting user id (overrides `RUN_PLAYER_USER`).
    #[arg(long, value_name = "ID", global = true)]
    user: Option<String>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Test catalog utilities.
    Catalog {
        /// Selected catalog subcommand.
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Run lifecycle, navigation, and outcome commands.
    Run {
        /// Selected run subcommand.
        #[command(subcommand)]
        command: RunCommand,
    },
    /// Run store administration.
    Store {
        /// Selected store subcommand.
        #[command(subcommand)]
        command: StoreCommand,
    },
    /// Audit log utilities.
    Audit {
        /// Selected audit subcommand.
        #[command(subcommand)]
        command: AuditCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Catalog subcommands.
#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Import tests and test sets from a JSON document.
    Import(CatalogImportCommand),
}

/// Arguments for catalog import.
#[derive(Args, Debug)]
struct CatalogImportCommand {
    /// Catalog document path.
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

/// Run subcommands.
#[derive(Subcommand, Debug)]
enum RunCommand {
    /// Create a run from a test set.
    Create(RunCreateCommand),
    /// Open (or reopen) a run.
    Start(RunTarget),
    /// Close a run.
    Close(RunCloseCommand),
    /// Show the entry under the cursor.
    Current(RunTarget),
    /// Show the test under the cursor.
    CurrentTest(RunTarget),
    /// Show the step under the cursor.
    CurrentStep(RunTarget),
    /// Move the cursor.
    Nav(RunNavCommand),
    /// Record a pass on the current step.
    Pass(RunOutcomeCommand),
    /// Record a fail on the current step.
    Fail(RunOutcomeCommand),
    /// Record an outcome (optional) and advance.
    Next(RunNextCommand),
    /// Jump to an entry sequence.
    Position(RunPositionCommand),
}

/// Run selector shared by run subcommands.
#[derive(Args, Debug)]
struct RunTarget {
    /// Run identifier.
    #[arg(long = "run", value_name = "RUN_ID")]
    run: String,
}

/// Arguments for run creation.
#[derive(Args, Debug)]
struct RunCreateCommand {
    /// Run selector.
    #[command(flatten)]
    target: RunTarget,
    /// Owning project id.
    #[arg(long, value_name = "ID")]
    project: u64,
    /// Test set id.
    #[arg(long = "test-set", value_name = "ID")]
    test_set: u64,
    /// Optional run comment.
    #[arg(long)]
    comment: Option<String>,
}

/// Arguments for closing a run.
#[derive(Args, Debug)]
struct RunCloseCommand {
    /// Run selector.
    #[command(flatten)]
    target: RunTarget,
    /// Run code (defaults to the project incomplete code).
    #[arg(long)]
    code: Option<String>,
    /// Run comment.
    #[arg(long)]
    comment: Option<String>,
}

/// Arguments for cursor navigation.
#[derive(Args, Debug)]
struct RunNavCommand {
    /// Run selector.
    #[command(flatten)]
    target: RunTarget,
    /// Movement granularity.
    #[arg(long, value_enum)]
    scope: ScopeArg,
    /// Movement direction.
    #[arg(long, value_enum)]
    direction: DirectionArg,
}

/// Arguments for outcome recording.
#[derive(Args, Debug)]
struct RunOutcomeCommand {
    /// Run selector.
    #[command(flatten)]
    target: RunTarget,
    /// Explicit outcome code.
    #[arg(long)]
    code: Option<String>,
    /// Step note.
    #[arg(long)]
    comment: Option<String>,
}

/// Arguments for the fused record-and-advance command.
#[derive(Args, Debug)]
struct RunNextCommand {
    /// Run selector.
    #[command(flatten)]
    target: RunTarget,
    /// Outcome code for the current step.
    #[arg(long)]
    code: Option<String>,
    /// Step note.
    #[arg(long)]
    comment: Option<String>,
    /// Execution status written when the test completes.
    #[arg(long)]
    status: Option<String>,
}

/// Arguments for repositioning.
#[derive(Args, Debug)]
struct RunPositionCommand {
    /// Run selector.
    #[command(flatten)]
    target: RunTarget,
    /// Entry sequence; values <= 0 rewind to the first entry.
    #[arg(long, allow_negative_numbers = true)]
    sequence: i64,
}

/// Movement granularity argument.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum ScopeArg {
    /// Flat step list across the run.
    Run,
    /// Test boundaries.
    Test,
    /// Steps of the current test.
    TestStep,
}

/// Movement direction argument.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum DirectionArg {
    /// First position.
    First,
    /// Previous position.
    Previous,
    /// Next position.
    Next,
    /// Last position.
    Last,
}

/// Store subcommands.
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// List stored runs.
    List(StoreListCommand),
    /// List retained versions of a run.
    Versions(RunTarget),
    /// Print a stored snapshot (latest unless --version is given).
    Show(StoreShowCommand),
}

/// Arguments for listing runs.
#[derive(Args, Debug)]
struct StoreListCommand {
    /// Restrict to one project.
    #[arg(long, value_name = "ID")]
    project: Option<u64>,
}

/// Arguments for showing a snapshot.
#[derive(Args, Debug)]
struct StoreShowCommand {
    /// Run selector.
    #[command(flatten)]
    target: RunTarget,
    /// Retained version to load.
    #[arg(long)]
    version: Option<u64>,
}

/// Audit subcommands.
#[derive(Subcommand, Debug)]
enum AuditCommand {
    /// Verify the hash chain of an audit log.
    Verify(AuditVerifyCommand),
}

/// Arguments for audit verification.
#[derive(Args, Debug)]
struct AuditVerifyCommand {
    /// Audit log path (defaults to audit.path from config).
    #[arg(long, value_name = "PATH")]
    path: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the config, then print the effective settings.
    Validate,
    /// Print an example config file.
    Example,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for catalog messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a catalog message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Audit sink selected by configuration.
enum CliAuditSink {
    /// No audit log configured.
    Discard(NoopAuditSink),
    /// Hash-chained JSONL log.
    Chain(JsonlAuditSink),
}

impl RunAuditSink for CliAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        match self {
            Self::Discard(sink) => sink.record(event),
            Self::Chain(sink) => sink.record(event),
        }
    }
}

/// Engine wired to the durable store.
type Player = RunPlayer<SqliteRunStore, SqliteRunStore, ConfiguredProjectSettings, CliAuditSink>;

/// Global options every command may consult.
struct Globals {
    /// Config path override.
    config: Option<PathBuf>,
    /// Acting user override.
    user: Option<String>,
}

impl Globals {
    /// Loads and validates the configuration.
    fn load_config(&self) -> CliResult<RunPlayerConfig> {
        RunPlayerConfig::load(self.config.as_deref())
            .map_err(|err| CliError::new(t!("config.load_failed", error = err)))
    }

    /// Resolves the acting user from the flag or environment.
    fn identity(&self) -> CliResult<StaticIdentity> {
        let raw = match &self.user {
            Some(value) => value.clone(),
            None => std::env::var(USER_ENV)
                .map_err(|_| CliError::new(t!("identity.missing", env = USER_ENV)))?,
        };
        parse_user(&raw).map(StaticIdentity)
    }
}

/// Opens the store named by the configuration.
fn open_store(config: &RunPlayerConfig) -> CliResult<SqliteRunStore> {
    let store_config = config.store_config();
    SqliteRunStore::new(store_config.clone()).map_err(|err| {
        CliError::new(t!("store.open_failed", path = store_config.path.display(), error = err))
    })
}

/// Builds the engine from configuration.
fn open_player(config: &RunPlayerConfig) -> CliResult<Player> {
    let store = open_store(config)?;
    let settings = config
        .project_settings()
        .map_err(|err| CliError::new(t!("config.settings_failed", error = err)))?;
    let audit = match config.audit_path() {
        Some(path) => CliAuditSink::Chain(JsonlAuditSink::open(path).map_err(|err| {
            CliError::new(t!("audit.open_failed", path = path.display(), error = err))
        })?),
        None => CliAuditSink::Discard(NoopAuditSink),
    };
    Ok(RunPlayer::new(
        store.clone(),
        store,
        settings,
        audit,
        run_player_core::RunPlayerConfig::default(),
    ))
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };
    let globals = Globals {
        config: cli.config,
        user: cli.user,
    };

    match command {
        Commands::Catalog {
            command,
        } => command_catalog(&globals, command),
        Commands::Run {
            command,
        } => command_run(&globals, command),
        Commands::Store {
            command,
        } => command_store(&globals, command),
        Commands::Audit {
            command,
        } => command_audit(&globals, command),
        Commands::Config {
            command,
        } => command_config(&globals, &command),
    }
}

/// Prints the top-level help text.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Catalog Commands
// ============================================================================

/// Dispatches catalog subcommands.
fn command_catalog(globals: &Globals, command: CatalogCommand) -> CliResult<ExitCode> {
    match command {
        CatalogCommand::Import(command) => command_catalog_import(globals, &command),
    }
}

/// Executes `catalog import`.
fn command_catalog_import(globals: &Globals, command: &CatalogImportCommand) -> CliResult<ExitCode> {
    let config = globals.load_config()?;
    let kind = t!("input.kind.catalog");
    let bytes = read_bytes_with_limit(&command.input, MAX_CATALOG_BYTES)
        .map_err(|err| read_error(&kind, &command.input, err))?;
    let document: CatalogDocument = serde_json::from_slice(&bytes).map_err(|err| {
        CliError::new(t!(
            "input.parse_failed",
            kind = kind,
            path = command.input.display(),
            error = err
        ))
    })?;
    let store = open_store(&config)?;
    let summary = store
        .import_catalog(&document)
        .map_err(|err| CliError::new(t!("catalog.import_failed", error = err)))?;
    emit_json(&summary)
}

// ============================================================================
// SECTION: Run Commands
// ============================================================================

/// Dispatches run subcommands.
fn command_run(globals: &Globals, command: RunCommand) -> CliResult<ExitCode> {
    let config = globals.load_config()?;
    let identity = globals.identity()?;
    let player = open_player(&config)?;
    let request = |target: &RunTarget| {
        RunRequest::from_identity(&identity, RunId::new(target.run.as_str()))
    };
    match command {
        RunCommand::Create(command) => {
            let mut create = CreateRunRequest::from_identity(
                &identity,
                RunId::new(command.target.run.as_str()),
                parse_id(command.project, "project", ProjectId::from_raw)?,
                parse_id(command.test_set, "test set", TestSetId::from_raw)?,
            );
            create.comment = command.comment;
            emit_json(&player.create_run(&create).map_err(player_error)?)
        }
        RunCommand::Start(target) => emit_json(&player.start(&request(&target)).map_err(player_error)?),
        RunCommand::Close(command) => {
            let mut close = CloseRequest::from(request(&command.target));
            close.code = command.code.map(OutcomeCode::new);
            close.comment = command.comment;
            emit_json(&player.close(&close).map_err(player_error)?)
        }
        RunCommand::Current(target) => {
            emit_json(&player.current(&request(&target)).map_err(player_error)?)
        }
        RunCommand::CurrentTest(target) => {
            emit_json(&player.current_test(&request(&target)).map_err(player_error)?)
        }
        RunCommand::CurrentStep(target) => {
            emit_json(&player.current_step(&request(&target)).map_err(player_error)?)
        }
        RunCommand::Nav(command) => {
            let movement = CursorMove::new(command.scope.into(), command.direction.into());
            let navigate = NavigateRequest::new(&request(&command.target), movement);
            emit_json(&player.navigate(&navigate).map_err(player_error)?)
        }
        RunCommand::Pass(command) => command_outcome(&player, &request(&command.target), Verdict::Pass, command),
        RunCommand::Fail(command) => command_outcome(&player, &request(&command.target), Verdict::Fail, command),
        RunCommand::Next(command) => {
            let mut next = NextRequest::new(&request(&command.target));
            next.code = command.code.map(OutcomeCode::new);
            next.comment = command.comment;
            next.status = command.status;
            emit_json(&player.next(&next).map_err(player_error)?)
        }
        RunCommand::Position(command) => {
            let base = request(&command.target);
            let position = PositionRequest {
                run_id: base.run_id,
                actor: base.actor,
                sequence: command.sequence,
            };
            emit_json(&player.position(&position).map_err(player_error)?)
        }
    }
}

/// Executes `run pass` and `run fail`.
fn command_outcome(
    player: &Player,
    request: &RunRequest,
    verdict: Verdict,
    command: RunOutcomeCommand,
) -> CliResult<ExitCode> {
    let mut outcome = OutcomeRequest::new(request, verdict);
    outcome.code = command.code.map(OutcomeCode::new);
    outcome.comment = command.comment;
    emit_json(&player.record_outcome(&outcome).map_err(player_error)?)
}

impl From<ScopeArg> for MoveScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Run => Self::Run,
            ScopeArg::Test => Self::Test,
            ScopeArg::TestStep => Self::TestStep,
        }
    }
}

impl From<DirectionArg> for MoveDirection {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::First => Self::First,
            DirectionArg::Previous => Self::Previous,
            DirectionArg::Next => Self::Next,
            DirectionArg::Last => Self::Last,
        }
    }
}

// ============================================================================
// SECTION: Store Commands
// ============================================================================

/// Dispatches store subcommands.
fn command_store(globals: &Globals, command: StoreCommand) -> CliResult<ExitCode> {
    let config = globals.load_config()?;
    let store = open_store(&config)?;
    let query_error = |err: SqliteStoreError| CliError::new(t!("store.query_failed", error = err));
    match command {
        StoreCommand::List(command) => {
            let project = command
                .project
                .map(|raw| parse_id(raw, "project", ProjectId::from_raw))
                .transpose()?;
            emit_json(&store.list_runs(project).map_err(query_error)?)
        }
        StoreCommand::Versions(target) => {
            emit_json(&store.list_run_versions(&RunId::new(target.run)).map_err(query_error)?)
        }
        StoreCommand::Show(command) => {
            let run_id = RunId::new(command.target.run);
            let snapshot = match command.version {
                Some(version) => store.load_version(&run_id, version).map_err(query_error)?.ok_or_else(
                    || {
                        CliError::new(t!(
                            "store.version_not_found",
                            run_id = run_id,
                            version = version
                        ))
                    },
                )?,
                None => store
                    .load_snapshot(&run_id)
                    .map_err(query_error)?
                    .ok_or_else(|| CliError::new(t!("store.run_not_found", run_id = run_id)))?,
            };
            emit_json(&snapshot)
        }
    }
}

// ============================================================================
// SECTION: Audit Commands
// ============================================================================

/// Dispatches audit subcommands.
fn command_audit(globals: &Globals, command: AuditCommand) -> CliResult<ExitCode> {
    match command {
        AuditCommand::Verify(command) => {
            let path = match command.path {
                Some(path) => path,
                None => globals
                    .load_config()?
                    .audit_path()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| CliError::new(t!("audit.not_configured")))?,
            };
            let events = verify_chain(&path).map_err(|err| {
                CliError::new(t!("audit.verify_failed", path = path.display(), error = err))
            })?;
            emit_json(&json!({
                "path": path.display().to_string(),
                "events": events,
                "verified": true,
            }))
        }
    }
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(globals: &Globals, command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => {
            let config = globals.load_config()?;
            write_stderr_line(&t!("config.validate.ok"))
                .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            emit_json(&config)
        }
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a user id from the flag or environment.
fn parse_user(raw: &str) -> CliResult<UserId> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .and_then(UserId::from_raw)
        .ok_or_else(|| CliError::new(t!("identity.invalid", value = raw)))
}

/// Converts a raw numeric id, rejecting zero.
fn parse_id<T>(raw: u64, kind: &str, make: fn(u64) -> Option<T>) -> CliResult<T> {
    make(raw).ok_or_else(|| CliError::new(t!("id.invalid", kind = kind, value = raw)))
}

/// Formats an engine failure with its stable kind label.
#[allow(clippy::needless_pass_by_value, reason = "Used as a map_err adapter.")]
fn player_error(err: PlayerError) -> CliError {
    CliError::new(t!("run.failed", kind = err.kind(), error = err))
}

/// Formats a bounded read failure.
fn read_error(kind: &str, path: &Path, err: ReadLimitError) -> CliError {
    match err {
        ReadLimitError::Io(error) => CliError::new(t!(
            "input.read_failed",
            kind = kind,
            path = path.display(),
            error = error
        )),
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(t!(
            "input.read_too_large",
            kind = kind,
            path = path.display(),
            size = size,
            limit = limit
        )),
    }
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Writes canonical JSON to stdout with a size limit.
fn emit_json<T: Serialize>(value: &T) -> CliResult<ExitCode> {
    let mut bytes = canonical_json_bytes(value)
        .map_err(|err| CliError::new(t!("output.serialize_failed", error = err)))?;
    if bytes.len() > MAX_OUTPUT_BYTES {
        return Err(CliError::new(t!(
            "output.too_large",
            actual = bytes.len(),
            limit = MAX_OUTPUT_BYTES
        )));
    }
    bytes.push(b'\n');
    std::io::stdout()
        .write_all(&bytes)
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
