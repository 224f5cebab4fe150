// crates/run-player-cli/src/i18n.rs
// ============================================================================
// Module: CLI Message Catalog
// Description: Provides the message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings so output stays consistent.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The run player CLI stores user-facing strings in a small catalog and
//! routes every runtime message through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself to avoid panics.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries.
const CATALOG_ITEMS: &[(&str, &str)] = &[
    ("main.version", "run-player {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("output.serialize_failed", "Failed to serialize output: {error}"),
    ("output.too_large", "Refusing to print {actual} bytes of output (limit {limit})."),
    (
        "input.read_too_large",
        "Refusing to read {kind} at {path} because it is {size} bytes (limit {limit}).",
    ),
    ("input.read_failed", "Failed to read {kind} at {path}: {error}"),
    ("input.parse_failed", "Failed to parse {kind} JSON at {path}: {error}"),
    ("input.kind.catalog", "catalog document"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid."),
    ("config.settings_failed", "Failed to resolve project settings: {error}"),
    ("identity.missing", "No acting user. Pass --user or set {env}."),
    ("identity.invalid", "Invalid user id {value}: expected a positive integer."),
    ("id.invalid", "Invalid {kind} id {value}: expected a positive integer."),
    ("store.open_failed", "Failed to open run store at {path}: {error}"),
    ("store.query_failed", "Run store query failed: {error}"),
    ("store.version_not_found", "Run {run_id} has no retained version {version}."),
    ("store.run_not_found", "Run {run_id} not found."),
    ("catalog.import_failed", "Catalog import failed: {error}"),
    ("audit.open_failed", "Failed to open audit log at {path}: {error}"),
    ("audit.not_configured", "No audit log configured; pass --path or set audit.path."),
    ("audit.verify_failed", "Audit log {path} failed verification: {error}"),
    ("run.failed", "{kind}: {error}"),
];

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Resolves `key` from the catalog while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

/// Returns the static catalog used by the CLI.
fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    CATALOG.get_or_init(|| CATALOG_ITEMS.iter().copied().collect())
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a catalog message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn placeholders_are_substituted() {
        let message = crate::t!("store.run_not_found", run_id = "run-9");
        assert_eq!(message, "Run run-9 not found.");
    }

    #[test]
    fn unknown_keys_fall_back_to_the_key() {
        assert_eq!(translate("no.such.key", Vec::new()), "no.such.key");
    }

    #[test]
    fn catalog_keys_are_unique() {
        let mut seen = HashSet::new();
        for (key, _) in CATALOG_ITEMS {
            assert!(seen.insert(*key), "duplicate key {key}");
        }
    }
}
