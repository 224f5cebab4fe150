// crates/run-player-core/src/runtime/audit.rs
// ============================================================================
// Module: Run Audit Sinks
// Description: No-op, in-memory, and hash-chained JSONL audit sinks.
// Purpose: Record engine operations in a tamper-evident, append-only log.
// Dependencies: crate::{core, interfaces}, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`JsonlAuditSink`] appends one envelope per line. Each envelope carries
//! the event payload, the previous line's hash, and its own hash, computed as
//! sha256 over the previous hash followed by the canonical JSON payload. The
//! first line chains from [`GENESIS_HASH`]. [`verify_chain`] recomputes every
//! link.
//!
//! Security posture: the log is append-only but not signed; chaining detects
//! edits and truncation in the middle of the file, not wholesale replacement.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::RunAuditEvent;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::hash_bytes;
use crate::interfaces::RunAuditSink;

// ============================================================================
// SECTION: Simple Sinks
// ============================================================================

/// No-op audit sink.
///
/// # Invariants
/// - Events are intentionally discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl RunAuditSink for NoopAuditSink {
    fn record(&self, _event: &RunAuditEvent) {}
}

/// Audit sink collecting events in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    /// Recorded events, oldest first.
    events: Arc<Mutex<Vec<RunAuditEvent>>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<RunAuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl RunAuditSink for MemoryAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

// ============================================================================
// SECTION: Hash-Chained Sink
// ============================================================================

/// Hash the first envelope chains from.
pub const GENESIS_HASH: &str = "0";

/// Hash-chained audit envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuditEnvelope {
    /// Embedded audit payload.
    payload: Value,
    /// Previous hash value.
    prev_hash: String,
    /// Current hash value.
    hash: String,
}

/// Errors for the hash-chained audit log.
#[derive(Debug, Error)]
pub enum AuditChainError {
    /// I/O error.
    #[error("audit chain io error: {0}")]
    Io(String),
    /// Parse error.
    #[error("audit chain parse error: {0}")]
    Parse(String),
    /// Chain link does not verify.
    #[error("audit chain broken at line {line}")]
    Broken {
        /// 1-based line number of the first bad envelope.
        line: usize,
    },
}

/// Append-only, hash-chained JSON-lines audit sink.
#[derive(Debug)]
pub struct JsonlAuditSink {
    /// Open file handle for appending audit events.
    file: Mutex<File>,
    /// Last recorded hash for chaining.
    last_hash: Mutex<String>,
}

impl JsonlAuditSink {
    /// Opens or creates an audit log, resuming the chain from its last line.
    ///
    /// # Errors
    ///
    /// Returns [`AuditChainError`] when the file cannot be opened or an
    /// existing line does not parse.
    pub fn open(path: &Path) -> Result<Self, AuditChainError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| AuditChainError::Io(err.to_string()))?;
        let mut last_hash = GENESIS_HASH.to_string();
        for envelope in read_envelopes(path)? {
            last_hash = envelope.1.hash;
        }
        Ok(Self {
            file: Mutex::new(file),
            last_hash: Mutex::new(last_hash),
        })
    }

    /// Appends a payload, extending the chain.
    fn append_payload(&self, payload: Value) {
        let Ok(mut hash_guard) = self.last_hash.lock() else {
            return;
        };
        let Ok(hash) = link_hash(&hash_guard, &payload) else {
            return;
        };
        let envelope = AuditEnvelope {
            payload,
            prev_hash: hash_guard.clone(),
            hash: hash.clone(),
        };
        if let Ok(line) = serde_json::to_string(&envelope)
            && let Ok(mut file) = self.file.lock()
            && writeln!(file, "{line}").and_then(|()| file.flush()).is_ok()
        {
            *hash_guard = hash;
        }
    }
}

impl RunAuditSink for JsonlAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        if let Ok(payload) = serde_json::to_value(event) {
            self.append_payload(payload);
        }
    }
}

/// Verifies every link of an audit log. Returns the number of envelopes.
///
/// # Errors
///
/// Returns [`AuditChainError::Broken`] at the first envelope whose previous
/// hash or own hash does not match, or I/O and parse errors.
pub fn verify_chain(path: &Path) -> Result<usize, AuditChainError> {
    let mut expected_prev = GENESIS_HASH.to_string();
    let mut count = 0;
    for (line, envelope) in read_envelopes(path)? {
        let recomputed = link_hash(&expected_prev, &envelope.payload)?;
        if envelope.prev_hash != expected_prev || envelope.hash != recomputed {
            return Err(AuditChainError::Broken {
                line,
            });
        }
        expected_prev = envelope.hash;
        count += 1;
    }
    Ok(count)
}

/// Computes the hash linking `payload` to `prev_hash`.
fn link_hash(prev_hash: &str, payload: &Value) -> Result<String, AuditChainError> {
    let payload_bytes =
        canonical_json_bytes(payload).map_err(|err| AuditChainError::Parse(err.to_string()))?;
    let mut combined = prev_hash.as_bytes().to_vec();
    combined.extend_from_slice(&payload_bytes);
    Ok(hash_bytes(DEFAULT_HASH_ALGORITHM, &combined).value)
}

/// Reads non-empty envelopes with their 1-based line numbers.
fn read_envelopes(path: &Path) -> Result<Vec<(usize, AuditEnvelope)>, AuditChainError> {
    let file = File::open(path).map_err(|err| AuditChainError::Io(err.to_string()))?;
    let mut envelopes = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|err| AuditChainError::Io(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let envelope: AuditEnvelope =
            serde_json::from_str(&line).map_err(|err| AuditChainError::Parse(err.to_string()))?;
        envelopes.push((index + 1, envelope));
    }
    Ok(envelopes)
}
