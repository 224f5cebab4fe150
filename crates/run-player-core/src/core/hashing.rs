// crates/run-player-core/src/core/hashing.rs
// ============================================================================
// Module: Run Player Hashing
// Description: Canonical JSON serialization and digest helpers.
// Purpose: Produce stable content hashes for run snapshots and audit chains.
// Dependencies: serde, serde_jcs, sha2, thiserror
// ============================================================================

//! ## Overview
//! Snapshots and audit records are hashed over RFC 8785 canonical JSON so the
//! digest is independent of map ordering and numeric spelling. Digests are
//! rendered as lowercase hex.
//!
//! Security posture: hash inputs may be attacker-influenced; size limits are
//! enforced before hashing when callers request them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Algorithms
// ============================================================================

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

impl HashAlgorithm {
    /// Returns the stable label stored alongside digests.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }

    /// Parses a stored algorithm label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "sha256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

/// Algorithm used when callers do not pick one.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Digest value tagged with its algorithm.
///
/// # Invariants
/// - `value` is lowercase hex of the raw digest bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashDigest {
    /// Algorithm that produced the digest.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest.
    pub value: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Hashing failures.
#[derive(Debug, Error)]
pub enum HashError {
    /// Value could not be rendered as canonical JSON.
    #[error("canonical json error: {0}")]
    Canonicalization(String),
    /// Canonical form exceeded the caller's limit.
    #[error("canonical json exceeds size limit ({actual} > {limit})")]
    SizeLimitExceeded {
        /// Maximum permitted bytes.
        limit: usize,
        /// Actual canonical size in bytes.
        actual: usize,
    },
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Hashes raw bytes.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    let raw = match algorithm {
        HashAlgorithm::Sha256 => Sha256::digest(bytes),
    };
    let mut value = String::with_capacity(raw.len() * 2);
    for byte in raw {
        let _ = write!(value, "{byte:02x}");
    }
    HashDigest {
        algorithm,
        value,
    }
}

/// Serializes a value to RFC 8785 canonical JSON bytes.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when the value cannot be
/// serialized, including non-finite floats.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes the canonical JSON form of a value.
///
/// # Errors
///
/// Returns [`HashError`] when canonicalization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Hashes the canonical JSON form of a value, enforcing a byte limit.
///
/// # Errors
///
/// Returns [`HashError::SizeLimitExceeded`] when the canonical form is larger
/// than `limit`, or [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json_with_limit<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
    limit: usize,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    if bytes.len() > limit {
        return Err(HashError::SizeLimitExceeded {
            limit,
            actual: bytes.len(),
        });
    }
    Ok(hash_bytes(algorithm, &bytes))
}
