// crates/run-player-core/src/core/time.rs
// ============================================================================
// Module: Run Player Time Model
// Description: Canonical timestamp representation for audit records and snapshots.
// Purpose: Keep engine output replayable by routing wall-clock reads through a clock seam.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The engine never reads wall-clock time directly. Hosts inject a [`Clock`]
//! so tests can pin timestamps and replay audit streams deterministically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used in audit events.
///
/// # Invariants
/// - Values are supplied by a [`Clock`]; no monotonicity is enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Timestamp {
    /// Unix epoch milliseconds.
    UnixMillis(i64),
    /// Monotonic logical time value.
    Logical(u64),
}

impl Timestamp {
    /// Returns the timestamp as unix milliseconds when available.
    #[must_use]
    pub const fn as_unix_millis(&self) -> Option<i64> {
        match self {
            Self::UnixMillis(value) => Some(*value),
            Self::Logical(_) => None,
        }
    }

    /// Returns the timestamp as logical time when available.
    #[must_use]
    pub const fn as_logical(&self) -> Option<u64> {
        match self {
            Self::UnixMillis(_) => None,
            Self::Logical(value) => Some(*value),
        }
    }
}

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Source of timestamps for engine output.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Returns the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Wall-clock source reporting unix milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| i64::try_from(duration.as_millis()).unwrap_or(i64::MAX));
        Timestamp::UnixMillis(millis)
    }
}

/// Deterministic clock that advances by one logical tick per read.
#[derive(Debug, Default)]
pub struct LogicalClock {
    /// Next tick to hand out.
    next: AtomicU64,
}

impl LogicalClock {
    /// Creates a logical clock starting at `start`.
    #[must_use]
    pub const fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl Clock for LogicalClock {
    fn now(&self) -> Timestamp {
        Timestamp::Logical(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
