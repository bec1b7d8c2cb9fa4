//! Edit-lease timing policy and the per-note lock state machine.
//!
//! Everything here is pure: callers pass `now` explicitly so the same
//! predicates drive the SQL cutoff, the in-memory store, and the tests.

use chrono::Duration;
use serde::Serialize;

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Timing constants
// ---------------------------------------------------------------------------

/// A lease older than this is stale and may be reclaimed (5 minutes).
pub const LEASE_TTL_SECS: i64 = 300;

/// Recommended client heartbeat cadence (TTL / 2.5).
pub const HEARTBEAT_INTERVAL_SECS: i64 = 120;

/// Heartbeat cadence for an arbitrary TTL, kept at TTL / 2.5 so one missed
/// beat does not let the lease lapse.
pub fn heartbeat_interval_secs(ttl_secs: i64) -> i64 {
    ttl_secs * 2 / 5
}

// ---------------------------------------------------------------------------
// Staleness
// ---------------------------------------------------------------------------

/// Whole seconds the lease has been held, never negative.
pub fn lease_age_secs(acquired_at: Timestamp, now: Timestamp) -> i64 {
    (now - acquired_at).num_seconds().max(0)
}

/// A lease is stale when `now - acquired_at > ttl`. A lease exactly `ttl`
/// old is still live.
pub fn is_stale(acquired_at: Timestamp, now: Timestamp, ttl: Duration) -> bool {
    now - acquired_at > ttl
}

/// Leases acquired strictly before this instant are stale at `now`.
pub fn stale_cutoff(now: Timestamp, ttl: Duration) -> Timestamp {
    now - ttl
}

/// When a lease acquired (or last renewed) at `acquired_at` stops being live.
pub fn lease_expires_at(acquired_at: Timestamp, ttl: Duration) -> Timestamp {
    acquired_at + ttl
}

// ---------------------------------------------------------------------------
// Lock state machine
// ---------------------------------------------------------------------------

/// Lock state of one note, read from its `lock_holder_id` /
/// `lock_acquired_at` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LockState {
    Unlocked,
    Locked {
        holder_id: DbId,
        acquired_at: Timestamp,
    },
}

impl LockState {
    /// Build the state from the nullable columns. Half-set columns are
    /// treated as unlocked; the schema forbids them.
    pub fn from_columns(holder_id: Option<DbId>, acquired_at: Option<Timestamp>) -> Self {
        match (holder_id, acquired_at) {
            (Some(holder_id), Some(acquired_at)) => LockState::Locked {
                holder_id,
                acquired_at,
            },
            _ => LockState::Unlocked,
        }
    }

    pub fn holder_id(&self) -> Option<DbId> {
        match self {
            LockState::Locked { holder_id, .. } => Some(*holder_id),
            LockState::Unlocked => None,
        }
    }

    pub fn is_held_by(&self, user_id: DbId) -> bool {
        self.holder_id() == Some(user_id)
    }
}

/// Outcome of an acquire attempt evaluated against a known lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireDecision {
    /// The note is unlocked.
    Grant,
    /// The caller already holds the lease; it is refreshed.
    Renew,
    /// Another user's lease has lapsed and is silently reassigned.
    Reclaim { previous_holder: DbId },
    /// Another user holds a live lease.
    Deny {
        holder_id: DbId,
        acquired_at: Timestamp,
    },
}

impl AcquireDecision {
    pub fn is_granted(&self) -> bool {
        !matches!(self, AcquireDecision::Deny { .. })
    }
}

/// Apply the acquire transition of the lock state machine.
pub fn decide_acquire(
    state: LockState,
    user_id: DbId,
    now: Timestamp,
    ttl: Duration,
) -> AcquireDecision {
    match state {
        LockState::Unlocked => AcquireDecision::Grant,
        LockState::Locked { holder_id, .. } if holder_id == user_id => AcquireDecision::Renew,
        LockState::Locked {
            holder_id,
            acquired_at,
        } if is_stale(acquired_at, now, ttl) => AcquireDecision::Reclaim {
            previous_holder: holder_id,
        },
        LockState::Locked {
            holder_id,
            acquired_at,
        } => AcquireDecision::Deny {
            holder_id,
            acquired_at,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
