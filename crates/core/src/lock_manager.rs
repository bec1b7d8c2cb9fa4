//! Lease acquisition, renewal, release, and privileged override.
//!
//! The lock lives in two columns on the note row. Each operation here is one
//! conditional write through [`NoteStore`]; no in-process locking is used, so
//! any number of stateless service instances can share a database.
//!
//! Staleness is only ever evaluated inside [`LockManager::acquire`]. A lapsed
//! lease stays visible on the row until somebody else tries to take it.

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

use crate::clock::Clock;
use crate::error::{entities, EditError, LockConflict};
use crate::lease::{
    decide_acquire, is_stale, lease_age_secs, lease_expires_at, stale_cutoff, AcquireDecision,
};
use crate::note::Note;
use crate::policy::EditPolicy;
use crate::store::NoteStore;
use crate::types::{DbId, Timestamp};

/// A granted or renewed lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lease {
    pub note_id: DbId,
    pub holder_id: DbId,
    pub acquired_at: Timestamp,
    pub expires_at: Timestamp,
    /// How often the client should call heartbeat.
    pub heartbeat_interval_secs: i64,
}

/// Read-only view of a note's lock for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockStatus {
    pub note_id: DbId,
    pub locked: bool,
    pub holder_id: Option<DbId>,
    pub holder_name: Option<String>,
    pub acquired_at: Option<Timestamp>,
    pub held_since_seconds: Option<i64>,
    pub expires_at: Option<Timestamp>,
    /// The lease has lapsed and the next acquire by anyone will take it.
    pub stale: bool,
}

impl LockStatus {
    pub fn of(note: &Note, now: Timestamp, ttl: Duration) -> Self {
        let acquired_at = note.lock_holder_id.and(note.lock_acquired_at);
        Self {
            note_id: note.id,
            locked: acquired_at.is_some(),
            holder_id: note.lock_holder_id,
            holder_name: note.lock_holder_name.clone(),
            acquired_at,
            held_since_seconds: acquired_at.map(|at| lease_age_secs(at, now)),
            expires_at: acquired_at.map(|at| lease_expires_at(at, ttl)),
            stale: acquired_at.is_some_and(|at| is_stale(at, now, ttl)),
        }
    }
}

pub struct LockManager<S, C> {
    store: Arc<S>,
    clock: C,
    ttl: Duration,
    heartbeat_interval_secs: i64,
}

impl<S: NoteStore, C: Clock> LockManager<S, C> {
    pub fn new(store: Arc<S>, clock: C, policy: &EditPolicy) -> Self {
        Self {
            store,
            clock,
            ttl: policy.lease_ttl(),
            heartbeat_interval_secs: policy.heartbeat_interval_secs(),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Take the lease on a shared note.
    ///
    /// Granted when the note is unlocked, already held by `user_id`, or held
    /// under a stale lease (which is silently reassigned). Otherwise returns
    /// [`EditError::Conflict`] naming the current holder.
    pub async fn acquire(&self, note: &Note, user_id: DbId) -> Result<Lease, EditError> {
        let now = self.clock.now();
        let expected = decide_acquire(note.lock_state(), user_id, now, self.ttl);

        let written = self
            .store
            .try_acquire_lock(note.id, user_id, now, stale_cutoff(now, self.ttl))
            .await?;

        if !written {
            let conflict = self.conflict(note.id, now).await?;
            tracing::info!(
                note_id = note.id,
                user_id,
                holder_id = ?conflict.holder_id,
                "Lock denied"
            );
            return Err(EditError::Conflict(conflict));
        }

        match expected {
            AcquireDecision::Reclaim { previous_holder } => tracing::info!(
                note_id = note.id,
                user_id,
                previous_holder,
                "Stale lock reclaimed"
            ),
            AcquireDecision::Renew => {
                tracing::debug!(note_id = note.id, user_id, "Lock re-acquired by holder")
            }
            _ => tracing::info!(note_id = note.id, user_id, "Lock acquired"),
        }

        Ok(self.lease(note.id, user_id, now))
    }

    /// Refresh the holder's lease. Fails without side effects if the lock was
    /// released or reassigned in the meantime.
    pub async fn heartbeat(&self, note_id: DbId, user_id: DbId) -> Result<Lease, EditError> {
        let now = self.clock.now();
        if !self.store.renew_lock(note_id, user_id, now).await? {
            let conflict = self.conflict(note_id, now).await?;
            tracing::debug!(note_id, user_id, holder_id = ?conflict.holder_id, "Heartbeat rejected");
            return Err(EditError::Conflict(conflict));
        }
        tracing::debug!(note_id, user_id, "Lock renewed");
        Ok(self.lease(note_id, user_id, now))
    }

    /// Clear the lock if `user_id` holds it.
    pub async fn release(&self, note_id: DbId, user_id: DbId) -> Result<(), EditError> {
        if !self.store.release_lock(note_id, user_id).await? {
            let conflict = self.conflict(note_id, self.clock.now()).await?;
            return Err(EditError::Conflict(conflict));
        }
        tracing::info!(note_id, user_id, "Lock released");
        Ok(())
    }

    /// Clear the lock regardless of holder. The caller has already checked
    /// that `acting_user_id` is allowed to do this.
    ///
    /// Returns the holder whose lock was broken, if any.
    pub async fn force_release(
        &self,
        note: &Note,
        acting_user_id: DbId,
    ) -> Result<Option<DbId>, EditError> {
        let cleared = self.store.clear_lock(note.id).await?;
        let previous_holder = if cleared { note.lock_holder_id } else { None };
        tracing::info!(
            note_id = note.id,
            acting_user_id,
            previous_holder = ?previous_holder,
            cleared,
            "Lock force-released"
        );
        Ok(previous_holder)
    }

    pub fn status(&self, note: &Note) -> LockStatus {
        LockStatus::of(note, self.clock.now(), self.ttl)
    }

    fn lease(&self, note_id: DbId, holder_id: DbId, acquired_at: Timestamp) -> Lease {
        Lease {
            note_id,
            holder_id,
            acquired_at,
            expires_at: lease_expires_at(acquired_at, self.ttl),
            heartbeat_interval_secs: self.heartbeat_interval_secs,
        }
    }

    /// Re-read the note after a failed conditional write to report who holds
    /// it now.
    async fn conflict(&self, note_id: DbId, now: Timestamp) -> Result<LockConflict, EditError> {
        let note = self
            .store
            .find_note(note_id)
            .await?
            .ok_or_else(|| EditError::not_found(entities::NOTE, note_id))?;
        Ok(LockConflict::from_note(&note, now))
    }
}
