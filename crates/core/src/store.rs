//! Persistence interface consumed by the lock manager, version store, and
//! coordinator.
//!
//! Every lock method is a single conditional write, and a content write is a
//! single transaction. Implementations must make each call indivisible
//! against concurrent callers in other processes; that is the only
//! mutual-exclusion point in the system.

use std::future::Future;

use crate::note::{Note, NoteContent};
use crate::types::{DbId, Timestamp};
use crate::versioning::{NoteVersion, NoteVersionSummary};

/// Opaque failure of the storage backend.
#[derive(Debug, thiserror::Error)]
#[error("note store failure: {0}")]
pub struct StoreError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Box::new(err))
    }

    pub fn message(msg: impl Into<String>) -> Self {
        Self(msg.into().into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of [`NoteStore::write_with_snapshot`].
#[derive(Debug)]
pub struct GuardedWrite {
    pub note: Note,
    /// The version holding the replaced state, or why it was skipped.
    pub snapshot: StoreResult<NoteVersion>,
    /// Versions evicted by retention.
    pub pruned: u64,
}

pub trait NoteStore: Send + Sync {
    /// Load a note with its lock columns and the holder's display name.
    fn find_note(&self, note_id: DbId) -> impl Future<Output = StoreResult<Option<Note>>> + Send;

    /// Set the lock to `user_id` at `now` if the note is shared and its lock
    /// is free, already held by `user_id`, or was acquired before
    /// `stale_before`. Returns `true` when the lock was written.
    fn try_acquire_lock(
        &self,
        note_id: DbId,
        user_id: DbId,
        now: Timestamp,
        stale_before: Timestamp,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Refresh `lock_acquired_at` to `now` only if `user_id` holds the lock.
    fn renew_lock(
        &self,
        note_id: DbId,
        user_id: DbId,
        now: Timestamp,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Clear both lock columns only if `user_id` holds the lock.
    fn release_lock(
        &self,
        note_id: DbId,
        user_id: DbId,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Clear both lock columns unconditionally. Returns `true` if a lock was
    /// present.
    fn clear_lock(&self, note_id: DbId) -> impl Future<Output = StoreResult<bool>> + Send;

    /// In one transaction: lock the note row, check that `editor_id` may
    /// write (the creator of a private note, or the lock holder of a shared
    /// one), snapshot the row's current content as a version authored by
    /// `editor_id` at `now`, prune that note's versions down to `retention`,
    /// then write `content` and set `last_edited_by` and `updated_at`.
    ///
    /// A failed snapshot or prune is undone on its own and reported in
    /// [`GuardedWrite::snapshot`]; the content write still commits. Returns
    /// `None`, with nothing written, when the note is gone or the guard did
    /// not match.
    fn write_with_snapshot(
        &self,
        note_id: DbId,
        editor_id: DbId,
        content: &NoteContent,
        retention: i64,
        now: Timestamp,
    ) -> impl Future<Output = StoreResult<Option<GuardedWrite>>> + Send;

    /// Version listing for a note, newest first.
    fn list_versions(
        &self,
        note_id: DbId,
    ) -> impl Future<Output = StoreResult<Vec<NoteVersionSummary>>> + Send;

    fn find_version(
        &self,
        version_id: DbId,
    ) -> impl Future<Output = StoreResult<Option<NoteVersion>>> + Send;
}
