//! Entry point for every lock and content-mutating operation on a note.
//!
//! Shared notes move between `Unlocked` and `Locked(holder)` through the
//! [`LockManager`]; content writes on them require the caller to be the
//! holder. Private notes bypass locking and accept writes from their creator
//! only.
//!
//! Every update and restore snapshots the state it is about to replace in
//! the same transaction as the write, so the version list is always a stack
//! of prior states reachable by successive restores.

use std::sync::Arc;

use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::error::{entities, EditError, LockConflict};
use crate::lock_manager::{Lease, LockManager, LockStatus};
use crate::note::{validate_content, Note, NoteContent};
use crate::policy::EditPolicy;
use crate::roles::Principal;
use crate::store::{GuardedWrite, NoteStore};
use crate::types::DbId;
use crate::version_store::VersionStore;
use crate::versioning::{NoteVersion, NoteVersionSummary};

/// Result of a successful acquire or heartbeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LockGrant {
    Granted(Lease),
    /// The note is private and its creator edits it without a lock.
    NotRequired,
}

pub struct EditCoordinator<S, C = SystemClock> {
    store: Arc<S>,
    locks: LockManager<S, C>,
    versions: VersionStore<S>,
}

impl<S: NoteStore, C: Clock> EditCoordinator<S, C> {
    pub fn new(store: Arc<S>, clock: C, policy: EditPolicy) -> Self {
        Self {
            locks: LockManager::new(Arc::clone(&store), clock, &policy),
            versions: VersionStore::new(Arc::clone(&store), policy.version_retention),
            store,
        }
    }

    pub fn locks(&self) -> &LockManager<S, C> {
        &self.locks
    }

    pub fn versions(&self) -> &VersionStore<S> {
        &self.versions
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn note(&self, note_id: DbId, principal: &Principal) -> Result<Note, EditError> {
        let note = self.load(note_id).await?;
        ensure_can_view(&note, principal)?;
        Ok(note)
    }

    pub async fn lock_status(
        &self,
        note_id: DbId,
        principal: &Principal,
    ) -> Result<LockStatus, EditError> {
        let note = self.note(note_id, principal).await?;
        Ok(self.locks.status(&note))
    }

    pub async fn list_versions(
        &self,
        note_id: DbId,
        principal: &Principal,
    ) -> Result<Vec<NoteVersionSummary>, EditError> {
        self.note(note_id, principal).await?;
        self.versions.list(note_id).await
    }

    pub async fn get_version(
        &self,
        note_id: DbId,
        principal: &Principal,
        version_id: DbId,
    ) -> Result<NoteVersion, EditError> {
        self.note(note_id, principal).await?;
        self.versions.get(note_id, version_id).await
    }

    // -----------------------------------------------------------------------
    // Lock lifecycle
    // -----------------------------------------------------------------------

    pub async fn acquire_lock(
        &self,
        note_id: DbId,
        principal: &Principal,
    ) -> Result<LockGrant, EditError> {
        let note = self.load(note_id).await?;
        if note.is_private() {
            ensure_creator(&note, principal)?;
            return Ok(LockGrant::NotRequired);
        }
        ensure_collaborator(principal)?;
        Ok(LockGrant::Granted(
            self.locks.acquire(&note, principal.user_id).await?,
        ))
    }

    pub async fn heartbeat(
        &self,
        note_id: DbId,
        principal: &Principal,
    ) -> Result<LockGrant, EditError> {
        let note = self.load(note_id).await?;
        if note.is_private() {
            ensure_creator(&note, principal)?;
            return Ok(LockGrant::NotRequired);
        }
        ensure_can_view(&note, principal)?;
        Ok(LockGrant::Granted(
            self.locks.heartbeat(note_id, principal.user_id).await?,
        ))
    }

    pub async fn release_lock(&self, note_id: DbId, principal: &Principal) -> Result<(), EditError> {
        let note = self.load(note_id).await?;
        if note.is_private() {
            return ensure_creator(&note, principal);
        }
        ensure_can_view(&note, principal)?;
        self.locks.release(note_id, principal.user_id).await
    }

    /// Break whatever lock the note carries. The elevated-permission check
    /// belongs to the caller.
    pub async fn force_unlock(
        &self,
        note_id: DbId,
        acting: &Principal,
    ) -> Result<Option<DbId>, EditError> {
        let note = self.load(note_id).await?;
        self.locks.force_release(&note, acting.user_id).await
    }

    // -----------------------------------------------------------------------
    // Content mutation
    // -----------------------------------------------------------------------

    /// Replace the note's content. The lock, if any, stays held.
    pub async fn update_content(
        &self,
        note_id: DbId,
        principal: &Principal,
        content: NoteContent,
    ) -> Result<Note, EditError> {
        validate_content(&content)?;

        let note = self.load(note_id).await?;
        self.ensure_can_write(&note, principal)?;

        let written = self.write(note_id, principal, &content).await?;
        tracing::info!(
            note_id,
            user_id = principal.user_id,
            snapshot_id = ?written.snapshot.as_ref().ok().map(|v| v.id),
            "Note content updated"
        );
        Ok(written.note)
    }

    /// Copy a past version back onto the note. The state being replaced is
    /// snapshotted first, so the restore itself can be undone.
    pub async fn restore_version(
        &self,
        note_id: DbId,
        principal: &Principal,
        version_id: DbId,
    ) -> Result<Note, EditError> {
        let note = self.load(note_id).await?;
        self.ensure_can_write(&note, principal)?;

        // Resolved before snapshotting so the target cannot be pruned by it.
        let target = self.versions.get(note_id, version_id).await?;

        let written = self
            .write(note_id, principal, &target.content_state())
            .await?;
        tracing::info!(
            note_id,
            version_id,
            user_id = principal.user_id,
            snapshot_id = ?written.snapshot.as_ref().ok().map(|v| v.id),
            "Note restored from version"
        );
        Ok(written.note)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn load(&self, note_id: DbId) -> Result<Note, EditError> {
        self.store
            .find_note(note_id)
            .await?
            .ok_or_else(|| EditError::not_found(entities::NOTE, note_id))
    }

    fn ensure_can_write(&self, note: &Note, principal: &Principal) -> Result<(), EditError> {
        if note.is_private() {
            return ensure_creator(note, principal);
        }
        ensure_collaborator(principal)?;
        if !note.lock_state().is_held_by(principal.user_id) {
            return Err(EditError::Conflict(LockConflict::from_note(
                note,
                self.locks.now(),
            )));
        }
        Ok(())
    }

    /// Snapshot-then-write as one store transaction. A lease lost since the
    /// precondition check surfaces as a conflict with nothing recorded.
    async fn write(
        &self,
        note_id: DbId,
        principal: &Principal,
        content: &NoteContent,
    ) -> Result<GuardedWrite, EditError> {
        let now = self.locks.now();
        match self
            .versions
            .write_with_snapshot(note_id, principal.user_id, content, now)
            .await?
        {
            Some(written) => Ok(written),
            None => {
                let current = self.load(note_id).await?;
                Err(EditError::Conflict(LockConflict::from_note(&current, now)))
            }
        }
    }
}

fn ensure_creator(note: &Note, principal: &Principal) -> Result<(), EditError> {
    if note.created_by != principal.user_id {
        return Err(EditError::forbidden(
            "Private notes are only accessible to their creator",
        ));
    }
    Ok(())
}

fn ensure_collaborator(principal: &Principal) -> Result<(), EditError> {
    if !principal.can_collaborate() {
        return Err(EditError::forbidden(
            "Your campaign role does not allow editing shared notes",
        ));
    }
    Ok(())
}

fn ensure_can_view(note: &Note, principal: &Principal) -> Result<(), EditError> {
    if note.is_private() {
        return ensure_creator(note, principal);
    }
    if principal.role.is_none() {
        return Err(EditError::forbidden("You are not a member of this campaign"));
    }
    Ok(())
}
