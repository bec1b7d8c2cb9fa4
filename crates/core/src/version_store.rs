//! Append-only version log per note with bounded retention.
//!
//! Snapshots are taken by the store inside the content write's transaction.
//! They are best-effort: a failed insert or prune is rolled back on its own,
//! logged here, and the save goes ahead.

use std::sync::Arc;

use crate::error::{entities, EditError};
use crate::note::NoteContent;
use crate::store::{GuardedWrite, NoteStore};
use crate::types::{DbId, Timestamp};
use crate::versioning::{NoteVersion, NoteVersionSummary};

pub struct VersionStore<S> {
    store: Arc<S>,
    retention: i64,
}

impl<S: NoteStore> VersionStore<S> {
    pub fn new(store: Arc<S>, retention: i64) -> Self {
        Self { store, retention }
    }

    pub fn retention(&self) -> i64 {
        self.retention
    }

    /// Write `content` over the note and snapshot the state it replaces in
    /// the same store transaction, pruning to the retention bound. Returns
    /// `None` when `editor_id` failed the write guard.
    pub async fn write_with_snapshot(
        &self,
        note_id: DbId,
        editor_id: DbId,
        content: &NoteContent,
        now: Timestamp,
    ) -> Result<Option<GuardedWrite>, EditError> {
        let Some(written) = self
            .store
            .write_with_snapshot(note_id, editor_id, content, self.retention, now)
            .await?
        else {
            return Ok(None);
        };

        match &written.snapshot {
            Ok(version) => tracing::debug!(
                note_id,
                version_id = version.id,
                pruned = written.pruned,
                retention = self.retention,
                "Version snapshot saved"
            ),
            Err(e) => tracing::warn!(
                note_id,
                author_id = editor_id,
                error = %e,
                "Failed to save version snapshot; continuing without it"
            ),
        }
        Ok(Some(written))
    }

    /// Versions of a note, newest first.
    pub async fn list(&self, note_id: DbId) -> Result<Vec<NoteVersionSummary>, EditError> {
        Ok(self.store.list_versions(note_id).await?)
    }

    /// Load a version, requiring it to belong to `note_id`.
    pub async fn get(&self, note_id: DbId, version_id: DbId) -> Result<NoteVersion, EditError> {
        self.store
            .find_version(version_id)
            .await?
            .filter(|v| v.note_id == note_id)
            .ok_or_else(|| EditError::not_found(entities::NOTE_VERSION, version_id))
    }
}
