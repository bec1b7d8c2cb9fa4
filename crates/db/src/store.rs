//! `NoteStore` backed by Postgres.
//!
//! Lock transitions are single statements. A content write is one
//! transaction: `SELECT ... FOR UPDATE` on the note, a snapshot and prune in
//! a savepoint, then the guarded UPDATE.

use lorekeep_core::note::{Note, NoteContent};
use lorekeep_core::store::{GuardedWrite, NoteStore, StoreError, StoreResult};
use lorekeep_core::types::{DbId, Timestamp};
use lorekeep_core::versioning::{NewNoteVersion, NoteVersion, NoteVersionSummary};
use sqlx::{Acquire, PgPool};

use crate::models::note::NoteRow;
use crate::repositories::{NoteRepo, NoteVersionRepo};

#[derive(Debug, Clone)]
pub struct PgNoteStore {
    pool: PgPool,
}

impl PgNoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn to_note(row: NoteRow) -> StoreResult<Note> {
    Note::try_from(row).map_err(StoreError::backend)
}

impl NoteStore for PgNoteStore {
    async fn find_note(&self, note_id: DbId) -> StoreResult<Option<Note>> {
        NoteRepo::find_by_id(&self.pool, note_id)
            .await
            .map_err(StoreError::backend)?
            .map(to_note)
            .transpose()
    }

    async fn try_acquire_lock(
        &self,
        note_id: DbId,
        user_id: DbId,
        now: Timestamp,
        stale_before: Timestamp,
    ) -> StoreResult<bool> {
        NoteRepo::try_acquire_lock(&self.pool, note_id, user_id, now, stale_before)
            .await
            .map_err(StoreError::backend)
    }

    async fn renew_lock(&self, note_id: DbId, user_id: DbId, now: Timestamp) -> StoreResult<bool> {
        NoteRepo::renew_lock(&self.pool, note_id, user_id, now)
            .await
            .map_err(StoreError::backend)
    }

    async fn release_lock(&self, note_id: DbId, user_id: DbId) -> StoreResult<bool> {
        NoteRepo::release_lock(&self.pool, note_id, user_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn clear_lock(&self, note_id: DbId) -> StoreResult<bool> {
        NoteRepo::clear_lock(&self.pool, note_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn write_with_snapshot(
        &self,
        note_id: DbId,
        editor_id: DbId,
        content: &NoteContent,
        retention: i64,
        now: Timestamp,
    ) -> StoreResult<Option<GuardedWrite>> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

        // Dropping `tx` on the early return rolls it back.
        let Some(current) = NoteRepo::lock_for_write(&mut *tx, note_id, editor_id)
            .await
            .map_err(StoreError::backend)?
        else {
            return Ok(None);
        };
        let current = to_note(current)?;

        let version = NewNoteVersion {
            note_id,
            author_id: editor_id,
            state: current.content_state(),
            created_at: now,
        };

        // The snapshot runs in a savepoint so its failure leaves the outer
        // transaction usable for the content write.
        let mut savepoint = tx.begin().await.map_err(StoreError::backend)?;
        let saved = async {
            let row = NoteVersionRepo::create(&mut *savepoint, &version).await?;
            let pruned = NoteVersionRepo::prune(&mut savepoint, note_id, retention).await?;
            Ok::<_, sqlx::Error>((row, pruned))
        }
        .await;
        let (snapshot, pruned) = match saved {
            Ok((row, pruned)) => {
                savepoint.commit().await.map_err(StoreError::backend)?;
                (Ok(NoteVersion::from(row)), pruned)
            }
            Err(e) => {
                savepoint.rollback().await.map_err(StoreError::backend)?;
                (Err(StoreError::backend(e)), 0)
            }
        };

        let Some(row) = NoteRepo::write_content(&mut *tx, note_id, editor_id, content, now)
            .await
            .map_err(StoreError::backend)?
        else {
            return Ok(None);
        };
        tx.commit().await.map_err(StoreError::backend)?;

        Ok(Some(GuardedWrite {
            note: to_note(row)?,
            snapshot,
            pruned,
        }))
    }

    async fn list_versions(&self, note_id: DbId) -> StoreResult<Vec<NoteVersionSummary>> {
        let rows = NoteVersionRepo::list_by_note(&self.pool, note_id)
            .await
            .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(NoteVersionSummary::from).collect())
    }

    async fn find_version(&self, version_id: DbId) -> StoreResult<Option<NoteVersion>> {
        Ok(NoteVersionRepo::find_by_id(&self.pool, version_id)
            .await
            .map_err(StoreError::backend)?
            .map(NoteVersion::from))
    }
}
