//! Repository for the `notes` table and its lock columns.
//!
//! Lock transitions are single conditional UPDATEs. Under READ COMMITTED a
//! concurrent UPDATE on the same row blocks, then re-checks its WHERE clause
//! against the committed row, so at most one of several racing acquirers
//! matches.

use lorekeep_core::note::{NewNote, NoteContent, VISIBILITY_PRIVATE, VISIBILITY_SHARED};
use lorekeep_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::note::NoteRow;

/// Column list for a `notes n LEFT JOIN users h` projection.
const COLUMNS: &str = "n.id, n.campaign_id, n.created_by, n.visibility, n.title, n.content, \
                       n.rendered_html, n.last_edited_by, n.lock_holder_id, \
                       h.display_name AS lock_holder_name, n.lock_acquired_at, \
                       n.created_at, n.updated_at";

pub struct NoteRepo;

impl NoteRepo {
    pub async fn create(pool: &PgPool, input: &NewNote) -> Result<NoteRow, sqlx::Error> {
        let query = format!(
            "WITH n AS (
                INSERT INTO notes (campaign_id, created_by, visibility, title, content, rendered_html)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
             )
             SELECT {COLUMNS} FROM n LEFT JOIN users h ON h.id = n.lock_holder_id"
        );
        sqlx::query_as::<_, NoteRow>(&query)
            .bind(input.campaign_id)
            .bind(input.created_by)
            .bind(input.visibility.as_str())
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.rendered_html)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<NoteRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notes n
             LEFT JOIN users h ON h.id = n.lock_holder_id
             WHERE n.id = $1"
        );
        sqlx::query_as::<_, NoteRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Take the lock for `user_id` if the note is shared and the lock is
    /// free, already theirs, or was acquired before `stale_before`.
    ///
    /// Returns `true` if the row was updated.
    pub async fn try_acquire_lock(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        now: Timestamp,
        stale_before: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notes
             SET lock_holder_id = $2, lock_acquired_at = $3
             WHERE id = $1
               AND visibility = $5
               AND (lock_holder_id IS NULL
                    OR lock_holder_id = $2
                    OR lock_acquired_at < $4)",
        )
        .bind(id)
        .bind(user_id)
        .bind(now)
        .bind(stale_before)
        .bind(VISIBILITY_SHARED)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Push `lock_acquired_at` forward if `user_id` still holds the lock.
    pub async fn renew_lock(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notes SET lock_acquired_at = $3
             WHERE id = $1 AND lock_holder_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the lock if `user_id` holds it.
    pub async fn release_lock(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notes SET lock_holder_id = NULL, lock_acquired_at = NULL
             WHERE id = $1 AND lock_holder_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the lock whoever holds it. Returns `false` if it was already
    /// clear.
    pub async fn clear_lock(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notes SET lock_holder_id = NULL, lock_acquired_at = NULL
             WHERE id = $1 AND lock_holder_id IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lock the note row for the rest of the transaction if `editor_id` is
    /// the creator of a private note or the lock holder of a shared one.
    ///
    /// Returns `None` when the guard did not match. A concurrent writer
    /// holding the row makes this wait, then re-check the guard against the
    /// committed row.
    pub async fn lock_for_write<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        editor_id: DbId,
    ) -> Result<Option<NoteRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notes n
             LEFT JOIN users h ON h.id = n.lock_holder_id
             WHERE n.id = $1
               AND ((n.visibility = $3 AND n.created_by = $2)
                    OR (n.visibility = $4 AND n.lock_holder_id = $2))
             FOR UPDATE OF n"
        );
        sqlx::query_as::<_, NoteRow>(&query)
            .bind(id)
            .bind(editor_id)
            .bind(VISIBILITY_PRIVATE)
            .bind(VISIBILITY_SHARED)
            .fetch_optional(executor)
            .await
    }

    /// Overwrite title, body, and rendered HTML if `editor_id` is the creator
    /// of a private note or the lock holder of a shared one.
    ///
    /// Returns `None` when the guard did not match.
    pub async fn write_content<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        editor_id: DbId,
        content: &NoteContent,
        now: Timestamp,
    ) -> Result<Option<NoteRow>, sqlx::Error> {
        let query = format!(
            "WITH n AS (
                UPDATE notes
                SET title = $3, content = $4, rendered_html = $5,
                    last_edited_by = $2, updated_at = $6
                WHERE id = $1
                  AND ((visibility = $7 AND created_by = $2)
                       OR (visibility = $8 AND lock_holder_id = $2))
                RETURNING *
             )
             SELECT {COLUMNS} FROM n LEFT JOIN users h ON h.id = n.lock_holder_id"
        );
        sqlx::query_as::<_, NoteRow>(&query)
            .bind(id)
            .bind(editor_id)
            .bind(&content.title)
            .bind(&content.content)
            .bind(&content.rendered_html)
            .bind(now)
            .bind(VISIBILITY_PRIVATE)
            .bind(VISIBILITY_SHARED)
            .fetch_optional(executor)
            .await
    }
}
