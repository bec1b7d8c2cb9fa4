//! Repository for the `note_versions` table.
//!
//! Versions are append-only. Ordering everywhere is `(created_at, id)` so
//! snapshots sharing a timestamp still have a total order.

use lorekeep_core::types::DbId;
use lorekeep_core::versioning::{excess_versions, NewNoteVersion};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::note_version::{NoteVersionRow, NoteVersionSummaryRow};

const COLUMNS: &str = "id, note_id, author_id, title, content, rendered_html, created_at";

pub struct NoteVersionRepo;

impl NoteVersionRepo {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewNoteVersion,
    ) -> Result<NoteVersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO note_versions (note_id, author_id, title, content, rendered_html, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NoteVersionRow>(&query)
            .bind(input.note_id)
            .bind(input.author_id)
            .bind(&input.state.title)
            .bind(&input.state.content)
            .bind(&input.state.rendered_html)
            .bind(input.created_at)
            .fetch_one(executor)
            .await
    }

    pub async fn count_for_note<'e, E: PgExecutor<'e>>(
        executor: E,
        note_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM note_versions WHERE note_id = $1")
                .bind(note_id)
                .fetch_one(executor)
                .await?;
        Ok(count)
    }

    /// Delete the `count` oldest versions of a note.
    pub async fn delete_oldest<'e, E: PgExecutor<'e>>(
        executor: E,
        note_id: DbId,
        count: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM note_versions
             WHERE id IN (
                SELECT id FROM note_versions
                WHERE note_id = $1
                ORDER BY created_at ASC, id ASC
                LIMIT $2
             )",
        )
        .bind(note_id)
        .bind(count)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete the oldest versions of a note until at most `retention` remain.
    pub async fn prune(
        conn: &mut PgConnection,
        note_id: DbId,
        retention: i64,
    ) -> Result<u64, sqlx::Error> {
        let count = Self::count_for_note(&mut *conn, note_id).await?;
        let excess = excess_versions(count, retention);
        if excess == 0 {
            return Ok(0);
        }
        Self::delete_oldest(&mut *conn, note_id, excess).await
    }

    /// List a note's versions, newest first.
    pub async fn list_by_note(
        pool: &PgPool,
        note_id: DbId,
    ) -> Result<Vec<NoteVersionSummaryRow>, sqlx::Error> {
        sqlx::query_as::<_, NoteVersionSummaryRow>(
            "SELECT id, author_id, title, created_at FROM note_versions
             WHERE note_id = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(note_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<NoteVersionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM note_versions WHERE id = $1");
        sqlx::query_as::<_, NoteVersionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
