//! Note version rows. Versions are immutable full snapshots.

use lorekeep_core::types::{DbId, Timestamp};
use lorekeep_core::versioning::{title_preview, NoteVersion, NoteVersionSummary};
use sqlx::FromRow;

/// A row from the `note_versions` table.
#[derive(Debug, Clone, FromRow)]
pub struct NoteVersionRow {
    pub id: DbId,
    pub note_id: DbId,
    pub author_id: DbId,
    pub title: String,
    pub content: serde_json::Value,
    pub rendered_html: String,
    pub created_at: Timestamp,
}

impl From<NoteVersionRow> for NoteVersion {
    fn from(row: NoteVersionRow) -> Self {
        NoteVersion {
            id: row.id,
            note_id: row.note_id,
            author_id: row.author_id,
            title: row.title,
            content: row.content,
            rendered_html: row.rendered_html,
            created_at: row.created_at,
        }
    }
}

/// Listing projection; skips the content bodies.
#[derive(Debug, Clone, FromRow)]
pub struct NoteVersionSummaryRow {
    pub id: DbId,
    pub author_id: DbId,
    pub title: String,
    pub created_at: Timestamp,
}

impl From<NoteVersionSummaryRow> for NoteVersionSummary {
    fn from(row: NoteVersionSummaryRow) -> Self {
        NoteVersionSummary {
            id: row.id,
            author_id: row.author_id,
            created_at: row.created_at,
            title_preview: title_preview(&row.title),
        }
    }
}
