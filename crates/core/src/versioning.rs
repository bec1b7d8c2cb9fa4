//! Note version snapshots and the retention rule.
//!
//! Versions are immutable full copies of a note's content, taken immediately
//! before every content-mutating write.

use serde::Serialize;

use crate::note::NoteContent;
use crate::types::{DbId, Timestamp};

/// Maximum number of versions kept per note. Oldest are evicted first.
pub const VERSION_RETENTION: i64 = 50;

/// Maximum characters of title shown in version listings.
pub const TITLE_PREVIEW_CHARS: usize = 80;

/// A stored version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteVersion {
    pub id: DbId,
    pub note_id: DbId,
    pub author_id: DbId,
    pub title: String,
    pub content: serde_json::Value,
    pub rendered_html: String,
    pub created_at: Timestamp,
}

impl NoteVersion {
    pub fn content_state(&self) -> NoteContent {
        NoteContent {
            title: self.title.clone(),
            content: self.content.clone(),
            rendered_html: self.rendered_html.clone(),
        }
    }

    pub fn summary(&self) -> NoteVersionSummary {
        NoteVersionSummary {
            id: self.id,
            author_id: self.author_id,
            created_at: self.created_at,
            title_preview: title_preview(&self.title),
        }
    }
}

/// Listing entry for a version (no content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteVersionSummary {
    pub id: DbId,
    pub author_id: DbId,
    pub created_at: Timestamp,
    pub title_preview: String,
}

/// Insert payload for a version.
#[derive(Debug, Clone)]
pub struct NewNoteVersion {
    pub note_id: DbId,
    pub author_id: DbId,
    pub state: NoteContent,
    pub created_at: Timestamp,
}

/// How many of the oldest versions must go so that `count` fits `retention`.
pub fn excess_versions(count: i64, retention: i64) -> i64 {
    (count - retention).max(0)
}

/// Shorten a title for listings, appending an ellipsis when truncated.
pub fn title_preview(title: &str) -> String {
    if title.chars().count() <= TITLE_PREVIEW_CHARS {
        return title.to_string();
    }
    let mut preview: String = title.chars().take(TITLE_PREVIEW_CHARS - 1).collect();
    preview.push('…');
    preview
}
