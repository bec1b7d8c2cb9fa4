//! Notes: the unit of collaborative editing.
//!
//! `content` is the editor's structured document and `rendered_html` its
//! already-sanitised HTML mirror. Both are stored and returned verbatim.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::lease::LockState;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

pub const VISIBILITY_PRIVATE: &str = "private";
pub const VISIBILITY_SHARED: &str = "shared";

/// Who may edit a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the creator may read or edit; never locked.
    Private,
    /// Campaign collaborators edit under an exclusive lease.
    Shared,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => VISIBILITY_PRIVATE,
            Visibility::Shared => VISIBILITY_SHARED,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            VISIBILITY_PRIVATE => Ok(Visibility::Private),
            VISIBILITY_SHARED => Ok(Visibility::Shared),
            other => Err(CoreError::Validation(format!(
                "Invalid visibility '{other}'. Must be one of: {VISIBILITY_PRIVATE}, {VISIBILITY_SHARED}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Note
// ---------------------------------------------------------------------------

/// A note as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub id: DbId,
    pub campaign_id: DbId,
    pub created_by: DbId,
    pub visibility: Visibility,
    pub title: String,
    pub content: serde_json::Value,
    pub rendered_html: String,
    pub last_edited_by: Option<DbId>,
    pub lock_holder_id: Option<DbId>,
    /// Display name of the lock holder, joined from `users`.
    pub lock_holder_name: Option<String>,
    pub lock_acquired_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Note {
    pub fn lock_state(&self) -> LockState {
        LockState::from_columns(self.lock_holder_id, self.lock_acquired_at)
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    /// The editable part of the note, as it stands now.
    pub fn content_state(&self) -> NoteContent {
        NoteContent {
            title: self.title.clone(),
            content: self.content.clone(),
            rendered_html: self.rendered_html.clone(),
        }
    }
}

/// The content-bearing fields written by an update or a restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteContent {
    pub title: String,
    pub content: serde_json::Value,
    pub rendered_html: String,
}

/// Insert payload for a new note.
#[derive(Debug, Clone, Deserialize)]
pub struct NewNote {
    pub campaign_id: DbId,
    pub created_by: DbId,
    pub visibility: Visibility,
    pub title: String,
    pub content: serde_json::Value,
    pub rendered_html: String,
}

impl NewNote {
    pub fn content_state(&self) -> NoteContent {
        NoteContent {
            title: self.title.clone(),
            content: self.content.clone(),
            rendered_html: self.rendered_html.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 191;

/// Maximum rendered HTML size in bytes (2 MiB).
pub const MAX_RENDERED_HTML_BYTES: usize = 2 * 1024 * 1024;

pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(())
}

/// Validate an update payload. The structured body must be present (not
/// JSON `null`); its shape belongs to the editor and is not inspected.
pub fn validate_content(content: &NoteContent) -> Result<(), CoreError> {
    validate_title(&content.title)?;
    if content.content.is_null() {
        return Err(CoreError::Validation("Content must not be empty".into()));
    }
    if content.rendered_html.len() > MAX_RENDERED_HTML_BYTES {
        return Err(CoreError::Validation(format!(
            "Rendered HTML must be at most {MAX_RENDERED_HTML_BYTES} bytes"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
