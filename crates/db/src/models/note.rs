//! Note row model.
//!
//! The row carries the lock columns plus the holder's display name joined in
//! from `users`, and converts into the domain [`Note`].

use lorekeep_core::error::CoreError;
use lorekeep_core::note::{NewNote, Note, Visibility};
use lorekeep_core::types::{DbId, Timestamp};
use serde::Deserialize;
use sqlx::FromRow;

/// A row from `notes` joined with the lock holder's `users.display_name`.
#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: DbId,
    pub campaign_id: DbId,
    pub created_by: DbId,
    pub visibility: String,
    pub title: String,
    pub content: serde_json::Value,
    pub rendered_html: String,
    pub last_edited_by: Option<DbId>,
    pub lock_holder_id: Option<DbId>,
    pub lock_holder_name: Option<String>,
    pub lock_acquired_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<NoteRow> for Note {
    type Error = CoreError;

    fn try_from(row: NoteRow) -> Result<Self, Self::Error> {
        Ok(Note {
            id: row.id,
            campaign_id: row.campaign_id,
            created_by: row.created_by,
            visibility: row.visibility.parse()?,
            title: row.title,
            content: row.content,
            rendered_html: row.rendered_html,
            last_edited_by: row.last_edited_by,
            lock_holder_id: row.lock_holder_id,
            lock_holder_name: row.lock_holder_name,
            lock_acquired_at: row.lock_acquired_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// DTO for creating a note in a campaign. The creator and campaign come from
/// the request context.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNote {
    pub title: String,
    /// Omitted means an empty document; an explicit `null` is kept so
    /// validation can reject it.
    #[serde(default = "empty_document")]
    pub content: serde_json::Value,
    #[serde(default)]
    pub rendered_html: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

fn empty_document() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

impl CreateNote {
    pub fn into_new_note(self, campaign_id: DbId, created_by: DbId) -> NewNote {
        NewNote {
            campaign_id,
            created_by,
            visibility: self.visibility.unwrap_or(Visibility::Shared),
            title: self.title,
            content: self.content,
            rendered_html: self.rendered_html.unwrap_or_default(),
        }
    }
}
