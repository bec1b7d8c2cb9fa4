//! Domain error taxonomy shared by every layer.
//!
//! [`CoreError`] covers plain domain failures. [`EditError`] is what the edit
//! coordinator returns: a lock conflict with the holder's details, a domain
//! error, or a storage failure.

use std::fmt;

use serde::Serialize;

use crate::lease::lease_age_secs;
use crate::note::Note;
use crate::store::StoreError;
use crate::types::{DbId, Timestamp};

/// Entity names used in [`CoreError::NotFound`].
pub mod entities {
    pub const NOTE: &str = "Note";
    pub const NOTE_VERSION: &str = "NoteVersion";
    pub const CAMPAIGN: &str = "Campaign";
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The note, version, or campaign does not exist. A version that was
    /// pruned out of retention is reported the same way.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed input, rejected before any lock or version work.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is authenticated but may not touch this note.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a lock operation or a lock-gated write was refused.
///
/// A conflict is a normal, reportable outcome: the caller shows who holds the
/// note and for how long. It is never retried by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockConflict {
    pub note_id: DbId,
    /// Current holder, or `None` when the caller needed a lock that nobody
    /// holds (e.g. writing after the lease was released).
    pub holder_id: Option<DbId>,
    pub holder_name: Option<String>,
    pub held_since: Option<Timestamp>,
    pub held_since_seconds: Option<i64>,
}

impl LockConflict {
    /// Describe the lock currently recorded on `note`.
    pub fn from_note(note: &Note, now: Timestamp) -> Self {
        Self {
            note_id: note.id,
            holder_id: note.lock_holder_id,
            holder_name: note.lock_holder_name.clone(),
            held_since: note.lock_acquired_at,
            held_since_seconds: note.lock_acquired_at.map(|at| lease_age_secs(at, now)),
        }
    }
}

impl fmt::Display for LockConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.holder_id, &self.holder_name, self.held_since_seconds) {
            (Some(_), Some(name), Some(secs)) => write!(
                f,
                "Note {} is being edited by {name} (for {secs}s)",
                self.note_id
            ),
            (Some(holder), _, _) => write!(
                f,
                "Note {} is being edited by user {holder}",
                self.note_id
            ),
            (None, _, _) => write!(f, "You do not hold the lock on note {}", self.note_id),
        }
    }
}

/// Error returned by every coordinator operation.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("{0}")]
    Conflict(LockConflict),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EditError {
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        EditError::Core(CoreError::NotFound { entity, id })
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        EditError::Core(CoreError::Forbidden(msg.into()))
    }
}
