//! In-process [`NoteStore`] backed by a single mutex.
//!
//! Each trait call takes the mutex once, which gives the same per-call
//! atomicity the Postgres store gets from conditional updates and
//! row-locking transactions. Used by the coordinator tests and local tooling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::note::{NewNote, Note, NoteContent, Visibility};
use crate::store::{GuardedWrite, NoteStore, StoreError, StoreResult};
use crate::types::{DbId, Timestamp};
use crate::versioning::{excess_versions, NewNoteVersion, NoteVersion, NoteVersionSummary};

#[derive(Debug, Default)]
struct State {
    notes: HashMap<DbId, Note>,
    versions: Vec<NoteVersion>,
    users: HashMap<DbId, String>,
    next_note_id: DbId,
    next_version_id: DbId,
}

impl State {
    fn with_holder_name(&self, mut note: Note) -> Note {
        note.lock_holder_name = note
            .lock_holder_id
            .and_then(|id| self.users.get(&id).cloned());
        note
    }

    fn push_version(&mut self, version: NewNoteVersion) -> NoteVersion {
        self.next_version_id += 1;
        let row = NoteVersion {
            id: self.next_version_id,
            note_id: version.note_id,
            author_id: version.author_id,
            title: version.state.title,
            content: version.state.content,
            rendered_html: version.state.rendered_html,
            created_at: version.created_at,
        };
        self.versions.push(row.clone());
        row
    }

    /// Drop the oldest versions of `note_id`, by `(created_at, id)`, until at
    /// most `retention` remain.
    fn prune(&mut self, note_id: DbId, retention: i64) -> u64 {
        let mut oldest: Vec<(Timestamp, DbId)> = self
            .versions
            .iter()
            .filter(|v| v.note_id == note_id)
            .map(|v| (v.created_at, v.id))
            .collect();
        let excess = excess_versions(oldest.len() as i64, retention);
        if excess == 0 {
            return 0;
        }
        oldest.sort();
        oldest.truncate(excess as usize);
        let doomed: Vec<DbId> = oldest.into_iter().map(|(_, id)| id).collect();
        self.versions.retain(|v| !doomed.contains(&v.id));
        doomed.len() as u64
    }
}

#[derive(Debug, Default)]
pub struct MemoryNoteStore {
    state: Mutex<State>,
    fail_version_writes: AtomicBool,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user's display name (used for lock holder names).
    pub async fn add_user(&self, user_id: DbId, display_name: &str) {
        self.state
            .lock()
            .await
            .users
            .insert(user_id, display_name.to_string());
    }

    pub async fn insert_note(&self, new: NewNote, now: Timestamp) -> Note {
        let mut state = self.state.lock().await;
        state.next_note_id += 1;
        let note = Note {
            id: state.next_note_id,
            campaign_id: new.campaign_id,
            created_by: new.created_by,
            visibility: new.visibility,
            title: new.title,
            content: new.content,
            rendered_html: new.rendered_html,
            last_edited_by: None,
            lock_holder_id: None,
            lock_holder_name: None,
            lock_acquired_at: None,
            created_at: now,
            updated_at: now,
        };
        state.notes.insert(note.id, note.clone());
        note
    }

    /// Make every subsequent snapshot fail until switched off. Content
    /// writes still go through.
    pub fn fail_version_writes(&self, fail: bool) {
        self.fail_version_writes.store(fail, Ordering::SeqCst);
    }
}

impl NoteStore for MemoryNoteStore {
    async fn find_note(&self, note_id: DbId) -> StoreResult<Option<Note>> {
        let state = self.state.lock().await;
        Ok(state
            .notes
            .get(&note_id)
            .cloned()
            .map(|n| state.with_holder_name(n)))
    }

    async fn try_acquire_lock(
        &self,
        note_id: DbId,
        user_id: DbId,
        now: Timestamp,
        stale_before: Timestamp,
    ) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let Some(note) = state.notes.get_mut(&note_id) else {
            return Ok(false);
        };
        if note.visibility != Visibility::Shared {
            return Ok(false);
        }
        let free = match (note.lock_holder_id, note.lock_acquired_at) {
            (None, _) => true,
            (Some(holder), _) if holder == user_id => true,
            (Some(_), Some(acquired_at)) => acquired_at < stale_before,
            (Some(_), None) => true,
        };
        if free {
            note.lock_holder_id = Some(user_id);
            note.lock_acquired_at = Some(now);
        }
        Ok(free)
    }

    async fn renew_lock(&self, note_id: DbId, user_id: DbId, now: Timestamp) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.notes.get_mut(&note_id) {
            Some(note) if note.lock_holder_id == Some(user_id) => {
                note.lock_acquired_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_lock(&self, note_id: DbId, user_id: DbId) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.notes.get_mut(&note_id) {
            Some(note) if note.lock_holder_id == Some(user_id) => {
                note.lock_holder_id = None;
                note.lock_acquired_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_lock(&self, note_id: DbId) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.notes.get_mut(&note_id) {
            Some(note) if note.lock_holder_id.is_some() => {
                note.lock_holder_id = None;
                note.lock_acquired_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn write_with_snapshot(
        &self,
        note_id: DbId,
        editor_id: DbId,
        content: &NoteContent,
        retention: i64,
        now: Timestamp,
    ) -> StoreResult<Option<GuardedWrite>> {
        let mut state = self.state.lock().await;
        let Some(current) = state.notes.get(&note_id) else {
            return Ok(None);
        };
        let allowed = match current.visibility {
            Visibility::Private => current.created_by == editor_id,
            Visibility::Shared => current.lock_holder_id == Some(editor_id),
        };
        if !allowed {
            return Ok(None);
        }

        let replaced = current.content_state();
        let snapshot = if self.fail_version_writes.load(Ordering::SeqCst) {
            Err(StoreError::message("version insert rejected"))
        } else {
            Ok(state.push_version(NewNoteVersion {
                note_id,
                author_id: editor_id,
                state: replaced,
                created_at: now,
            }))
        };
        let pruned = match snapshot {
            Ok(_) => state.prune(note_id, retention),
            Err(_) => 0,
        };

        let Some(note) = state.notes.get_mut(&note_id) else {
            return Ok(None);
        };
        note.title = content.title.clone();
        note.content = content.content.clone();
        note.rendered_html = content.rendered_html.clone();
        note.last_edited_by = Some(editor_id);
        note.updated_at = now;
        let updated = note.clone();

        Ok(Some(GuardedWrite {
            note: state.with_holder_name(updated),
            snapshot,
            pruned,
        }))
    }

    async fn list_versions(&self, note_id: DbId) -> StoreResult<Vec<NoteVersionSummary>> {
        let state = self.state.lock().await;
        let mut rows: Vec<&NoteVersion> = state
            .versions
            .iter()
            .filter(|v| v.note_id == note_id)
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows.into_iter().map(NoteVersion::summary).collect())
    }

    async fn find_version(&self, version_id: DbId) -> StoreResult<Option<NoteVersion>> {
        let state = self.state.lock().await;
        Ok(state.versions.iter().find(|v| v.id == version_id).cloned())
    }
}
