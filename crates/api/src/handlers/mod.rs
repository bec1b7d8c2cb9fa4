pub mod note_locks;
pub mod note_versions;
pub mod notes;
