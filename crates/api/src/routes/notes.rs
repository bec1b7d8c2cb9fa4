//! Route definitions for notes, their edit lock, and version history.
//!
//! All endpoints require authentication via the `AuthUser` extractor.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{note_locks, note_versions, notes};
use crate::state::AppState;

/// Note routes mounted at `/notes`.
///
/// ```text
/// GET    /{id}                                  -> get_note
/// PUT    /{id}/content                          -> update_content
/// POST   /{id}/lock                             -> acquire_lock
/// GET    /{id}/lock                             -> lock_status
/// DELETE /{id}/lock                             -> release_lock
/// POST   /{id}/lock/heartbeat                   -> heartbeat
/// POST   /{id}/lock/force-release               -> force_release
/// GET    /{id}/versions                         -> list_versions
/// GET    /{id}/versions/{version_id}            -> get_version
/// POST   /{id}/versions/{version_id}/restore    -> restore_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(notes::get_note))
        .route("/{id}/content", put(notes::update_content))
        .route(
            "/{id}/lock",
            post(note_locks::acquire_lock)
                .get(note_locks::lock_status)
                .delete(note_locks::release_lock),
        )
        .route("/{id}/lock/heartbeat", post(note_locks::heartbeat))
        .route("/{id}/lock/force-release", post(note_locks::force_release))
        .route("/{id}/versions", get(note_versions::list_versions))
        .route(
            "/{id}/versions/{version_id}",
            get(note_versions::get_version),
        )
        .route(
            "/{id}/versions/{version_id}/restore",
            post(note_versions::restore_version),
        )
}

/// Campaign-scoped note routes mounted at `/campaigns`.
///
/// ```text
/// POST /{campaign_id}/notes    -> create_note
/// ```
pub fn campaign_router() -> Router<AppState> {
    Router::new().route("/{campaign_id}/notes", post(notes::create_note))
}
