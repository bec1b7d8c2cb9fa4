//! Handlers for a note's version history.

use axum::extract::{Path, State};
use axum::Json;

use lorekeep_core::note::Note;
use lorekeep_core::types::DbId;
use lorekeep_core::versioning::{NoteVersion, NoteVersionSummary};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::principal_for_note;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/notes/{id}/versions
///
/// Newest first. Entries carry a title preview, not the content.
pub async fn list_versions(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(note_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<NoteVersionSummary>>>> {
    let principal = principal_for_note(&state.pool, note_id, &auth).await?;
    let versions = state.coordinator.list_versions(note_id, &principal).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// GET /api/v1/notes/{id}/versions/{version_id}
pub async fn get_version(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((note_id, version_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<NoteVersion>>> {
    let principal = principal_for_note(&state.pool, note_id, &auth).await?;
    let version = state
        .coordinator
        .get_version(note_id, &principal, version_id)
        .await?;
    Ok(Json(DataResponse { data: version }))
}

/// POST /api/v1/notes/{id}/versions/{version_id}/restore
///
/// Same lock rules as a content update. The replaced state becomes the
/// newest version, so a restore can itself be undone.
pub async fn restore_version(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((note_id, version_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Note>>> {
    let principal = principal_for_note(&state.pool, note_id, &auth).await?;
    let note = state
        .coordinator
        .restore_version(note_id, &principal, version_id)
        .await?;
    Ok(Json(DataResponse { data: note }))
}
