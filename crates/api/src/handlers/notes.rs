//! Handlers for creating, reading, and editing notes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use lorekeep_core::error::CoreError;
use lorekeep_core::note::{validate_content, Note, NoteContent};
use lorekeep_core::types::DbId;
use lorekeep_db::models::note::CreateNote;
use lorekeep_db::repositories::NoteRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{principal_for_note, require_campaign_member};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/campaigns/{campaign_id}/notes
///
/// Create a note owned by the caller. Requires a campaign role that can
/// collaborate; viewers cannot create notes.
pub async fn create_note(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
    Json(input): Json<CreateNote>,
) -> AppResult<impl IntoResponse> {
    let principal = require_campaign_member(&state.pool, campaign_id, &auth).await?;
    if !principal.can_collaborate() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Your campaign role does not allow creating notes".into(),
        )));
    }

    let new_note = input.into_new_note(campaign_id, auth.user_id);
    validate_content(&new_note.content_state())?;

    let row = NoteRepo::create(&state.pool, &new_note).await?;
    let note = Note::try_from(row)?;

    tracing::info!(
        note_id = note.id,
        campaign_id,
        user_id = auth.user_id,
        visibility = %note.visibility,
        "Note created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: note })))
}

/// GET /api/v1/notes/{id}
pub async fn get_note(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(note_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Note>>> {
    let principal = principal_for_note(&state.pool, note_id, &auth).await?;
    let note = state.coordinator.note(note_id, &principal).await?;
    Ok(Json(DataResponse { data: note }))
}

/// PUT /api/v1/notes/{id}/content
///
/// Replace title, body, and rendered HTML. Shared notes require the caller
/// to hold the lock (409 `LOCK_CONFLICT` otherwise); the prior state is
/// snapshotted into the version history first.
pub async fn update_content(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(note_id): Path<DbId>,
    Json(input): Json<NoteContent>,
) -> AppResult<Json<DataResponse<Note>>> {
    let principal = principal_for_note(&state.pool, note_id, &auth).await?;
    let note = state
        .coordinator
        .update_content(note_id, &principal, input)
        .await?;
    Ok(Json(DataResponse { data: note }))
}
