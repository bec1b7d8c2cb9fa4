//! Handlers for the per-note edit lock.
//!
//! Clients acquire before editing a shared note, heartbeat every
//! `heartbeat_interval_secs` while the editor is open, and release on close.
//! A lease that is not renewed within the TTL may be taken by the next
//! acquirer.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use lorekeep_core::coordinator::LockGrant;
use lorekeep_core::lock_manager::LockStatus;
use lorekeep_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{principal_for_note, require_force_unlock};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub note_id: DbId,
    pub released: bool,
}

/// Payload for a successful force-release.
#[derive(Debug, Serialize)]
pub struct ForceReleaseResponse {
    pub note_id: DbId,
    /// The user whose lock was broken; `None` if the note was not locked.
    pub previous_holder_id: Option<DbId>,
}

/// POST /api/v1/notes/{id}/lock
pub async fn acquire_lock(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(note_id): Path<DbId>,
) -> AppResult<Json<DataResponse<LockGrant>>> {
    let principal = principal_for_note(&state.pool, note_id, &auth).await?;
    let grant = state.coordinator.acquire_lock(note_id, &principal).await?;
    Ok(Json(DataResponse { data: grant }))
}

/// POST /api/v1/notes/{id}/lock/heartbeat
pub async fn heartbeat(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(note_id): Path<DbId>,
) -> AppResult<Json<DataResponse<LockGrant>>> {
    let principal = principal_for_note(&state.pool, note_id, &auth).await?;
    let grant = state.coordinator.heartbeat(note_id, &principal).await?;
    Ok(Json(DataResponse { data: grant }))
}

/// DELETE /api/v1/notes/{id}/lock
pub async fn release_lock(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(note_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReleaseResponse>>> {
    let principal = principal_for_note(&state.pool, note_id, &auth).await?;
    state.coordinator.release_lock(note_id, &principal).await?;
    Ok(Json(DataResponse {
        data: ReleaseResponse {
            note_id,
            released: true,
        },
    }))
}

/// POST /api/v1/notes/{id}/lock/force-release
///
/// Campaign owner only.
pub async fn force_release(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(note_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ForceReleaseResponse>>> {
    let principal = principal_for_note(&state.pool, note_id, &auth).await?;
    require_force_unlock(&principal)?;

    let previous_holder_id = state.coordinator.force_unlock(note_id, &principal).await?;
    Ok(Json(DataResponse {
        data: ForceReleaseResponse {
            note_id,
            previous_holder_id,
        },
    }))
}

/// GET /api/v1/notes/{id}/lock
pub async fn lock_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(note_id): Path<DbId>,
) -> AppResult<Json<DataResponse<LockStatus>>> {
    let principal = principal_for_note(&state.pool, note_id, &auth).await?;
    let status = state.coordinator.lock_status(note_id, &principal).await?;
    Ok(Json(DataResponse { data: status }))
}
