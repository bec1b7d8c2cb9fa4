pub mod health;
pub mod notes;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /campaigns/{campaign_id}/notes                      create note
/// /notes/{id}                                         get note
/// /notes/{id}/content                                 update content
/// /notes/{id}/lock                                    acquire, release, status
/// /notes/{id}/lock/heartbeat                          renew lease
/// /notes/{id}/lock/force-release                      owner override
/// /notes/{id}/versions                                list versions
/// /notes/{id}/versions/{version_id}                   get version
/// /notes/{id}/versions/{version_id}/restore           restore version
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/campaigns", notes::campaign_router())
        .nest("/notes", notes::router())
}
