#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use lorekeep_api::auth::jwt::{generate_access_token, JwtConfig};
use lorekeep_api::config::ServerConfig;
use lorekeep_api::router::build_app_router;
use lorekeep_api::state::AppState;
use lorekeep_core::clock::ManualClock;
use lorekeep_core::policy::EditPolicy;
use lorekeep_core::roles::CampaignRole;
use lorekeep_core::types::DbId;
use lorekeep_db::models::campaign::CreateCampaign;
use lorekeep_db::models::user::CreateUser;
use lorekeep_db::repositories::{CampaignRepo, UserRepo};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        edit: EditPolicy::default(),
    }
}

/// Full application router over `pool`, using the wall clock.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    build_app_router(AppState::new(pool, config.clone()), &config)
}

/// Full application router whose lock and version timestamps come from
/// `clock`.
pub fn build_test_app_with_clock(pool: PgPool, clock: Arc<ManualClock>) -> Router {
    let config = test_config();
    build_app_router(AppState::with_clock(pool, config.clone(), clock), &config)
}

pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, None, &test_config().jwt).expect("token generation")
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &PgPool, name: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            display_name: name.to_string(),
        },
    )
    .await
    .expect("user creation should succeed")
    .id
}

pub async fn create_campaign(pool: &PgPool, owner_id: DbId) -> DbId {
    CampaignRepo::create(
        pool,
        &CreateCampaign {
            name: "Shattered Coast".to_string(),
            owner_id,
        },
    )
    .await
    .expect("campaign creation should succeed")
    .id
}

pub async fn add_member(pool: &PgPool, campaign_id: DbId, user_id: DbId, role: CampaignRole) {
    CampaignRepo::add_member(pool, campaign_id, user_id, role)
        .await
        .expect("member creation should succeed");
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user_id: Option<DbId>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token_for(user_id)));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: &Router, uri: &str, user_id: DbId) -> Response<Body> {
    send(app, Method::GET, uri, Some(user_id), None).await
}

pub async fn post_auth(app: &Router, uri: &str, user_id: DbId) -> Response<Body> {
    send(app, Method::POST, uri, Some(user_id), None).await
}

pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    user_id: DbId,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(user_id), Some(body)).await
}

pub async fn put_json_auth(
    app: &Router,
    uri: &str,
    user_id: DbId,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(user_id), Some(body)).await
}

pub async fn delete_auth(app: &Router, uri: &str, user_id: DbId) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(user_id), None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
