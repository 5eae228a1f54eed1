//! API service routes
//!
//! Thin adapters between the HTTP boundary and the lifecycle engine / feed
//! generator. The session middleware has already resolved the caller's
//! identity by the time a protected handler runs.

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{AuthUser, auth_middleware},
    models::connection::ResolveDecision,
    pagination::Cursor,
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/feed", get(get_feed))
        .route("/requests/send/:to_user_id", post(send_request))
        .route("/requests/:id/resolve/:decision", post(resolve_request))
        .route("/requests/received", get(received_requests))
        .route("/connections", get(connections))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// Send a connection request to another user
pub async fn send_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(to_user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state.engine.send(user.id, to_user_id).await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// Resolve a pending request addressed to the caller
pub async fn resolve_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((id, decision)): Path<(Uuid, ResolveDecision)>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state.engine.resolve(user.id, id, decision).await?;

    Ok(Json(request))
}

/// Query parameters for the feed endpoint
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

/// One page of discoverable users for the caller
pub async fn get_feed(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let cursor = query
        .cursor
        .as_deref()
        .map(Cursor::decode)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Invalid cursor".to_string()))?;

    let page = state.feed.page(user.id, cursor, query.limit).await?;

    Ok(Json(page))
}

/// Pending requests addressed to the caller
pub async fn received_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let received = state.engine.received_requests(user.id).await?;

    Ok(Json(received))
}

/// Established connections of the caller
pub async fn connections(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let partners = state.engine.connections(user.id).await?;

    Ok(Json(partners))
}
