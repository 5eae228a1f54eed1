//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::engine::EngineError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, invalid, or revoked session
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Lifecycle or feed outcome
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Engine(err) => {
                let status = match &err {
                    EngineError::InvalidTarget => StatusCode::BAD_REQUEST,
                    EngineError::Forbidden => StatusCode::FORBIDDEN,
                    EngineError::NotFound => StatusCode::NOT_FOUND,
                    EngineError::DuplicateRequest | EngineError::InvalidTransition => {
                        StatusCode::CONFLICT
                    }
                    EngineError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                let message = match &err {
                    EngineError::StorageUnavailable(source) => {
                        tracing::error!("Storage unavailable: {}", source);
                        "Storage temporarily unavailable".to_string()
                    }
                    other => other.to_string(),
                };
                (status, message)
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::StoreError;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn engine_outcomes_map_to_distinct_statuses() {
        assert_eq!(
            status_of(EngineError::InvalidTarget.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(EngineError::DuplicateRequest.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(EngineError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(EngineError::Forbidden.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(EngineError::InvalidTransition.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(EngineError::StorageUnavailable(StoreError::Conflict).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn session_failures_are_unauthorized() {
        assert_eq!(status_of(ApiError::Unauthorized), StatusCode::UNAUTHORIZED);
    }
}
