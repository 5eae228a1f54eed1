//! Session-cookie authentication middleware
//!
//! Token issuance lives with the external identity provider; this service
//! only validates. The cookie carries an RS256 JWT whose subject is the
//! user id, and the token must still match the session stored in Redis so
//! revoked sessions stop working immediately.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{Algorithm, Validation};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Name of the session cookie set by the identity provider
pub const SESSION_COOKIE: &str = "session";

/// Claims carried by a session token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Authenticated caller identity, trusted downstream of this middleware
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Redis key holding the live session for a user.
pub fn session_key(user_id: Uuid) -> String {
    format!("session:{}", user_id)
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(ApiError::Unauthorized)?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = true;

    let token_data = jsonwebtoken::decode::<Claims>(&token, &state.decoding_key, &validation)
        .map_err(|e| {
            error!("Failed to validate session token: {}", e);
            ApiError::Unauthorized
        })?;

    let user_id = token_data.claims.sub;

    // Revocation check: the cookie must still match the stored session.
    let stored = state
        .redis
        .get(&session_key(user_id))
        .await
        .map_err(|e| {
            error!("Failed to read session from Redis: {}", e);
            ApiError::InternalServerError
        })?;

    if stored.as_deref() != Some(token.as_str()) {
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(AuthUser { id: user_id });

    Ok(next.run(req).await)
}
