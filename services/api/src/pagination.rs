//! Opaque keyset cursors for feed pagination
//!
//! A cursor encodes the `(created_at, id)` position of the last user on the
//! previous page, base64url over a small JSON payload. Clients treat it as
//! an opaque token.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::User;

/// Position in the feed's stable `(created_at, id)` order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

/// The supplied cursor token could not be decoded
#[derive(Debug, Error)]
#[error("malformed pagination cursor")]
pub struct CursorError;

impl Cursor {
    /// Cursor pointing just past the given user.
    pub fn after(user: &User) -> Self {
        Cursor {
            created_at: user.created_at,
            id: user.id,
        }
    }

    /// Encode into the opaque token handed to clients.
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).expect("cursor serialization cannot fail");
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a client-supplied token.
    pub fn decode(raw: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD.decode(raw).map_err(|_| CursorError)?;
        serde_json::from_slice(&bytes).map_err(|_| CursorError)
    }
}
