//! User model and related functionality
//!
//! Users are owned by the user directory; this service only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub interests: Vec<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public profile card returned by feed and connection endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCard {
    pub id: Uuid,
    pub display_name: String,
    pub interests: Vec<String>,
    pub bio: Option<String>,
}

impl From<User> for UserCard {
    fn from(user: User) -> Self {
        UserCard {
            id: user.id,
            display_name: user.display_name,
            interests: user.interests,
            bio: user.bio,
        }
    }
}
