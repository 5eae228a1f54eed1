//! API models for domain entities and response payloads

use serde::Serialize;

pub mod connection;
pub mod user;

use self::connection::ConnectionRequest;
use self::user::UserCard;

/// A pending request addressed to the caller, with the sender's card
#[derive(Debug, Clone, Serialize)]
pub struct ReceivedRequest {
    pub request: ConnectionRequest,
    pub sender: UserCard,
}

/// One page of the discoverable-users feed
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub users: Vec<UserCard>,
    pub next_cursor: Option<String>,
}
