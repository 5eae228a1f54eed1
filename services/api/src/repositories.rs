//! Store contracts and their PostgreSQL implementations
//!
//! The lifecycle engine and feed generator are written against these traits;
//! the `Pg*` types in the submodules are the production implementations.
//! Serialization of writes happens inside the store (unique index on the
//! active pair, status compare-and-swap), never in application code, so the
//! contracts hold across concurrent service instances.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::connection::{ConnectionRequest, NewConnectionRequest, RequestStatus};
use crate::models::user::User;
use crate::pagination::Cursor;

pub mod connection;
pub mod user;

pub use connection::PgConnectionStore;
pub use user::PgUserDirectory;

/// Error surfaced by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A concurrent writer won: the active-pair uniqueness or a status
    /// compare-and-swap did not hold at commit time.
    #[error("conflicting write on connection state")]
    Conflict,

    /// The backing store could not serve the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Source of truth for relationship state between any two users.
///
/// The lifecycle engine is the only writer; the feed generator only reads.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Look up a request by id.
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<ConnectionRequest>>;

    /// Find the active (pending or accepted) request for the unordered pair
    /// {a, b}, in either direction.
    async fn find_active_by_pair(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> StoreResult<Option<ConnectionRequest>>;

    /// Insert a new pending request. Fails with [`StoreError::Conflict`]
    /// when an active request already occupies the pair, atomically with
    /// respect to other writers.
    async fn insert_if_absent(&self, new: NewConnectionRequest) -> StoreResult<ConnectionRequest>;

    /// Atomically swap `expected` for `new_status` on the given request.
    /// Fails with [`StoreError::Conflict`] when the request no longer holds
    /// `expected` (or no longer exists).
    async fn update_status(
        &self,
        id: Uuid,
        expected: RequestStatus,
        new_status: RequestStatus,
    ) -> StoreResult<ConnectionRequest>;

    /// Ids of every user the given user must not see in their feed: active
    /// counterparts always, ignored counterparts per policy (the recipient
    /// who ignored always hides the sender; with `ignored_blocks_sender`
    /// the sender's view hides the recipient too).
    async fn list_exclusions(
        &self,
        user_id: Uuid,
        ignored_blocks_sender: bool,
    ) -> StoreResult<Vec<Uuid>>;

    /// Pending requests addressed to the given user, newest first.
    async fn list_pending_for_recipient(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<ConnectionRequest>>;

    /// Accepted requests involving the given user, in either direction.
    async fn list_accepted_for(&self, user_id: Uuid) -> StoreResult<Vec<ConnectionRequest>>;
}

/// Read-only access to user profiles for feed generation and lookups.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user by id.
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Load the given users; missing ids are simply absent from the result.
    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    /// Candidate users in stable `(created_at, id)` order, strictly after
    /// the cursor position, with the excluded ids filtered out.
    async fn list_candidates(
        &self,
        excluding: &[Uuid],
        after: Option<&Cursor>,
        limit: u32,
    ) -> StoreResult<Vec<User>>;
}
