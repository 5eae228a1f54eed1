//! Request lifecycle engine
//!
//! The only writer of connection state. Validates send and resolve
//! operations against the status state machine and defers race resolution
//! to the store's atomic primitives: the unique index on the active pair
//! for creation, the status compare-and-swap for resolution. No retries
//! live here; `StorageUnavailable` is returned to the caller's own policy.

use std::collections::HashMap;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::ReceivedRequest;
use crate::models::connection::{
    ConnectionRequest, NewConnectionRequest, RequestStatus, ResolveDecision,
};
use crate::models::user::UserCard;
use crate::repositories::{ConnectionStore, StoreError, UserDirectory};

/// Outcome taxonomy for lifecycle operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// The target user does not exist, or is the caller
    #[error("Invalid target user")]
    InvalidTarget,

    /// An active request already exists for the pair, in either direction
    #[error("A connection request already exists between these users")]
    DuplicateRequest,

    /// No such connection request
    #[error("Connection request not found")]
    NotFound,

    /// Only the recipient of a request may resolve it
    #[error("Only the recipient may resolve this request")]
    Forbidden,

    /// The request is no longer pending
    #[error("Request has already been resolved")]
    InvalidTransition,

    /// The store could not serve the operation
    #[error("Storage unavailable")]
    StorageUnavailable(#[source] StoreError),
}

fn storage(err: StoreError) -> EngineError {
    EngineError::StorageUnavailable(err)
}

/// Validates and applies state transitions on connection requests.
#[derive(Clone)]
pub struct LifecycleEngine<S, D> {
    store: S,
    directory: D,
}

impl<S, D> LifecycleEngine<S, D>
where
    S: ConnectionStore,
    D: UserDirectory,
{
    /// Create a new lifecycle engine
    pub fn new(store: S, directory: D) -> Self {
        Self { store, directory }
    }

    /// Create a pending connection request from `caller` to `target`.
    pub async fn send(
        &self,
        caller: Uuid,
        target: Uuid,
    ) -> Result<ConnectionRequest, EngineError> {
        info!("Connection request from {} to {}", caller, target);

        if caller == target {
            return Err(EngineError::InvalidTarget);
        }

        if self
            .directory
            .find_by_id(target)
            .await
            .map_err(storage)?
            .is_none()
        {
            return Err(EngineError::InvalidTarget);
        }

        // Friendly pre-check. The unique index behind insert_if_absent is
        // what actually closes the race window.
        if self
            .store
            .find_active_by_pair(caller, target)
            .await
            .map_err(storage)?
            .is_some()
        {
            return Err(EngineError::DuplicateRequest);
        }

        match self
            .store
            .insert_if_absent(NewConnectionRequest {
                from_user_id: caller,
                to_user_id: target,
            })
            .await
        {
            Ok(request) => Ok(request),
            Err(StoreError::Conflict) => Err(EngineError::DuplicateRequest),
            Err(err) => Err(storage(err)),
        }
    }

    /// Apply the recipient's decision to a pending request.
    pub async fn resolve(
        &self,
        caller: Uuid,
        request_id: Uuid,
        decision: ResolveDecision,
    ) -> Result<ConnectionRequest, EngineError> {
        info!("Resolving request {} as {:?} by {}", request_id, decision, caller);

        let request = self
            .store
            .find_by_id(request_id)
            .await
            .map_err(storage)?
            .ok_or(EngineError::NotFound)?;

        if request.to_user_id != caller {
            return Err(EngineError::Forbidden);
        }

        if !request.status.accepts_transition_to(decision.as_status()) {
            return Err(EngineError::InvalidTransition);
        }

        match self
            .store
            .update_status(request_id, RequestStatus::Pending, decision.as_status())
            .await
        {
            Ok(updated) => Ok(updated),
            // A concurrent resolve won; the request is no longer pending.
            Err(StoreError::Conflict) => Err(EngineError::InvalidTransition),
            Err(err) => Err(storage(err)),
        }
    }

    /// Pending requests addressed to `caller`, with the senders' cards.
    pub async fn received_requests(
        &self,
        caller: Uuid,
    ) -> Result<Vec<ReceivedRequest>, EngineError> {
        let requests = self
            .store
            .list_pending_for_recipient(caller)
            .await
            .map_err(storage)?;

        let sender_ids: Vec<Uuid> = requests.iter().map(|r| r.from_user_id).collect();
        let senders = self.load_cards(&sender_ids).await?;

        Ok(requests
            .into_iter()
            .filter_map(|request| {
                let sender = senders.get(&request.from_user_id).cloned()?;
                Some(ReceivedRequest { request, sender })
            })
            .collect())
    }

    /// Established connections of `caller` as user cards.
    pub async fn connections(&self, caller: Uuid) -> Result<Vec<UserCard>, EngineError> {
        let accepted = self.store.list_accepted_for(caller).await.map_err(storage)?;

        let partner_ids: Vec<Uuid> = accepted
            .iter()
            .map(|request| request.counterpart_of(caller))
            .collect();
        let partners = self.load_cards(&partner_ids).await?;

        Ok(partner_ids
            .iter()
            .filter_map(|id| partners.get(id).cloned())
            .collect())
    }

    async fn load_cards(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, UserCard>, EngineError> {
        let users = self.directory.find_many(ids).await.map_err(storage)?;
        Ok(users
            .into_iter()
            .map(|user| (user.id, UserCard::from(user)))
            .collect())
    }
}
