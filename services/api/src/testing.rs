//! In-memory contract implementations for engine and feed tests
//!
//! Both doubles hold their state behind a single mutex and never await
//! while holding it, so every operation is atomic with respect to
//! concurrent callers, mirroring the serialization the production store
//! gets from its unique index and conditional UPDATE.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::models::connection::{ConnectionRequest, NewConnectionRequest, RequestStatus};
use crate::models::user::User;
use crate::pagination::Cursor;
use crate::repositories::{ConnectionStore, StoreError, StoreResult, UserDirectory};

/// Build a user whose `created_at` is offset by `created_offset_secs` from a
/// fixed base, keeping feed ordering deterministic across test runs.
pub fn test_user(display_name: &str, created_offset_secs: i64) -> User {
    let base = Utc::now() - Duration::hours(1);
    let created_at = base + Duration::seconds(created_offset_secs);
    User {
        id: Uuid::new_v4(),
        display_name: display_name.to_string(),
        interests: vec!["rust".to_string()],
        bio: None,
        created_at,
        updated_at: created_at,
    }
}

/// Normalize a pair of user ids so that {A, B} and {B, A} compare equal,
/// the in-memory analogue of the store's LEAST/GREATEST index key.
fn unordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

fn occupies_active_slot(status: RequestStatus) -> bool {
    matches!(status, RequestStatus::Pending | RequestStatus::Accepted)
}

/// In-memory connection store
#[derive(Clone, Default)]
pub struct MemStore {
    requests: Arc<Mutex<HashMap<Uuid, ConnectionRequest>>>,
}

#[async_trait]
impl ConnectionStore for MemStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<ConnectionRequest>> {
        let requests = self.requests.lock().expect("lock poisoned");
        Ok(requests.get(&id).cloned())
    }

    async fn find_active_by_pair(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> StoreResult<Option<ConnectionRequest>> {
        let requests = self.requests.lock().expect("lock poisoned");
        let key = unordered_pair(a, b);
        Ok(requests
            .values()
            .find(|r| occupies_active_slot(r.status) && unordered_pair(r.from_user_id, r.to_user_id) == key)
            .cloned())
    }

    async fn insert_if_absent(&self, new: NewConnectionRequest) -> StoreResult<ConnectionRequest> {
        let mut requests = self.requests.lock().expect("lock poisoned");

        let key = unordered_pair(new.from_user_id, new.to_user_id);
        let occupied = requests
            .values()
            .any(|r| occupies_active_slot(r.status) && unordered_pair(r.from_user_id, r.to_user_id) == key);
        if occupied {
            return Err(StoreError::Conflict);
        }

        let now = Utc::now();
        let request = ConnectionRequest {
            id: Uuid::new_v4(),
            from_user_id: new.from_user_id,
            to_user_id: new.to_user_id,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: RequestStatus,
        new_status: RequestStatus,
    ) -> StoreResult<ConnectionRequest> {
        let mut requests = self.requests.lock().expect("lock poisoned");

        match requests.get_mut(&id) {
            Some(request) if request.status == expected => {
                request.status = new_status;
                request.updated_at = Utc::now();
                Ok(request.clone())
            }
            _ => Err(StoreError::Conflict),
        }
    }

    async fn list_exclusions(
        &self,
        user_id: Uuid,
        ignored_blocks_sender: bool,
    ) -> StoreResult<Vec<Uuid>> {
        let requests = self.requests.lock().expect("lock poisoned");
        Ok(requests
            .values()
            .filter(|r| r.from_user_id == user_id || r.to_user_id == user_id)
            .filter(|r| match r.status {
                RequestStatus::Pending | RequestStatus::Accepted => true,
                RequestStatus::Ignored => r.to_user_id == user_id || ignored_blocks_sender,
                RequestStatus::Rejected => false,
            })
            .map(|r| r.counterpart_of(user_id))
            .collect())
    }

    async fn list_pending_for_recipient(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<ConnectionRequest>> {
        let requests = self.requests.lock().expect("lock poisoned");
        let mut pending: Vec<ConnectionRequest> = requests
            .values()
            .filter(|r| r.to_user_id == user_id && r.status == RequestStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    async fn list_accepted_for(&self, user_id: Uuid) -> StoreResult<Vec<ConnectionRequest>> {
        let requests = self.requests.lock().expect("lock poisoned");
        let mut accepted: Vec<ConnectionRequest> = requests
            .values()
            .filter(|r| {
                r.status == RequestStatus::Accepted
                    && (r.from_user_id == user_id || r.to_user_id == user_id)
            })
            .cloned()
            .collect();
        accepted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(accepted)
    }
}

/// In-memory user directory
#[derive(Clone, Default)]
pub struct MemDirectory {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl MemDirectory {
    /// Register a user and return its id.
    pub fn insert(&self, user: User) -> Uuid {
        let id = user.id;
        self.users.lock().expect("lock poisoned").insert(id, user);
        id
    }
}

#[async_trait]
impl UserDirectory for MemDirectory {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.lock().expect("lock poisoned");
        Ok(users.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let users = self.users.lock().expect("lock poisoned");
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn list_candidates(
        &self,
        excluding: &[Uuid],
        after: Option<&Cursor>,
        limit: u32,
    ) -> StoreResult<Vec<User>> {
        let users = self.users.lock().expect("lock poisoned");
        let mut candidates: Vec<User> = users
            .values()
            .filter(|u| !excluding.contains(&u.id))
            .filter(|u| match after {
                Some(cursor) => (u.created_at, u.id) > (cursor.created_at, cursor.id),
                None => true,
            })
            .cloned()
            .collect();
        candidates.sort_by_key(|u| (u.created_at, u.id));
        candidates.truncate(limit as usize);
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unordered_pair_is_direction_agnostic() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(unordered_pair(a, b), unordered_pair(b, a));
    }
}
