//! Discoverable-users feed
//!
//! Computes, for a viewer, the users not yet in any pending or resolved
//! relationship with them. Read-only: never creates or mutates connection
//! state, and tolerates slightly stale exclusion data under concurrent
//! writes.

use uuid::Uuid;

use crate::engine::EngineError;
use crate::models::FeedPage;
use crate::models::user::UserCard;
use crate::pagination::Cursor;
use crate::repositories::{ConnectionStore, UserDirectory};

/// Feed behavior knobs, sourced from [`crate::config::AppConfig`]
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Page size when the caller does not ask for one
    pub page_default: u32,
    /// Upper bound on the page size
    pub page_max: u32,
    /// When true, an ignored request also hides the recipient from the
    /// sender's feed. Off by default: ignoring stays private to the
    /// recipient.
    pub ignored_blocks_sender: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_default: 10,
            page_max: 100,
            ignored_blocks_sender: false,
        }
    }
}

/// Computes feed pages for a viewer.
#[derive(Clone)]
pub struct FeedGenerator<S, D> {
    store: S,
    directory: D,
    config: FeedConfig,
}

impl<S, D> FeedGenerator<S, D>
where
    S: ConnectionStore,
    D: UserDirectory,
{
    /// Create a new feed generator
    pub fn new(store: S, directory: D, config: FeedConfig) -> Self {
        Self {
            store,
            directory,
            config,
        }
    }

    /// One page of discoverable users for `viewer`, strictly after `cursor`.
    pub async fn page(
        &self,
        viewer: Uuid,
        cursor: Option<Cursor>,
        limit: Option<u32>,
    ) -> Result<FeedPage, EngineError> {
        let limit = limit
            .unwrap_or(self.config.page_default)
            .clamp(1, self.config.page_max);

        let mut excluded = self
            .store
            .list_exclusions(viewer, self.config.ignored_blocks_sender)
            .await
            .map_err(EngineError::StorageUnavailable)?;
        excluded.push(viewer);

        // One extra row decides whether another page exists.
        let mut users = self
            .directory
            .list_candidates(&excluded, cursor.as_ref(), limit.saturating_add(1))
            .await
            .map_err(EngineError::StorageUnavailable)?;

        let next_cursor = if users.len() > limit as usize {
            users.truncate(limit as usize);
            users.last().map(|user| Cursor::after(user).encode())
        } else {
            None
        };

        Ok(FeedPage {
            users: users.into_iter().map(UserCard::from).collect(),
            next_cursor,
        })
    }
}
