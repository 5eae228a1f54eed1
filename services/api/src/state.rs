//! Application state shared across handlers

use common::cache::RedisPool;
use jsonwebtoken::DecodingKey;

use crate::engine::LifecycleEngine;
use crate::feed::FeedGenerator;
use crate::repositories::{PgConnectionStore, PgUserDirectory};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: LifecycleEngine<PgConnectionStore, PgUserDirectory>,
    pub feed: FeedGenerator<PgConnectionStore, PgUserDirectory>,
    pub redis: RedisPool,
    pub decoding_key: DecodingKey,
}
