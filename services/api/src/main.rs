use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod config;
mod engine;
mod error;
mod feed;
mod middleware;
mod models;
mod pagination;
mod repositories;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use common::cache::{RedisConfig, RedisPool};
use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};

use crate::{
    config::{AppConfig, SessionKeyConfig},
    engine::LifecycleEngine,
    feed::{FeedConfig, FeedGenerator},
    repositories::{PgConnectionStore, PgUserDirectory},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting StudyLink API service");

    let app_config = AppConfig::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool, &sqlx::migrate!("./migrations")).await?;
    info!("Database migrations applied");

    // Initialize Redis connection pool
    let redis_config = RedisConfig::from_env()?;
    let redis = RedisPool::new(&redis_config).await?;

    // Public key of the external identity provider
    let session_keys = SessionKeyConfig::from_env()?;
    let decoding_key = session_keys.decoding_key()?;

    info!("API service initialized successfully");

    let store = PgConnectionStore::new(pool.clone());
    let directory = PgUserDirectory::new(pool.clone());

    let engine = LifecycleEngine::new(store.clone(), directory.clone());
    let feed = FeedGenerator::new(
        store,
        directory,
        FeedConfig {
            page_default: app_config.feed_page_default,
            page_max: app_config.feed_page_max,
            ignored_blocks_sender: app_config.ignored_blocks_sender,
        },
    );

    let app_state = AppState {
        engine,
        feed,
        redis,
        decoding_key,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&app_config.bind_addr).await?;
    info!("API service listening on {}", app_config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
