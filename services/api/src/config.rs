//! Service configuration
//!
//! Tunables come from `APP_`-prefixed environment variables through the
//! `config` crate; infrastructure URLs (`DATABASE_URL`, `REDIS_URL`) are
//! handled by their own modules in `common`.

use anyhow::Result;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Feed page size when the caller does not ask for one
    #[serde(default = "default_feed_page")]
    pub feed_page_default: u32,

    /// Upper bound on the feed page size
    #[serde(default = "default_feed_page_max")]
    pub feed_page_max: u32,

    /// When true, ignoring a request also hides the recipient from the
    /// sender's feed. Defaults to false: ignoring is private to the
    /// recipient.
    #[serde(default)]
    pub ignored_blocks_sender: bool,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_feed_page() -> u32 {
    10
}

fn default_feed_page_max() -> u32 {
    100
}

impl AppConfig {
    /// Load settings from `APP_*` environment variables
    /// (e.g. `APP_BIND_ADDR`, `APP_IGNORED_BLOCKS_SENDER`).
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("APP").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

/// Location of the identity provider's RS256 public key
#[derive(Debug, Clone)]
pub struct SessionKeyConfig {
    /// Public key for verifying session tokens
    pub public_key: String,
}

impl SessionKeyConfig {
    /// Create a new SessionKeyConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PUBLIC_KEY`: Public key in PEM format, or a path to a PEM file
    pub fn from_env() -> Result<Self> {
        let public_key = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PUBLIC_KEY environment variable not set"))?;

        // If the public key looks like a file path, read from file (try CWD,
        // then project root)
        let public_key = if public_key.starts_with("-----BEGIN") {
            public_key
        } else {
            std::fs::read_to_string(&public_key)
                .or_else(|_| {
                    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
                    path.push(&public_key);
                    std::fs::read_to_string(path)
                })
                .map_err(|e| anyhow::anyhow!("Failed to read public key file: {}", e))?
                .trim()
                .to_string()
        };

        Ok(SessionKeyConfig { public_key })
    }

    /// Build the jsonwebtoken decoding key.
    pub fn decoding_key(&self) -> Result<jsonwebtoken::DecodingKey> {
        jsonwebtoken::DecodingKey::from_rsa_pem(self.public_key.as_bytes())
            .map_err(|e| anyhow::anyhow!("Invalid session public key: {}", e))
    }
}
