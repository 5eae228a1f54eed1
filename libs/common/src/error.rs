//! Shared error types for the common library

use sqlx::Error as SqlxError;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Error type for database infrastructure operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred while establishing a database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while applying migrations
    #[error("Database migration error: {0}")]
    Migration(#[source] MigrateError),

    /// Invalid or missing configuration
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
