//! Error types for the device registry

use thiserror::Error;

/// Errors that can occur when working with the device registry
#[derive(Debug, Error)]
pub enum DbError {
    /// The identity is not part of the provisioned roster
    #[error("Student {0} not found")]
    NotFound(String),

    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// A stored row could not be turned back into a record
    #[error("Corrupt device record {id}: {message}")]
    CorruptRecord { id: String, message: String },
}
