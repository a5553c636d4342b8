//! Error types for the task store.
//!
//! [`StoreError`] is returned by every gateway, repository, and service
//! operation, and is the error carried by a failed live subscription.

use tasker_core::ValidationError;
use thiserror::Error;

/// Errors that can occur during task store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Which migration failed and why.
        message: String,
    },

    /// Filesystem error while preparing the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The task was rejected before any write was attempted.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A live subscription lost its store.
    #[error("live subscription closed: {0}")]
    SubscriptionClosed(String),

    /// Internal error (e.g. a panicked blocking task).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {e}"))
    }
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
