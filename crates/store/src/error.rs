use std::time::Duration;

use domain::{DomainError, ErrorKind};
use thiserror::Error;

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A business rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The stored version did not match the version the caller read.
    #[error("Concurrency conflict for {entity} {id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        entity: &'static str,
        id: String,
        expected: u64,
        actual: u64,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A compound operation did not finish before its deadline.
    #[error("Transaction timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Domain(e) => e.kind(),
            StoreError::ConcurrencyConflict { .. } => ErrorKind::Conflict,
            StoreError::Database(_)
            | StoreError::Migration(_)
            | StoreError::Serialization(_)
            | StoreError::Timeout(_) => ErrorKind::Infrastructure,
        }
    }

    /// Returns true if the error is a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
