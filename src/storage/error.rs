//! Storage error types
//!
//! Defines all errors that can occur in the storage layer. `Duplicate`,
//! `InFlight` and `QuotaExceeded` are expected outcomes a caller reports to
//! the user; the rest are unexpected failures.

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A unique constraint rejected the write
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Requested object or record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A request for this control key is already pending
    #[error("Request already in flight for '{0}'")]
    InFlight(String),

    /// The upload would push the owner past their plan's quota
    #[error("Storage quota exceeded: {used} bytes used + {incoming} bytes > {quota} bytes")]
    QuotaExceeded { used: u64, incoming: u64, quota: u64 },

    /// Signed URL token unknown or past its expiry
    #[error("Signed URL expired or invalid")]
    SignedUrlExpired,

    /// Caller supplied an invalid value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl StorageError {
    /// Whether the error is an expected validation outcome rather than a fault
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            StorageError::Duplicate(_)
                | StorageError::InFlight(_)
                | StorageError::QuotaExceeded { .. }
                | StorageError::NotFound(_)
                | StorageError::InvalidInput(_)
        )
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                StorageError::Duplicate(message.clone().unwrap_or_else(|| err.to_string()))
            }
            rusqlite::Error::QueryReturnedNoRows => StorageError::NotFound(err.to_string()),
            _ => StorageError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        StorageError::Lock(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
