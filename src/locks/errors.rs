//! # Lock Errors

use thiserror::Error;

/// Result type for lock operations
pub type LockResult<T> = Result<T, LockError>;

/// File lock errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// Another owner holds an unexpired lock on the path
    #[error("File is locked by {owner_name}")]
    Held { owner_name: String },

    /// Release or refresh attempted without holding the lock
    #[error("No lock held on this path by the caller")]
    NotHeld,

    /// Persistence failure
    #[error("Lock storage error: {0}")]
    Storage(String),
}

impl LockError {
    /// HTTP status code for adapters
    pub fn status_code(&self) -> u16 {
        match self {
            LockError::Held { .. } => 423,
            LockError::NotHeld => 409,
            LockError::Storage(_) => 500,
        }
    }
}
