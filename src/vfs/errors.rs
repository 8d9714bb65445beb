//! # Virtual Filesystem Errors

use thiserror::Error;

/// Result type for path resolution
pub type VfsResult<T> = Result<T, VfsError>;

/// Path resolution errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    /// Malformed or escaping input; never retried
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The path requires an authenticated actor
    #[error("Authentication required")]
    Unauthorized,

    /// First segment names no known storage root
    #[error("Unknown storage root: {0}")]
    InvalidStorageType(String),

    /// Resolved target does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl VfsError {
    /// HTTP status code for adapters
    pub fn status_code(&self) -> u16 {
        match self {
            VfsError::InvalidPath(_) => 400,
            VfsError::Unauthorized => 401,
            VfsError::InvalidStorageType(_) => 400,
            VfsError::NotFound(_) => 404,
        }
    }
}
