//! # Share Link Errors

use thiserror::Error;

/// Result type for share operations
pub type ShareResult<T> = Result<T, ShareError>;

/// Why a token was denied. Kept terse on purpose: public callers learn as
/// little as possible about link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No such token (or it was deleted; callers cannot tell)
    NotFound,
    /// Existed but is revoked, expired or used up
    Gone,
    /// Password supplied and wrong
    InvalidCredential,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NotFound => "not_found",
            DenyReason::Gone => "gone",
            DenyReason::InvalidCredential => "invalid_credential",
        }
    }
}

/// Share link errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    /// Token rejected
    #[error("Share link denied: {}", .0.as_str())]
    Denied(DenyReason),

    /// Generated token already exists in storage; hard error by design
    #[error("Share token collision")]
    TokenCollision,

    /// Upload links must target an existing directory
    #[error("Upload links must target a directory: {0}")]
    NotADirectory(String),

    /// Per-file size cap on an upload link
    #[error("File too large for this link: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },

    /// Extension not on the link's allowlist
    #[error("File type not allowed on this link: {0}")]
    ExtensionNotAllowed(String),

    /// Lifetime total-size bound on an upload link
    #[error("Link upload quota exhausted: {required} bytes required, {remaining} remaining")]
    UploadQuotaExhausted { required: u64, remaining: u64 },

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Persistence failure
    #[error("Share link storage error: {0}")]
    Storage(String),
}

impl ShareError {
    /// HTTP status code for adapters
    pub fn status_code(&self) -> u16 {
        match self {
            ShareError::Denied(DenyReason::NotFound) => 404,
            ShareError::Denied(DenyReason::Gone) => 410,
            ShareError::Denied(DenyReason::InvalidCredential) => 401,
            ShareError::TokenCollision => 500,
            ShareError::NotADirectory(_) => 400,
            ShareError::FileTooLarge { .. } => 413,
            ShareError::ExtensionNotAllowed(_) => 415,
            ShareError::UploadQuotaExhausted { .. } => 507,
            ShareError::HashingFailed => 500,
            ShareError::Storage(_) => 500,
        }
    }
}
