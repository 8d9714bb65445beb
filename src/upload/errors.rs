//! # Upload Errors

use std::path::PathBuf;
use thiserror::Error;

use crate::quota::QuotaError;
use crate::share::ShareError;
use crate::vfs::VfsError;

use super::session::SessionState;

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Upload pipeline errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// Filename failed validation; the message names the exact rule
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    /// Extension is on the executable/script denylist
    #[error("File extension not allowed: .{0}")]
    ExtensionDenied(String),

    /// Destination resolves but cannot accept uploads (virtual root, or
    /// the shared root instead of a named drive)
    #[error("Invalid upload destination: {0}")]
    InvalidDestination(String),

    /// Destination failed path resolution
    #[error(transparent)]
    Path(#[from] VfsError),

    /// Admission denied on quota
    #[error(transparent)]
    Quota(#[from] QuotaError),

    /// Share-link sub-policy rejected this file
    #[error(transparent)]
    Share(#[from] ShareError),

    /// Post-transfer move failed; the temporary blob is preserved for the
    /// operator, never deleted or retried here
    #[error("Reconcile failed, temporary blob preserved at {}: {reason}", .temp_path.display())]
    ReconcileFailed { temp_path: PathBuf, reason: String },

    /// Session lifecycle violation
    #[error("Invalid session state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    /// Completion queue shut down
    #[error("Completion queue closed")]
    QueueClosed,
}

impl UploadError {
    /// HTTP status code for adapters
    pub fn status_code(&self) -> u16 {
        match self {
            UploadError::InvalidFilename(_) => 400,
            UploadError::ExtensionDenied(_) => 415,
            UploadError::InvalidDestination(_) => 400,
            UploadError::Path(e) => e.status_code(),
            UploadError::Quota(e) => e.status_code(),
            UploadError::Share(e) => e.status_code(),
            UploadError::ReconcileFailed { .. } => 500,
            UploadError::InvalidTransition { .. } => 500,
            UploadError::QueueClosed => 503,
        }
    }
}
