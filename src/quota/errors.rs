//! # Quota Errors

use thiserror::Error;

/// Result type for quota operations
pub type QuotaResult<T> = Result<T, QuotaError>;

/// Quota errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuotaError {
    /// Admission-time denial; carries exact numbers so rejections are
    /// precise and user-visible
    #[error("Quota exceeded: {required} bytes required, {remaining} remaining (used {used} of {limit})")]
    Exceeded {
        required: u64,
        remaining: u64,
        used: u64,
        limit: u64,
    },

    /// Usage walk failed
    #[error("Quota usage scan failed: {0}")]
    Io(String),

    /// Limit lookup failed at the persistence tier
    #[error("Quota limit lookup failed: {0}")]
    Storage(String),
}

impl QuotaError {
    /// HTTP status code for adapters
    pub fn status_code(&self) -> u16 {
        match self {
            QuotaError::Exceeded { .. } => 507,
            QuotaError::Io(_) => 500,
            QuotaError::Storage(_) => 500,
        }
    }
}
