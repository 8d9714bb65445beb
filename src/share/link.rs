//! # Share Link Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::crypto::generate_token;
use super::errors::{ShareError, ShareResult};

/// What a link lets its bearer do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareType {
    /// Read the target file or directory
    Download,
    /// Drop files into the target directory
    Upload,
}

/// Sub-policy carried by upload links, enforced per file at ingest time.
/// A violation rejects that one file without invalidating the link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConstraints {
    /// Per-file byte cap; 0 = unlimited
    #[serde(default)]
    pub max_file_size: u64,

    /// Allowed extensions, compared case-insensitively; empty = all
    #[serde(default)]
    pub allowed_extensions: Vec<String>,

    /// Lifetime byte cap across all uploads through the link; 0 = unlimited
    #[serde(default)]
    pub max_total_size: u64,
}

impl Default for UploadConstraints {
    fn default() -> Self {
        Self {
            max_file_size: 0,
            allowed_extensions: Vec::new(),
            max_total_size: 0,
        }
    }
}

/// One persisted share link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub id: Uuid,

    /// Unique, high-entropy, URL-safe capability token
    pub token: String,

    /// Canonical virtual path of the target
    pub virtual_path: String,

    pub created_by: Uuid,
    pub share_type: ShareType,

    /// Argon2id hash; raw password never stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Ceiling on successful validations; None = unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_access: Option<u64>,
    pub access_count: u64,

    /// Bearer must also be an authenticated user
    pub require_login: bool,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,

    /// Upload links only
    #[serde(default)]
    pub constraints: UploadConstraints,
    pub total_uploaded_size: u64,
    pub upload_count: u64,
}

impl ShareLink {
    /// Create a new link with a fresh token.
    pub fn new(virtual_path: String, created_by: Uuid, share_type: ShareType) -> Self {
        Self {
            id: Uuid::new_v4(),
            token: generate_token(),
            virtual_path,
            created_by,
            share_type,
            password_hash: None,
            expires_at: None,
            max_access: None,
            access_count: 0,
            require_login: false,
            is_active: true,
            created_at: Utc::now(),
            constraints: UploadConstraints::default(),
            total_uploaded_size: 0,
            upload_count: 0,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expiry) if expiry <= now)
    }

    /// Whether the access counter has reached its ceiling.
    pub fn at_ceiling(&self) -> bool {
        matches!(self.max_access, Some(max) if self.access_count >= max)
    }

    /// Enforce the upload sub-policy against one incoming file.
    ///
    /// Ingest-time check, not validation-time: the link stays usable even
    /// when a particular file is rejected.
    pub fn check_upload(&self, filename: &str, size: u64) -> ShareResult<()> {
        let constraints = &self.constraints;

        if constraints.max_file_size > 0 && size > constraints.max_file_size {
            return Err(ShareError::FileTooLarge {
                size,
                max: constraints.max_file_size,
            });
        }

        if !constraints.allowed_extensions.is_empty() {
            let extension = filename
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .unwrap_or_default();
            let allowed = constraints
                .allowed_extensions
                .iter()
                .any(|e| e.to_ascii_lowercase() == extension);
            if !allowed {
                return Err(ShareError::ExtensionNotAllowed(extension));
            }
        }

        if constraints.max_total_size > 0 {
            let remaining = constraints
                .max_total_size
                .saturating_sub(self.total_uploaded_size);
            if size > remaining {
                return Err(ShareError::UploadQuotaExhausted {
                    required: size,
                    remaining,
                });
            }
        }

        Ok(())
    }
}
