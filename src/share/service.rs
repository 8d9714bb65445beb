//! # Share Token Service
//!
//! Issue and validate capability tokens. Validation is an ordered
//! short-circuit chain; the order is part of the contract because it
//! bounds what an adversarial caller can learn: existence first, then
//! liveness, then the informational login/password signals, and only then
//! credential verification and the atomic access grant.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::vfs::Resolved;

use super::crypto::{hash_password, verify_password};
use super::errors::{DenyReason, ShareError, ShareResult};
use super::link::{ShareLink, ShareType, UploadConstraints};
use super::repository::{AccessGrant, ShareLinkRepository};

/// Parameters for creating a link.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    /// Resolver output for the target; links bind to canonical paths
    pub target: Resolved,
    pub created_by: Uuid,
    pub share_type: ShareType,
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_access: Option<u64>,
    pub require_login: bool,
    pub constraints: UploadConstraints,
}

impl IssueRequest {
    pub fn new(target: Resolved, created_by: Uuid, share_type: ShareType) -> Self {
        Self {
            target,
            created_by,
            share_type,
            password: None,
            expires_at: None,
            max_access: None,
            require_login: false,
            constraints: UploadConstraints::default(),
        }
    }
}

/// What the bearer presented alongside the token.
#[derive(Debug, Clone, Default)]
pub struct ShareCredentials {
    /// Whether the caller is also logged in
    pub authenticated: bool,
    pub password: Option<String>,
}

impl ShareCredentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            password: Some(password.into()),
        }
    }
}

/// Successful validation outcomes. `LoginRequired` and `PasswordRequired`
/// are informational signals for the caller, not failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ShareAccess {
    /// Access granted; the counter was already incremented
    Granted(ShareLink),
    LoginRequired,
    PasswordRequired,
}

/// Capability-token issue/validate service.
pub struct ShareTokenService<R: ShareLinkRepository> {
    repository: R,
}

impl<R: ShareLinkRepository> ShareTokenService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Issue a new link against a resolved target.
    ///
    /// Upload links must target a directory under a writable root. A token
    /// collision at the storage layer propagates as a hard error.
    pub fn issue(&self, request: IssueRequest) -> ShareResult<ShareLink> {
        if request.share_type == ShareType::Upload {
            let is_upload_dir = request.target.root.accepts_uploads()
                && request
                    .target
                    .real_path
                    .as_deref()
                    .is_some_and(|p| p.is_dir());
            if !is_upload_dir {
                return Err(ShareError::NotADirectory(request.target.canonical.clone()));
            }
        }

        let mut link = ShareLink::new(
            request.target.canonical,
            request.created_by,
            request.share_type,
        );
        link.expires_at = request.expires_at;
        link.max_access = request.max_access;
        link.require_login = request.require_login;
        link.constraints = request.constraints;
        link.password_hash = match request.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        self.repository.insert(&link)?;
        Ok(link)
    }

    /// Validate a bearer token.
    ///
    /// Step order: lookup, active flag, expiry, ceiling pre-check, login
    /// requirement, password, then the atomic increment that actually
    /// grants access. A revoked-and-deleted link answers exactly like one
    /// that never existed.
    pub fn validate(&self, token: &str, credentials: &ShareCredentials) -> ShareResult<ShareAccess> {
        let mut link = self
            .repository
            .find_by_token(token)?
            .ok_or(ShareError::Denied(DenyReason::NotFound))?;

        if !link.is_active {
            return Err(ShareError::Denied(DenyReason::Gone));
        }
        if link.is_expired_at(Utc::now()) {
            return Err(ShareError::Denied(DenyReason::Gone));
        }
        if link.at_ceiling() {
            return Err(ShareError::Denied(DenyReason::Gone));
        }

        if link.require_login && !credentials.authenticated {
            return Ok(ShareAccess::LoginRequired);
        }

        if let Some(hash) = &link.password_hash {
            match credentials.password.as_deref() {
                None => return Ok(ShareAccess::PasswordRequired),
                Some(password) if !verify_password(password, hash) => {
                    return Err(ShareError::Denied(DenyReason::InvalidCredential));
                }
                Some(_) => {}
            }
        }

        match self
            .repository
            .increment_access_if_below(token, link.max_access)?
        {
            AccessGrant::Granted => {
                link.access_count += 1;
                Ok(ShareAccess::Granted(link))
            }
            AccessGrant::CeilingReached => Err(ShareError::Denied(DenyReason::Gone)),
        }
    }

    /// Account one completed upload against an upload link.
    pub fn record_upload(&self, token: &str, size: u64) -> ShareResult<ShareLink> {
        self.repository.add_uploaded(token, size)
    }

    /// Turn a link off without deleting its history.
    pub fn revoke(&self, token: &str) -> ShareResult<()> {
        self.repository.set_active(token, false)
    }

    /// Remove a link entirely; afterwards its token reads as NotFound.
    pub fn delete(&self, token: &str) -> ShareResult<()> {
        self.repository.delete(token)
    }

    /// Links created by one user.
    pub fn list_for(&self, created_by: Uuid) -> ShareResult<Vec<ShareLink>> {
        self.repository.list_by_creator(created_by)
    }
}
