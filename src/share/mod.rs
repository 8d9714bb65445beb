//! # Public Share Links
//!
//! Opaque capability tokens granting account-less access to one resolved
//! path under a bounded policy: optional password, expiry, access-count
//! ceiling, login requirement, and for upload links a per-file size cap, an
//! extension allowlist and a lifetime total-size bound.
//!
//! Token denials are deliberately low-information: a revoked-and-deleted
//! link is indistinguishable from one that never existed.

pub mod crypto;
pub mod errors;
pub mod link;
pub mod repository;
pub mod service;

pub use errors::{DenyReason, ShareError, ShareResult};
pub use link::{ShareLink, ShareType, UploadConstraints};
pub use repository::{AccessGrant, InMemoryShareLinkRepository, ShareLinkRepository};
pub use service::{IssueRequest, ShareAccess, ShareCredentials, ShareTokenService};
