//! driftbox - access-control and storage core for a multi-tenant file host
//!
//! This crate sits between untrusted callers (web API, public share links,
//! WebDAV/SMB adapters) and a multi-tenant POSIX filesystem. It resolves
//! caller-facing virtual paths into contained real paths, enforces soft
//! storage quotas at admission time, drives the upload pipeline from
//! pre-flight validation through reconciliation, and implements the
//! capability-token state machine behind public share/upload links.
//!
//! Identity issuance, the WebDAV/SMB wire protocols, and audit persistence
//! are external collaborators; this core only consumes them through the
//! seams in [`share::ShareLinkRepository`], [`quota::QuotaLimitProvider`],
//! [`locks::FileLockRepository`] and [`audit::AuditSink`].

pub mod actor;
pub mod audit;
pub mod config;
pub mod locks;
pub mod quota;
pub mod share;
pub mod upload;
pub mod vfs;

pub use actor::Actor;
pub use audit::{AuditEvent, AuditSink, SourceTag};
pub use config::{CoreConfig, StorageLayout, UploadPolicy};
pub use quota::{QuotaScope, QuotaTracker};
pub use share::ShareTokenService;
pub use upload::IngestPipeline;
pub use vfs::{Resolved, Resolver, StorageRoot};
