//! # Upload Ingest Pipeline
//!
//! Admission-time validation before any bytes flow, and reconciliation of
//! completed transfers into their final location. Validation is
//! side-effect free; reconciliation runs on a background worker draining a
//! bounded completion queue and fires exactly once per session. A failed
//! move preserves the temporary blob and is reported, never retried and
//! never cleaned up automatically.

pub mod errors;
pub mod filename;
pub mod pipeline;
pub mod session;
pub mod worker;

pub use errors::{UploadError, UploadResult};
pub use filename::{unique_name, validate_filename};
pub use pipeline::{IngestPipeline, ReconcileOutcome};
pub use session::{AdmittedUpload, SessionState, UploadCompletion, UploadRequest, UploadSession};
pub use worker::{spawn_reconcile_worker, CompletionQueue};
