//! # Concurrency Tracking
//!
//! Two unrelated mechanisms live here. Persisted [`FileLock`]s give a
//! caller exclusive editing rights on one path until released or expired.
//! In-memory [`UploadMarks`] flag freshly reconciled paths for a short
//! grace window so the external filesystem watcher does not double-log a
//! web write; they are best-effort and never a correctness mechanism.

pub mod errors;
pub mod file_lock;
pub mod marks;

pub use errors::{LockError, LockResult};
pub use file_lock::{FileLock, FileLockRepository, InMemoryFileLockRepository, LockService};
pub use marks::UploadMarks;
