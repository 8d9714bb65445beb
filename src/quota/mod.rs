//! # Storage Quotas
//!
//! Per-user and per-shared-drive byte ceilings, checked once at admission
//! time. This is a soft-quota system by design: the check is not
//! transactional, so two concurrent admissions can both pass and jointly
//! overshoot the limit by up to the sum of their declared sizes. Usage is
//! always recomputed from the filesystem at decision time, never trusted
//! from a cache.

pub mod errors;
pub mod limits;
pub mod tracker;

pub use errors::{QuotaError, QuotaResult};
pub use limits::{InMemoryQuotaLimits, QuotaLimitProvider};
pub use tracker::{Headroom, QuotaScope, QuotaTracker};
