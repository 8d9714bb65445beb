//! # Quota Limit Provider
//!
//! Limits live at the persistence tier (per-user settings, drive settings);
//! this trait is the lookup seam. A limit of 0 means unlimited.

use std::collections::HashMap;
use std::sync::RwLock;

use super::errors::{QuotaError, QuotaResult};
use super::tracker::QuotaScope;

/// Limit lookup seam.
pub trait QuotaLimitProvider: Send + Sync {
    /// Limit in bytes for a scope; 0 = unlimited.
    fn limit_for(&self, scope: &QuotaScope) -> QuotaResult<u64>;
}

/// In-memory limit table for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct InMemoryQuotaLimits {
    limits: RwLock<HashMap<QuotaScope, u64>>,
}

impl InMemoryQuotaLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_limit(&self, scope: QuotaScope, limit_bytes: u64) {
        if let Ok(mut limits) = self.limits.write() {
            limits.insert(scope, limit_bytes);
        }
    }
}

impl QuotaLimitProvider for InMemoryQuotaLimits {
    fn limit_for(&self, scope: &QuotaScope) -> QuotaResult<u64> {
        let limits = self
            .limits
            .read()
            .map_err(|_| QuotaError::Storage("Lock poisoned".into()))?;
        Ok(limits.get(scope).copied().unwrap_or(0))
    }
}
