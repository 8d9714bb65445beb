//! # Quota Tracker
//!
//! Admission-time headroom checks. Home destinations consult the owning
//! user's quota only; shared-drive destinations consult the drive's own
//! quota only. The usage figure is a recursive byte sum over the scope's
//! directory, taken fresh for every decision.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::StorageLayout;

use super::errors::{QuotaError, QuotaResult};
use super::limits::QuotaLimitProvider;

/// What a quota applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuotaScope {
    /// One user's home namespace
    User(String),
    /// One shared drive
    SharedDrive(String),
}

impl QuotaScope {
    pub fn describe(&self) -> String {
        match self {
            QuotaScope::User(name) => format!("user:{}", name),
            QuotaScope::SharedDrive(drive) => format!("drive:{}", drive),
        }
    }
}

/// Outcome of a headroom check, with exact numbers for rejection messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headroom {
    pub allowed: bool,
    /// 0 = unlimited
    pub limit_bytes: u64,
    pub used_bytes: u64,
    pub remaining_bytes: u64,
    pub required_bytes: u64,
}

impl Headroom {
    /// Convert a denial into the error adapters surface to the user.
    pub fn into_result(self) -> QuotaResult<Headroom> {
        if self.allowed {
            Ok(self)
        } else {
            Err(QuotaError::Exceeded {
                required: self.required_bytes,
                remaining: self.remaining_bytes,
                used: self.used_bytes,
                limit: self.limit_bytes,
            })
        }
    }
}

/// Admission-time quota enforcement over a storage layout.
#[derive(Debug)]
pub struct QuotaTracker<P: QuotaLimitProvider> {
    layout: StorageLayout,
    limits: P,
}

impl<P: QuotaLimitProvider> QuotaTracker<P> {
    pub fn new(layout: StorageLayout, limits: P) -> Self {
        Self { layout, limits }
    }

    /// Check whether `additional_bytes` fit inside the scope's limit.
    ///
    /// A zero-byte admission is always allowed, as is any admission against
    /// an unlimited (0) scope; the unlimited case short-circuits before the
    /// usage walk. Errors here are infrastructure failures, not denials.
    pub fn check_headroom(&self, scope: &QuotaScope, additional_bytes: u64) -> QuotaResult<Headroom> {
        let limit = self.limits.limit_for(scope)?;

        if limit == 0 {
            return Ok(Headroom {
                allowed: true,
                limit_bytes: 0,
                used_bytes: 0,
                remaining_bytes: u64::MAX,
                required_bytes: additional_bytes,
            });
        }

        let used = self.used_bytes(scope)?;
        let remaining = limit.saturating_sub(used);
        let allowed = additional_bytes == 0 || used.saturating_add(additional_bytes) <= limit;

        Ok(Headroom {
            allowed,
            limit_bytes: limit,
            used_bytes: used,
            remaining_bytes: remaining,
            required_bytes: additional_bytes,
        })
    }

    /// The limit provider this tracker consults.
    pub fn limits(&self) -> &P {
        &self.limits
    }

    /// Current usage of a scope, straight from the filesystem.
    pub fn used_bytes(&self, scope: &QuotaScope) -> QuotaResult<u64> {
        dir_size(&self.scope_dir(scope))
    }

    fn scope_dir(&self, scope: &QuotaScope) -> PathBuf {
        match scope {
            QuotaScope::User(username) => self.layout.user_home(username),
            QuotaScope::SharedDrive(drive) => self.layout.drive_dir(drive),
        }
    }
}

/// Recursive byte sum. A missing directory counts as empty; symlinks are
/// counted by their own size, never followed.
fn dir_size(dir: &Path) -> QuotaResult<u64> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut total = 0u64;
    let entries = fs::read_dir(dir).map_err(|e| QuotaError::Io(e.to_string()))?;

    for entry in entries {
        let entry = entry.map_err(|e| QuotaError::Io(e.to_string()))?;
        let metadata = entry
            .path()
            .symlink_metadata()
            .map_err(|e| QuotaError::Io(e.to_string()))?;

        if metadata.is_dir() {
            total = total.saturating_add(dir_size(&entry.path())?);
        } else {
            total = total.saturating_add(metadata.len());
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::limits::InMemoryQuotaLimits;
    use std::fs;
    use tempfile::TempDir;

    fn tracker_with(temp: &TempDir) -> (QuotaTracker<InMemoryQuotaLimits>, StorageLayout) {
        let layout = StorageLayout::new(temp.path().join("homes"), temp.path().join("shared"));
        (
            QuotaTracker::new(layout.clone(), InMemoryQuotaLimits::new()),
            layout,
        )
    }

    fn write_file(path: &Path, len: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; len]).unwrap();
    }

    #[test]
    fn test_unlimited_short_circuits() {
        let temp = TempDir::new().unwrap();
        let (tracker, _) = tracker_with(&temp);

        let headroom = tracker
            .check_headroom(&QuotaScope::User("alice".into()), u64::MAX)
            .unwrap();
        assert!(headroom.allowed);
        assert_eq!(headroom.limit_bytes, 0);
    }

    #[test]
    fn test_zero_byte_admission_always_allowed() {
        let temp = TempDir::new().unwrap();
        let (tracker, layout) = tracker_with(&temp);
        let scope = QuotaScope::User("alice".into());

        tracker.limits.set_limit(scope.clone(), 10);
        write_file(&layout.user_home("alice").join("big.bin"), 50);

        // Already over the limit; a zero-byte admission is still allowed.
        let headroom = tracker.check_headroom(&scope, 0).unwrap();
        assert!(headroom.allowed);
        assert_eq!(headroom.used_bytes, 50);
        assert_eq!(headroom.remaining_bytes, 0);
    }

    #[test]
    fn test_exact_numbers_on_denial() {
        let temp = TempDir::new().unwrap();
        let (tracker, layout) = tracker_with(&temp);
        let scope = QuotaScope::User("alice".into());

        tracker.limits.set_limit(scope.clone(), 1000);
        write_file(&layout.user_home("alice").join("used.bin"), 900);

        let headroom = tracker.check_headroom(&scope, 150).unwrap();
        assert!(!headroom.allowed);
        assert_eq!(headroom.used_bytes, 900);
        assert_eq!(headroom.remaining_bytes, 100);

        let err = headroom.into_result().unwrap_err();
        assert!(matches!(
            err,
            QuotaError::Exceeded {
                required: 150,
                remaining: 100,
                used: 900,
                limit: 1000,
            }
        ));
    }

    #[test]
    fn test_fit_within_limit() {
        let temp = TempDir::new().unwrap();
        let (tracker, layout) = tracker_with(&temp);
        let scope = QuotaScope::SharedDrive("team".into());

        tracker.limits.set_limit(scope.clone(), 1000);
        write_file(&layout.drive_dir("team").join("a/b/doc.bin"), 400);

        let headroom = tracker.check_headroom(&scope, 600).unwrap();
        assert!(headroom.allowed);
        assert_eq!(headroom.used_bytes, 400);
    }

    #[test]
    fn test_missing_scope_dir_counts_as_empty() {
        let temp = TempDir::new().unwrap();
        let (tracker, _) = tracker_with(&temp);
        let scope = QuotaScope::User("ghost".into());

        tracker.limits.set_limit(scope.clone(), 10);
        let headroom = tracker.check_headroom(&scope, 5).unwrap();
        assert!(headroom.allowed);
        assert_eq!(headroom.used_bytes, 0);
    }

    #[test]
    fn test_usage_is_recomputed_each_call() {
        let temp = TempDir::new().unwrap();
        let (tracker, layout) = tracker_with(&temp);
        let scope = QuotaScope::User("alice".into());
        tracker.limits.set_limit(scope.clone(), 100);

        assert!(tracker.check_headroom(&scope, 80).unwrap().allowed);

        write_file(&layout.user_home("alice").join("new.bin"), 60);
        assert!(!tracker.check_headroom(&scope, 80).unwrap().allowed);
    }
}
