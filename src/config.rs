//! # Core Configuration
//!
//! Explicit configuration objects injected at construction time. Nothing in
//! this crate reads ambient globals: the resolver, quota tracker and ingest
//! pipeline each receive the pieces they need, which keeps them
//! independently testable against a `tempfile::TempDir`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Physical base directories for the two storage namespaces.
///
/// A user's home is `home_base/<username>`; a shared drive is
/// `shared_base/<drive>`. Every resolved real path must remain a strict
/// descendant of one of these bases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLayout {
    pub home_base: PathBuf,
    pub shared_base: PathBuf,
}

impl StorageLayout {
    pub fn new(home_base: impl Into<PathBuf>, shared_base: impl Into<PathBuf>) -> Self {
        Self {
            home_base: home_base.into(),
            shared_base: shared_base.into(),
        }
    }

    /// Base directory of one user's home namespace.
    pub fn user_home(&self, username: &str) -> PathBuf {
        self.home_base.join(username)
    }

    /// Base directory of one shared drive.
    pub fn drive_dir(&self, drive: &str) -> PathBuf {
        self.shared_base.join(drive)
    }

    /// The base directory a path under this layout must stay inside.
    pub fn base_for(&self, path: &Path) -> Option<&Path> {
        if path.starts_with(&self.home_base) {
            Some(&self.home_base)
        } else if path.starts_with(&self.shared_base) {
            Some(&self.shared_base)
        } else {
            None
        }
    }
}

/// Upload validation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadPolicy {
    /// Extensions rejected outright (compared case-insensitively)
    #[serde(default = "default_denied_extensions")]
    pub denied_extensions: Vec<String>,

    /// Maximum filename length in bytes
    #[serde(default = "default_max_filename_len")]
    pub max_filename_len: usize,

    /// How many ` (n)` suffixes to try before falling back to a timestamp
    #[serde(default = "default_suffix_search_limit")]
    pub suffix_search_limit: u32,
}

fn default_denied_extensions() -> Vec<String> {
    [
        "exe", "bat", "cmd", "com", "scr", "pif", "msi", "ps1", "sh", "vbs", "js", "jar", "dll",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_filename_len() -> usize {
    255
}

fn default_suffix_search_limit() -> u32 {
    100
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            denied_extensions: default_denied_extensions(),
            max_filename_len: default_max_filename_len(),
            suffix_search_limit: default_suffix_search_limit(),
        }
    }
}

impl UploadPolicy {
    /// Whether the extension is on the denylist.
    pub fn is_extension_denied(&self, extension: &str) -> bool {
        let lower = extension.to_ascii_lowercase();
        self.denied_extensions.iter().any(|e| *e == lower)
    }
}

/// Top-level configuration for the storage core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub layout: StorageLayout,

    #[serde(default)]
    pub upload: UploadPolicy,

    /// Grace window during which a freshly reconciled path stays marked as a
    /// web upload, so the external filesystem watcher can skip it
    #[serde(default = "default_mark_grace_secs")]
    pub mark_grace_secs: u64,

    /// Capacity of the completion-event queue feeding the reconcile worker
    #[serde(default = "default_completion_queue_capacity")]
    pub completion_queue_capacity: usize,
}

fn default_mark_grace_secs() -> u64 {
    10
}

fn default_completion_queue_capacity() -> usize {
    256
}

impl CoreConfig {
    pub fn new(layout: StorageLayout) -> Self {
        Self {
            layout,
            upload: UploadPolicy::default(),
            mark_grace_secs: default_mark_grace_secs(),
            completion_queue_capacity: default_completion_queue_capacity(),
        }
    }

    pub fn mark_grace(&self) -> Duration {
        Duration::from_secs(self.mark_grace_secs)
    }
}
