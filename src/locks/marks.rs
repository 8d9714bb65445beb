//! # Web-Upload Marks
//!
//! When reconciliation places a file, the external filesystem watcher will
//! shortly observe the same write and would log it a second time. Marks
//! flag such paths for a short grace window so the watcher can skip them.
//! The set is in-memory and best-effort: losing a mark costs one duplicate
//! audit line, nothing more.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Expiring set of recently web-written paths.
#[derive(Debug)]
pub struct UploadMarks {
    entries: Mutex<HashMap<PathBuf, Instant>>,
    grace: Duration,
}

impl UploadMarks {
    pub fn new(grace: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            grace,
        }
    }

    /// Mark a path as just written by the web pipeline.
    pub fn mark(&self, path: &Path) {
        if let Ok(mut entries) = self.entries.lock() {
            let now = Instant::now();
            entries.retain(|_, marked_at| now.duration_since(*marked_at) < self.grace);
            entries.insert(path.to_path_buf(), now);
        }
    }

    /// Whether the path is inside its grace window.
    pub fn is_marked(&self, path: &Path) -> bool {
        self.entries
            .lock()
            .map(|entries| {
                entries
                    .get(path)
                    .is_some_and(|marked_at| marked_at.elapsed() < self.grace)
            })
            .unwrap_or(false)
    }

    /// Drop a mark early, typically once the watcher has seen the write.
    pub fn unmark(&self, path: &Path) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(path);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_unmark() {
        let marks = UploadMarks::new(Duration::from_secs(10));
        let path = Path::new("/srv/homes/alice/report.txt");

        assert!(!marks.is_marked(path));
        marks.mark(path);
        assert!(marks.is_marked(path));
        marks.unmark(path);
        assert!(!marks.is_marked(path));
    }

    #[test]
    fn test_marks_expire_after_grace() {
        let marks = UploadMarks::new(Duration::from_millis(0));
        let path = Path::new("/srv/homes/alice/report.txt");

        marks.mark(path);
        assert!(!marks.is_marked(path));
    }

    #[test]
    fn test_expired_entries_pruned_on_mark() {
        let marks = UploadMarks::new(Duration::from_millis(0));
        marks.mark(Path::new("/a"));
        marks.mark(Path::new("/b"));
        // Each mark() pruned the previous expired entry.
        assert_eq!(marks.len(), 1);
    }
}
