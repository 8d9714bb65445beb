//! # Audit Event Emission
//!
//! Reconciliation emits exactly one audit event per completed upload. The
//! sink is append-only and fire-and-forget: a failing sink must never block
//! or fail the data path, so [`AuditSink::record`] returns nothing and
//! implementations log their own failures.
//!
//! Persistence of the audit trail (schema, rotation, retention) is an
//! external concern; this module only defines the seam.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

/// Which adapter produced a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// Authenticated web upload
    Web,
    /// Anonymous upload through a public upload link
    ShareUpload,
    /// WebDAV adapter
    Webdav,
    /// SMB adapter
    Smb,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Web => "web",
            SourceTag::ShareUpload => "share_upload",
            SourceTag::Webdav => "webdav",
            SourceTag::Smb => "smb",
        }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Acting user, absent for anonymous share uploads
    pub actor_id: Option<Uuid>,
    pub source: SourceTag,
    pub target_path: PathBuf,
    pub size_bytes: u64,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        actor_id: Option<Uuid>,
        source: SourceTag,
        target_path: PathBuf,
        size_bytes: u64,
    ) -> Self {
        Self {
            actor_id,
            source,
            target_path,
            size_bytes,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only audit sink.
pub trait AuditSink: Send + Sync {
    /// Record one event. Must not block the data path; failures are the
    /// sink's problem to report, never the caller's.
    fn record(&self, event: AuditEvent);
}

/// Sink that emits events as JSON lines through the `log` facade.
#[derive(Debug, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, event: AuditEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => log::info!(target: "driftbox::audit", "{}", line),
            Err(e) => log::warn!(target: "driftbox::audit", "audit event dropped: {}", e),
        }
    }
}

/// In-memory sink for tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
