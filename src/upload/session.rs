//! # Upload Sessions
//!
//! An upload session is transient: created by the transfer layer before
//! any bytes flow, alive during the chunked transfer, and gone once its
//! completion has been reconciled or it was aborted. The state machine
//! here enforces that validation precedes transfer precedes
//! reconciliation within one session; unrelated sessions are independent.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::actor::Actor;
use crate::audit::SourceTag;
use crate::quota::{Headroom, QuotaScope};

use super::errors::{UploadError, UploadResult};

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Validating,
    Rejected,
    Admitted,
    Transferring,
    Aborted,
    CompletedPendingMove,
    Reconciled,
    ReconcileFailed,
}

impl SessionState {
    /// Legal transitions only; everything else is a lifecycle bug.
    pub fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Created, Validating)
                | (Validating, Rejected)
                | (Validating, Admitted)
                | (Admitted, Transferring)
                | (Transferring, Aborted)
                | (Transferring, CompletedPendingMove)
                | (CompletedPendingMove, Reconciled)
                | (CompletedPendingMove, ReconcileFailed)
        )
    }
}

/// Declared upload metadata, validated before any bytes are accepted.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Virtual path of the destination directory
    pub destination: String,
    pub filename: String,
    pub declared_size: u64,
    pub actor: Option<Actor>,
    pub overwrite: bool,
    pub source: SourceTag,
}

/// One transient upload session.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub id: Uuid,
    pub request: UploadRequest,
    pub state: SessionState,
}

impl UploadSession {
    pub fn new(request: UploadRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            state: SessionState::Created,
        }
    }

    pub fn advance(&mut self, next: SessionState) -> UploadResult<()> {
        if !self.state.can_advance_to(next) {
            return Err(UploadError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

/// A session that passed validation, carrying everything reconciliation
/// will need so no re-resolution happens after the actor is gone.
#[derive(Debug, Clone)]
pub struct AdmittedUpload {
    pub session: UploadSession,

    /// Contained real destination directory
    pub dest_dir: PathBuf,

    /// Canonical virtual destination
    pub canonical_destination: String,

    /// Quota scope the admission consulted
    pub scope: QuotaScope,

    /// Headroom at admission; None when the check failed open
    pub headroom: Option<Headroom>,
}

impl AdmittedUpload {
    /// Bytes started flowing.
    pub fn begin_transfer(&mut self) -> UploadResult<()> {
        self.session.advance(SessionState::Transferring)
    }

    /// Transfer finished; hand over for reconciliation.
    pub fn complete(mut self, temp_path: PathBuf) -> UploadResult<UploadCompletion> {
        if self.session.state == SessionState::Admitted {
            self.session.advance(SessionState::Transferring)?;
        }
        self.session.advance(SessionState::CompletedPendingMove)?;
        Ok(UploadCompletion {
            admitted: self,
            temp_path,
        })
    }

    /// Abort before completion: the temporary blob is discarded and no
    /// permanent quota is consumed.
    pub fn abort(mut self, temp_path: Option<&Path>) -> UploadResult<()> {
        if self.session.state == SessionState::Admitted {
            self.session.advance(SessionState::Transferring)?;
        }
        self.session.advance(SessionState::Aborted)?;
        if let Some(path) = temp_path {
            // Best effort; a leftover blob in the staging area is harmless.
            let _ = fs::remove_file(path);
        }
        Ok(())
    }
}

/// A completed transfer awaiting its single reconciliation.
#[derive(Debug)]
pub struct UploadCompletion {
    pub admitted: AdmittedUpload,

    /// Where the transfer layer staged the received bytes
    pub temp_path: PathBuf,
}
