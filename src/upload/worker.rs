//! # Completion Worker
//!
//! The transfer layer fires exactly one completion event per session; a
//! single background worker drains them off a bounded queue and runs
//! reconciliation. The bound gives explicit backpressure under burst
//! upload volume: `submit` waits for capacity instead of growing an
//! unbounded buffer. Reconcile failures are logged with the preserved
//! blob path so an operator can recover the bytes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::quota::QuotaLimitProvider;

use super::errors::{UploadError, UploadResult};
use super::pipeline::IngestPipeline;
use super::session::UploadCompletion;

/// Bounded handle for submitting completion events.
#[derive(Clone)]
pub struct CompletionQueue {
    tx: mpsc::Sender<UploadCompletion>,
}

impl CompletionQueue {
    /// Queue a completion for reconciliation, waiting for capacity.
    pub async fn submit(&self, completion: UploadCompletion) -> UploadResult<()> {
        self.tx
            .send(completion)
            .await
            .map_err(|_| UploadError::QueueClosed)
    }
}

/// Spawn the reconcile worker; dropping every [`CompletionQueue`] clone
/// drains the queue and ends the worker.
pub fn spawn_reconcile_worker<P>(
    pipeline: Arc<IngestPipeline<P>>,
    capacity: usize,
) -> (CompletionQueue, JoinHandle<()>)
where
    P: QuotaLimitProvider + 'static,
{
    let (tx, mut rx) = mpsc::channel::<UploadCompletion>(capacity);

    let handle = tokio::spawn(async move {
        while let Some(completion) = rx.recv().await {
            let session_id = completion.admitted.session.id;
            match pipeline.reconcile(completion) {
                Ok(outcome) => {
                    log::debug!(
                        "session {} reconciled to {}",
                        session_id,
                        outcome.final_path.display()
                    );
                }
                Err(error) => {
                    log::error!("session {} reconcile failed: {}", session_id, error);
                }
            }
        }
    });

    (CompletionQueue { tx }, handle)
}
