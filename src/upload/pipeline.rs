//! # Ingest Pipeline
//!
//! Validation admits or rejects declared metadata with no side effects, so
//! validating the same metadata twice gives the same answer. Reconciliation
//! is the only step that touches permanent storage, and it moves the staged
//! blob with a single atomic rename; there is no copy+delete fallback, so a
//! reader can never observe a half-written file at the final path.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::actor::Actor;
use crate::audit::{AuditEvent, AuditSink};
use crate::config::{CoreConfig, UploadPolicy};
use crate::locks::UploadMarks;
use crate::quota::{QuotaLimitProvider, QuotaScope, QuotaTracker};
use crate::share::ShareLink;
use crate::vfs::{Resolver, StorageRoot};

use super::errors::{UploadError, UploadResult};
use super::filename::{unique_name, validate_filename};
use super::session::{AdmittedUpload, SessionState, UploadCompletion, UploadRequest, UploadSession};

/// Result of a successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub session_id: Uuid,
    pub final_path: PathBuf,
    pub size_bytes: u64,
}

/// Validates uploads at admission time and reconciles completed transfers.
pub struct IngestPipeline<P: QuotaLimitProvider> {
    resolver: Resolver,
    quota: QuotaTracker<P>,
    policy: UploadPolicy,
    marks: Arc<UploadMarks>,
    audit: Arc<dyn AuditSink>,
}

impl<P: QuotaLimitProvider> IngestPipeline<P> {
    pub fn new(config: &CoreConfig, limits: P, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            resolver: Resolver::new(config.layout.clone()),
            quota: QuotaTracker::new(config.layout.clone(), limits),
            policy: config.upload.clone(),
            marks: Arc::new(UploadMarks::new(config.mark_grace())),
            audit,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Mark set shared with the external filesystem watcher.
    pub fn marks(&self) -> Arc<UploadMarks> {
        Arc::clone(&self.marks)
    }

    /// Pre-flight validation, before any bytes are accepted.
    ///
    /// Rejects bad filenames, unresolvable or non-writable destinations
    /// and quota denials. An infrastructure failure inside the quota check
    /// fails OPEN with a logged warning: a broken limit lookup must not
    /// block legitimate uploads.
    pub fn validate(&self, request: UploadRequest) -> UploadResult<AdmittedUpload> {
        let mut session = UploadSession::new(request);
        session.advance(SessionState::Validating)?;

        match self.run_checks(&session) {
            Ok((dest_dir, canonical, scope, headroom)) => {
                session.advance(SessionState::Admitted)?;
                Ok(AdmittedUpload {
                    session,
                    dest_dir,
                    canonical_destination: canonical,
                    scope,
                    headroom,
                })
            }
            Err(error) => {
                session.advance(SessionState::Rejected)?;
                log::debug!(
                    "upload session {} rejected at validation: {}",
                    session.id,
                    error
                );
                Err(error)
            }
        }
    }

    /// Validate an anonymous upload arriving through a share link.
    ///
    /// The link's sub-policy (per-file cap, extension allowlist, lifetime
    /// total bound) is enforced here at ingest time; a violation rejects
    /// this one file and leaves the link usable. `owner` is the link
    /// creator's identity, needed when the link targets a home namespace.
    pub fn validate_share(
        &self,
        link: &ShareLink,
        filename: &str,
        declared_size: u64,
        owner: Option<&Actor>,
    ) -> UploadResult<AdmittedUpload> {
        link.check_upload(filename, declared_size)?;

        self.validate(UploadRequest {
            destination: link.virtual_path.clone(),
            filename: filename.to_string(),
            declared_size,
            actor: owner.cloned(),
            overwrite: false,
            source: crate::audit::SourceTag::ShareUpload,
        })
    }

    fn run_checks(
        &self,
        session: &UploadSession,
    ) -> UploadResult<(PathBuf, String, QuotaScope, Option<crate::quota::Headroom>)> {
        let request = &session.request;

        validate_filename(&request.filename, &self.policy)?;

        let resolved = self
            .resolver
            .resolve(&request.destination, request.actor.as_ref())?;

        let scope = match &resolved.root {
            StorageRoot::Home { username } => QuotaScope::User(username.clone()),
            StorageRoot::SharedDrive { drive } => QuotaScope::SharedDrive(drive.clone()),
            StorageRoot::Root | StorageRoot::SharedRoot => {
                return Err(UploadError::InvalidDestination(resolved.canonical));
            }
        };

        let dest_dir = resolved
            .real_path
            .clone()
            .ok_or_else(|| UploadError::InvalidDestination(resolved.canonical.clone()))?;

        let headroom = match self.quota.check_headroom(&scope, request.declared_size) {
            Ok(headroom) => {
                headroom.clone().into_result()?;
                Some(headroom)
            }
            Err(error) => {
                log::warn!(
                    "quota check failed for {}, admitting upload session {}: {}",
                    scope.describe(),
                    session.id,
                    error
                );
                None
            }
        };

        Ok((dest_dir, resolved.canonical, scope, headroom))
    }

    /// Move a completed transfer into place. Fires exactly once per
    /// session: the completion event owns the session and is consumed.
    ///
    /// On any failure the staged blob stays where it is and the error is
    /// reported; nothing is retried or deleted.
    pub fn reconcile(&self, completion: UploadCompletion) -> UploadResult<ReconcileOutcome> {
        let UploadCompletion {
            mut admitted,
            temp_path,
        } = completion;

        let request = &admitted.session.request;

        if let Err(error) = fs::create_dir_all(&admitted.dest_dir) {
            return self.fail_reconcile(&mut admitted.session, temp_path, error.to_string());
        }

        let final_name = if request.overwrite {
            request.filename.clone()
        } else {
            unique_name(
                &admitted.dest_dir,
                &request.filename,
                self.policy.suffix_search_limit,
            )
        };
        let final_path = admitted.dest_dir.join(&final_name);

        if let Err(error) = fs::rename(&temp_path, &final_path) {
            return self.fail_reconcile(&mut admitted.session, temp_path, error.to_string());
        }

        self.marks.mark(&final_path);

        let size_bytes = fs::metadata(&final_path)
            .map(|m| m.len())
            .unwrap_or(request.declared_size);

        self.audit.record(AuditEvent::new(
            request.actor.as_ref().map(|a| a.id),
            request.source,
            final_path.clone(),
            size_bytes,
        ));

        admitted.session.advance(SessionState::Reconciled)?;

        Ok(ReconcileOutcome {
            session_id: admitted.session.id,
            final_path,
            size_bytes,
        })
    }

    fn fail_reconcile(
        &self,
        session: &mut UploadSession,
        temp_path: PathBuf,
        reason: String,
    ) -> UploadResult<ReconcileOutcome> {
        session.advance(SessionState::ReconcileFailed)?;
        log::error!(
            "reconcile failed for session {}, blob preserved at {}: {}",
            session.id,
            temp_path.display(),
            reason
        );
        Err(UploadError::ReconcileFailed { temp_path, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{MemoryAuditSink, SourceTag};
    use crate::config::StorageLayout;
    use crate::quota::{InMemoryQuotaLimits, QuotaError, QuotaResult};
    use crate::vfs::VfsError;
    use std::path::Path;
    use tempfile::TempDir;

    struct Fixture {
        pipeline: IngestPipeline<InMemoryQuotaLimits>,
        audit: Arc<MemoryAuditSink>,
        staging: PathBuf,
        _temp: TempDir,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp.path().join("homes"), temp.path().join("shared"));
        let config = CoreConfig::new(layout);
        let audit = Arc::new(MemoryAuditSink::new());
        let staging = temp.path().join("staging");
        fs::create_dir_all(&staging).unwrap();

        Fixture {
            pipeline: IngestPipeline::new(&config, InMemoryQuotaLimits::new(), audit.clone()),
            audit,
            staging,
            _temp: temp,
        }
    }

    fn alice() -> Actor {
        Actor::new(Uuid::new_v4(), "alice")
    }

    fn request(filename: &str) -> UploadRequest {
        UploadRequest {
            destination: "/shared/team".into(),
            filename: filename.into(),
            declared_size: 5,
            actor: Some(alice()),
            overwrite: false,
            source: SourceTag::Web,
        }
    }

    fn stage_blob(fixture: &Fixture, contents: &[u8]) -> PathBuf {
        let blob = fixture.staging.join(Uuid::new_v4().to_string());
        fs::write(&blob, contents).unwrap();
        blob
    }

    fn run_upload(fixture: &Fixture, req: UploadRequest, contents: &[u8]) -> ReconcileOutcome {
        let admitted = fixture.pipeline.validate(req).unwrap();
        let blob = stage_blob(fixture, contents);
        let completion = admitted.complete(blob).unwrap();
        fixture.pipeline.reconcile(completion).unwrap()
    }

    #[test]
    fn test_full_upload_flow() {
        let fixture = fixture();
        let outcome = run_upload(&fixture, request("report.txt"), b"hello");

        assert!(outcome.final_path.ends_with("team/report.txt"));
        assert_eq!(fs::read(&outcome.final_path).unwrap(), b"hello");
        assert_eq!(outcome.size_bytes, 5);

        // Exactly one audit event, and the path is marked for the watcher.
        assert_eq!(fixture.audit.len(), 1);
        assert!(fixture.pipeline.marks().is_marked(&outcome.final_path));
    }

    #[test]
    fn test_duplicate_name_gets_suffix_and_preserves_original() {
        let fixture = fixture();
        let first = run_upload(&fixture, request("report.txt"), b"original");
        let second = run_upload(&fixture, request("report.txt"), b"second");
        let third = run_upload(&fixture, request("report.txt"), b"third");

        assert!(first.final_path.ends_with("report.txt"));
        assert!(second.final_path.ends_with("report (1).txt"));
        assert!(third.final_path.ends_with("report (2).txt"));
        assert_eq!(fs::read(&first.final_path).unwrap(), b"original");
    }

    #[test]
    fn test_overwrite_replaces_in_place() {
        let fixture = fixture();
        let first = run_upload(&fixture, request("report.txt"), b"old");

        let mut req = request("report.txt");
        req.overwrite = true;
        let second = run_upload(&fixture, req, b"new");

        assert_eq!(first.final_path, second.final_path);
        assert_eq!(fs::read(&second.final_path).unwrap(), b"new");
    }

    #[test]
    fn test_shared_root_destination_rejected() {
        let fixture = fixture();
        let mut req = request("report.txt");
        req.destination = "/shared".into();

        assert!(matches!(
            fixture.pipeline.validate(req),
            Err(UploadError::InvalidDestination(_))
        ));
    }

    #[test]
    fn test_home_destination_requires_actor() {
        let fixture = fixture();
        let mut req = request("report.txt");
        req.destination = "/home/docs".into();
        req.actor = None;

        assert!(matches!(
            fixture.pipeline.validate(req),
            Err(UploadError::Path(VfsError::Unauthorized))
        ));
    }

    #[test]
    fn test_quota_denial_carries_numbers() {
        let fixture = fixture();
        let scope = QuotaScope::SharedDrive("team".into());
        fixture.pipeline.quota_limits().set_limit(scope, 1000);

        // Consume 900 bytes first.
        let mut big = request("used.bin");
        big.declared_size = 900;
        run_upload(&fixture, big, &vec![0u8; 900]);

        let mut req = request("more.bin");
        req.declared_size = 150;
        let error = fixture.pipeline.validate(req).unwrap_err();
        assert_eq!(
            error,
            UploadError::Quota(QuotaError::Exceeded {
                required: 150,
                remaining: 100,
                used: 900,
                limit: 1000,
            })
        );
    }

    #[test]
    fn test_validation_is_repeatable() {
        let fixture = fixture();
        let first = fixture.pipeline.validate(request("report.txt"));
        let second = fixture.pipeline.validate(request("report.txt"));
        assert!(first.is_ok());
        assert!(second.is_ok());
    }

    struct BrokenLimits;

    impl QuotaLimitProvider for BrokenLimits {
        fn limit_for(&self, _scope: &QuotaScope) -> QuotaResult<u64> {
            Err(QuotaError::Storage("backend down".into()))
        }
    }

    #[test]
    fn test_quota_infrastructure_failure_fails_open() {
        let _ = env_logger::builder().is_test(true).try_init();

        let temp = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp.path().join("homes"), temp.path().join("shared"));
        let config = CoreConfig::new(layout);
        let pipeline =
            IngestPipeline::new(&config, BrokenLimits, Arc::new(MemoryAuditSink::new()));

        let admitted = pipeline.validate(request("report.txt")).unwrap();
        assert!(admitted.headroom.is_none());
    }

    #[test]
    fn test_failed_rename_preserves_blob() {
        let fixture = fixture();
        let admitted = fixture.pipeline.validate(request("report.txt")).unwrap();

        // Point the completion at a blob that does not exist; rename fails.
        let missing = fixture.staging.join("never-written");
        let completion = admitted.complete(missing.clone()).unwrap();
        let error = fixture.pipeline.reconcile(completion).unwrap_err();

        match error {
            UploadError::ReconcileFailed { temp_path, .. } => assert_eq!(temp_path, missing),
            other => panic!("expected reconcile failure, got {:?}", other),
        }
        assert_eq!(fixture.audit.len(), 0);
    }

    #[test]
    fn test_share_sub_policy_rejects_single_file() {
        let fixture = fixture();
        fs::create_dir_all(fixture.pipeline.resolver().layout().drive_dir("team")).unwrap();

        let mut link = ShareLink::new(
            "/shared/team".into(),
            Uuid::new_v4(),
            crate::share::ShareType::Upload,
        );
        link.constraints.max_file_size = 10;

        let too_big = fixture.pipeline.validate_share(&link, "big.pdf", 11, None);
        assert!(matches!(too_big, Err(UploadError::Share(_))));

        let fits = fixture.pipeline.validate_share(&link, "ok.pdf", 10, None);
        assert!(fits.is_ok());
    }

    impl IngestPipeline<InMemoryQuotaLimits> {
        fn quota_limits(&self) -> &InMemoryQuotaLimits {
            self.quota.limits()
        }
    }
}
