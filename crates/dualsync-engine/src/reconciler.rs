//! Per-event reconciliation pipeline
//!
//! Handles:
//! - Folder-marker and eligibility short-circuits
//! - Destination existence probing
//! - Decision via the divergence detector
//! - Copy or offload, then metadata/ACL reconciliation
//! - Destination removal for delete events

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use dualsync_core::config::ReplicationConfig;
use dualsync_core::types::{
    AppliedAction, EventOperation, ObjectSnapshot, ReconcileOutcome, ReconciliationDecision,
    ReplicationEvent, SkipReason,
};
use dualsync_storage::ObjectStore;
use tracing::{debug, error, info, warn};

use crate::acl::AclReconciler;
use crate::copy::{CopyOrchestrator, CopyReport};
use crate::divergence::DivergenceDetector;
use crate::eligibility::EligibilityFilter;
use crate::error::{EngineError, EngineResult};
use crate::metadata::MetadataReconciler;
use crate::metrics;
use crate::offload::{OffloadPipeline, OffloadRequest};
use crate::router::SizeRouter;

/// The replication reconciliation engine.
///
/// Holds configuration and collaborator handles only; nothing is carried
/// from one event to the next, so any number of events may be handled
/// concurrently through a shared reference.
pub struct Reconciler {
    config: ReplicationConfig,
    store: Arc<dyn ObjectStore>,
    offload: Arc<dyn OffloadPipeline>,
    eligibility: EligibilityFilter,
    detector: DivergenceDetector,
    copier: CopyOrchestrator,
    metadata: MetadataReconciler,
    acl: AclReconciler,
}

impl Reconciler {
    pub fn new(
        config: ReplicationConfig,
        store: Arc<dyn ObjectStore>,
        offload: Arc<dyn OffloadPipeline>,
    ) -> Self {
        Self {
            eligibility: EligibilityFilter::from_config(Arc::clone(&store), &config),
            detector: DivergenceDetector::new(SizeRouter::new(config.large_object_threshold_bytes)),
            copier: CopyOrchestrator::new(Arc::clone(&store)),
            metadata: MetadataReconciler::new(Arc::clone(&store)),
            acl: AclReconciler::new(Arc::clone(&store)),
            config,
            store,
            offload,
        }
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    pub fn destination_bucket(&self, source_bucket: &str) -> String {
        self.config.destination_bucket(source_bucket)
    }

    /// Handle one event end to end
    pub async fn handle(&self, event: &ReplicationEvent) -> ReconcileOutcome {
        let started = Instant::now();

        let result = match event.operation {
            EventOperation::Create | EventOperation::Update => self.reconcile_object(event).await,
            EventOperation::Delete => self.remove_object(event).await,
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    "Replication of {}/{} failed ({}): {}",
                    event.source_bucket, event.object_key, event.operation, e
                );
                ReconcileOutcome::failed(e.failure_kind())
            }
        };

        debug!(
            "Handled {} {}/{} -> {:?} in {:?}",
            event.operation,
            event.source_bucket,
            event.object_key,
            outcome,
            started.elapsed()
        );
        metrics::record_event(event.operation, &outcome, started.elapsed());
        outcome
    }

    pub async fn handle_create(&self, bucket: &str, key: &str) -> ReconcileOutcome {
        self.handle(&ReplicationEvent::create(bucket, key)).await
    }

    pub async fn handle_update(&self, bucket: &str, key: &str) -> ReconcileOutcome {
        self.handle(&ReplicationEvent::update(bucket, key)).await
    }

    pub async fn handle_delete(&self, bucket: &str, key: &str) -> ReconcileOutcome {
        self.handle(&ReplicationEvent::delete(bucket, key)).await
    }

    /// Short-circuits shared by every operation. Folder markers are checked
    /// first so they never cause even a policy read.
    async fn precheck(&self, event: &ReplicationEvent) -> Option<SkipReason> {
        if event.is_folder_marker() {
            info!(
                "Folder marker {}/{}, event skipped",
                event.source_bucket, event.object_key
            );
            return Some(SkipReason::FolderMarker);
        }

        if !self.eligibility.is_eligible(&event.source_bucket).await {
            info!(
                "Bucket {} is not dual-region, event skipped",
                event.source_bucket
            );
            return Some(SkipReason::NotDualRegion);
        }

        None
    }

    /// Create/update pipeline
    async fn reconcile_object(&self, event: &ReplicationEvent) -> EngineResult<ReconcileOutcome> {
        if let Some(reason) = self.precheck(event).await {
            return Ok(ReconcileOutcome::skipped(reason));
        }

        let source = match self
            .store
            .snapshot(&event.source_bucket, &event.object_key)
            .await
        {
            Ok(Some(source)) => source,
            Ok(None) => {
                info!(
                    "Source {}/{} no longer exists, event skipped",
                    event.source_bucket, event.object_key
                );
                return Ok(ReconcileOutcome::skipped(SkipReason::SourceMissing));
            }
            Err(e) => {
                return Err(EngineError::SourceUnreadable(format!(
                    "{}/{}: {}",
                    event.source_bucket, event.object_key, e
                )))
            }
        };

        let destination_bucket = self.destination_bucket(&event.source_bucket);
        let destination = self.inspect_destination(&destination_bucket, &event.object_key).await;

        let decision = self.detector.decide(&source, destination.as_ref());
        info!(
            "Decision for {}/{}: {} (destination {})",
            source.bucket,
            source.key,
            decision,
            if destination.is_some() { "present" } else { "absent" }
        );

        match (decision, destination) {
            (ReconciliationDecision::CopyContent, _) => {
                self.copy_then_reconcile(&source, &destination_bucket).await
            }
            (ReconciliationDecision::OffloadLarge, _) => {
                self.offload(&source, &destination_bucket).await?;
                Ok(ReconcileOutcome::converged([AppliedAction::Offloaded]))
            }
            (ReconciliationDecision::Skip(reason), _) => Ok(ReconcileOutcome::skipped(reason)),
            (auxiliary, Some(destination)) => {
                let actions = self.apply_auxiliary(auxiliary, &source, &destination).await;
                Ok(ReconcileOutcome::Converged { actions })
            }
            // The detector only yields auxiliary decisions for a present destination
            (_, None) => Ok(ReconcileOutcome::converged([])),
        }
    }

    /// Existence check followed by a snapshot read. Any failure or
    /// disagreement reads as "absent", biasing toward a redundant copy.
    async fn inspect_destination(&self, bucket: &str, key: &str) -> Option<ObjectSnapshot> {
        if !self.store.object_exists(bucket, key).await {
            debug!("Destination {}/{} does not exist", bucket, key);
            return None;
        }

        match self.store.snapshot(bucket, key).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(
                    "Destination {}/{} unreadable, assuming absent: {}",
                    bucket, key, e
                );
                None
            }
        }
    }

    async fn copy_then_reconcile(
        &self,
        source: &ObjectSnapshot,
        destination_bucket: &str,
    ) -> EngineResult<ReconcileOutcome> {
        let mut actions = BTreeSet::from([AppliedAction::CopiedContent]);

        let current_source = match self.copier.copy(source, destination_bucket).await? {
            CopyReport::Authoritative => source.clone(),
            CopyReport::SourceMutated(current) => {
                info!(
                    "Forcing metadata/ACL reconciliation for {}/{}",
                    current.bucket, current.key
                );
                current
            }
            CopyReport::SourceGone => {
                info!(
                    "Source {}/{} removed during copy, skipping metadata/ACL",
                    source.bucket, source.key
                );
                return Ok(ReconcileOutcome::Converged { actions });
            }
        };

        // Compare against what actually landed, never the pre-copy destination
        let copied = match self.store.snapshot(destination_bucket, &source.key).await {
            Ok(Some(copied)) => copied,
            Ok(None) => {
                warn!(
                    "Destination {}/{} missing right after copy",
                    destination_bucket, source.key
                );
                return Ok(ReconcileOutcome::Converged { actions });
            }
            Err(e) => {
                warn!(
                    "Destination {}/{} unreadable after copy: {}",
                    destination_bucket, source.key, e
                );
                return Ok(ReconcileOutcome::Converged { actions });
            }
        };

        // A new generation landed at the source mid-copy; the destination may
        // hold either one, so the event is retried rather than reported converged
        if copied.checksum != current_source.checksum {
            return Err(EngineError::ContentCopy(format!(
                "{}/{} was rewritten during the copy",
                source.bucket, source.key
            )));
        }

        let auxiliary = DivergenceDetector::auxiliary(&current_source, &copied);
        actions.extend(self.apply_auxiliary(auxiliary, &current_source, &copied).await);
        Ok(ReconcileOutcome::Converged { actions })
    }

    async fn apply_auxiliary(
        &self,
        decision: ReconciliationDecision,
        source: &ObjectSnapshot,
        destination: &ObjectSnapshot,
    ) -> BTreeSet<AppliedAction> {
        let mut actions = BTreeSet::new();

        if decision.syncs_metadata() && self.metadata.reconcile(source, destination).await {
            actions.insert(AppliedAction::SyncedMetadata);
        }
        if decision.syncs_acl() && self.acl.reconcile(source, destination).await {
            actions.insert(AppliedAction::SyncedAcl);
        }

        actions
    }

    async fn offload(&self, source: &ObjectSnapshot, destination_bucket: &str) -> EngineResult<()> {
        let request = OffloadRequest {
            source_bucket: source.bucket.clone(),
            source_key: source.key.clone(),
            destination_bucket: destination_bucket.to_string(),
            destination_key: source.key.clone(),
            size_bytes: source.size_bytes,
        };

        info!(
            "Handing {}/{} ({:.3} GB) to large-object pipeline",
            source.bucket,
            source.key,
            source.size_in_gb()
        );
        self.offload.offload(&request).await
    }

    /// Delete pipeline. No existence check: removing an absent object is a no-op.
    async fn remove_object(&self, event: &ReplicationEvent) -> EngineResult<ReconcileOutcome> {
        if let Some(reason) = self.precheck(event).await {
            return Ok(ReconcileOutcome::skipped(reason));
        }

        let destination_bucket = self.destination_bucket(&event.source_bucket);
        info!(
            "Decision for {}/{}: {}",
            event.source_bucket,
            event.object_key,
            ReconciliationDecision::Delete
        );

        match self
            .store
            .delete_object(&destination_bucket, &event.object_key)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(
                    "Destination {}/{} already absent",
                    destination_bucket, event.object_key
                );
            }
            Err(e) => {
                return Err(EngineError::Delete(format!(
                    "{}/{}: {}",
                    destination_bucket, event.object_key, e
                )))
            }
        }

        info!("Deleted {}/{}", destination_bucket, event.object_key);
        Ok(ReconcileOutcome::converged([AppliedAction::Deleted]))
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish()
    }
}
