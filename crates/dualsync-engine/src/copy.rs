//! Synchronous content copy with source-mutation detection

use std::sync::Arc;

use dualsync_core::types::ObjectSnapshot;
use dualsync_storage::ObjectStore;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};

/// What the source looked like once the copy finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyReport {
    /// Source untouched during the transfer; the copied object is point-in-time consistent
    Authoritative,
    /// Source modified while copying; carries the current source snapshot
    SourceMutated(ObjectSnapshot),
    /// Source removed while copying
    SourceGone,
}

/// Drives the single-object copy to the destination bucket.
pub struct CopyOrchestrator {
    store: Arc<dyn ObjectStore>,
}

impl CopyOrchestrator {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Copy `source` to the same key in `destination_bucket`, carrying
    /// metadata and ACL. Not retried here: a failure surfaces to the caller
    /// and the event source redelivers.
    pub async fn copy(
        &self,
        source: &ObjectSnapshot,
        destination_bucket: &str,
    ) -> EngineResult<CopyReport> {
        self.store
            .copy_object(
                &source.bucket,
                &source.key,
                destination_bucket,
                &source.key,
                true,
            )
            .await
            .map_err(|e| {
                EngineError::ContentCopy(format!(
                    "{}/{} -> {}/{}: {}",
                    source.bucket, source.key, destination_bucket, source.key, e
                ))
            })?;

        info!(
            "Copied {}/{} -> {}/{} ({:.3} GB)",
            source.bucket,
            source.key,
            destination_bucket,
            source.key,
            source.size_in_gb()
        );

        let report = match self.store.snapshot(&source.bucket, &source.key).await {
            Ok(Some(current)) if current.updated_at == source.updated_at => {
                CopyReport::Authoritative
            }
            Ok(Some(current)) => {
                info!(
                    "Source {}/{} changed during copy (updated {} -> {})",
                    source.bucket, source.key, source.updated_at, current.updated_at
                );
                CopyReport::SourceMutated(current)
            }
            Ok(None) => CopyReport::SourceGone,
            Err(e) => {
                // Copy itself succeeded; keep the pre-copy view
                warn!(
                    "Could not re-read {}/{} after copy: {}",
                    source.bucket, source.key, e
                );
                CopyReport::Authoritative
            }
        };

        Ok(report)
    }
}
