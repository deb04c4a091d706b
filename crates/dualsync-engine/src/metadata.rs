//! Custom metadata reconciliation

use std::sync::Arc;

use dualsync_core::types::ObjectSnapshot;
use dualsync_storage::ObjectStore;
use tracing::{debug, info, warn};

use crate::metrics;

/// Pushes the source's metadata mapping onto the destination.
///
/// The destination mapping is replaced, not merged: keys present only on
/// the destination are dropped.
pub struct MetadataReconciler {
    store: Arc<dyn ObjectStore>,
}

impl MetadataReconciler {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Returns whether a change was applied. Push failures are logged and
    /// swallowed; the next event for the object retries.
    pub async fn reconcile(&self, source: &ObjectSnapshot, destination: &ObjectSnapshot) -> bool {
        if source.metadata_matches(destination) {
            debug!("Metadata already in sync for {}/{}", destination.bucket, destination.key);
            return false;
        }

        match self
            .store
            .set_metadata(&destination.bucket, &destination.key, &source.metadata)
            .await
        {
            Ok(()) => {
                info!(
                    "Synced metadata {}/{} -> {}/{} ({} entries)",
                    source.bucket,
                    source.key,
                    destination.bucket,
                    destination.key,
                    source.metadata.len()
                );
                true
            }
            Err(e) => {
                warn!(
                    "Metadata sync to {}/{} failed, leaving for next event: {}",
                    destination.bucket, destination.key, e
                );
                metrics::record_sync_failure("metadata");
                false
            }
        }
    }
}
