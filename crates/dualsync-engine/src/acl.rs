//! ACL reconciliation

use std::sync::Arc;

use dualsync_core::types::ObjectSnapshot;
use dualsync_storage::ObjectStore;
use tracing::{debug, info, warn};

use crate::metrics;

/// Overwrites the destination ACL with the source's full grant set.
pub struct AclReconciler {
    store: Arc<dyn ObjectStore>,
}

impl AclReconciler {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Returns whether a change was applied. Failures are non-fatal.
    pub async fn reconcile(&self, source: &ObjectSnapshot, destination: &ObjectSnapshot) -> bool {
        if source.acl_matches(destination) {
            debug!("ACL already in sync for {}/{}", destination.bucket, destination.key);
            return false;
        }

        match self
            .store
            .set_acl(&destination.bucket, &destination.key, &source.acl)
            .await
        {
            Ok(()) => {
                info!(
                    "Synced ACL {}/{} -> {}/{} ({} grants)",
                    source.bucket,
                    source.key,
                    destination.bucket,
                    destination.key,
                    source.acl.len()
                );
                true
            }
            Err(e) => {
                warn!(
                    "ACL sync to {}/{} failed, leaving for next event: {}",
                    destination.bucket, destination.key, e
                );
                metrics::record_sync_failure("acl");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{meta, Fixture};
    use dualsync_core::types::{Acl, AclEntry, AclRole};

    #[tokio::test]
    async fn test_overwrites_destination_acl() {
        let fx = Fixture::new();
        let acl: Acl = [
            AclEntry::user("jane@example.com", AclRole::Owner),
            AclEntry::public_read(),
        ]
        .into_iter()
        .collect();
        let source = fx.put_source_with_acl("k", "data", meta(&[]), acl.clone());
        let destination = fx.put_destination_with_acl(
            "k",
            "data",
            meta(&[]),
            [AclEntry::user("bob@example.com", AclRole::Writer)].into_iter().collect(),
        );

        let reconciler = AclReconciler::new(fx.store());
        assert!(reconciler.reconcile(&source, &destination).await);
        assert_eq!(fx.destination_snapshot("k").await.unwrap().acl, acl);
        assert_eq!(fx.calls().set_acl, 1);

        let destination = fx.destination_snapshot("k").await.unwrap();
        assert!(!reconciler.reconcile(&source, &destination).await);
        assert_eq!(fx.calls().set_acl, 1);
    }

    #[tokio::test]
    async fn test_failure_reports_no_change() {
        let fx = Fixture::new();
        fx.fail_set_acl();
        let source = fx.put_source_with_acl(
            "k",
            "data",
            meta(&[]),
            [AclEntry::public_read()].into_iter().collect(),
        );
        let destination = fx.put_destination("k", "data", meta(&[]));

        let reconciler = AclReconciler::new(fx.store());
        assert!(!reconciler.reconcile(&source, &destination).await);
    }
}
