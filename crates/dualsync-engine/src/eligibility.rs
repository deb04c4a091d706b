//! Dual-region enrollment check

use std::sync::Arc;

use dualsync_core::config::ReplicationConfig;
use dualsync_core::types::BucketReplicationPolicy;
use dualsync_storage::ObjectStore;
use tracing::debug;

/// Decides whether a source bucket takes part in replication.
///
/// Fails closed: a policy that cannot be read or parsed means "not enrolled".
pub struct EligibilityFilter {
    store: Arc<dyn ObjectStore>,
    label: String,
    expected: String,
}

impl EligibilityFilter {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        label: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            store,
            label: label.into(),
            expected: expected.into(),
        }
    }

    pub fn from_config(store: Arc<dyn ObjectStore>, config: &ReplicationConfig) -> Self {
        Self::new(store, &config.policy_label, &config.policy_value)
    }

    pub async fn is_eligible(&self, bucket: &str) -> bool {
        let labels = match self.store.bucket_labels(bucket).await {
            Ok(labels) => labels,
            Err(e) => {
                debug!("Policy for bucket {} unavailable ({}), not dual-region", bucket, e);
                return false;
            }
        };

        let eligible =
            BucketReplicationPolicy::from(labels).is_enrolled(&self.label, &self.expected);
        if !eligible {
            debug!("Bucket {} is not dual-region", bucket);
        }
        eligible
    }
}
