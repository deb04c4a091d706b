//! Small vs. large object routing

use dualsync_core::types::ReconciliationDecision;

/// Splits content transfers between the synchronous copy path and the
/// external large-object pipeline.
#[derive(Debug, Clone, Copy)]
pub struct SizeRouter {
    threshold_bytes: u64,
}

impl SizeRouter {
    pub fn new(threshold_bytes: u64) -> Self {
        Self { threshold_bytes }
    }

    pub fn threshold_bytes(&self) -> u64 {
        self.threshold_bytes
    }

    /// Strictly below the threshold copies inline; at or above offloads.
    pub fn route(&self, size_bytes: u64) -> ReconciliationDecision {
        if size_bytes < self.threshold_bytes {
            ReconciliationDecision::CopyContent
        } else {
            ReconciliationDecision::OffloadLarge
        }
    }
}

impl Default for SizeRouter {
    fn default() -> Self {
        Self::new(dualsync_core::LARGE_OBJECT_THRESHOLD_BYTES)
    }
}
