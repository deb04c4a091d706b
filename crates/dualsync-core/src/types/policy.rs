//! Bucket-level replication enrollment

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Labels attached to a source bucket. Enrollment is label-driven.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketReplicationPolicy {
    pub labels: HashMap<String, String>,
}

impl BucketReplicationPolicy {
    pub fn new(labels: HashMap<String, String>) -> Self {
        Self { labels }
    }

    /// Exact, case-sensitive match of `label` against `expected`.
    pub fn is_enrolled(&self, label: &str, expected: &str) -> bool {
        if self.labels.is_empty() {
            return false;
        }
        self.labels.get(label).map(String::as_str) == Some(expected)
    }
}

impl From<HashMap<String, String>> for BucketReplicationPolicy {
    fn from(labels: HashMap<String, String>) -> Self {
        Self::new(labels)
    }
}
