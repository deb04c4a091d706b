//! Point-in-time view of one object

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::acl::Acl;

/// Everything the engine needs to know about an object at one instant.
///
/// Snapshots are built fresh for every event and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub bucket: String,
    pub key: String,
    /// Always true for snapshots returned by a store
    pub exists: bool,
    /// Opaque content hash; only compared for equality
    pub checksum: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Custom (user) metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub acl: Acl,
}

impl ObjectSnapshot {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        checksum: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            bucket: bucket.into(),
            key: key.into(),
            exists: true,
            checksum: checksum.into(),
            size_bytes,
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
            acl: Acl::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_acl(mut self, acl: Acl) -> Self {
        self.acl = acl;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        if self.updated_at < created_at {
            self.updated_at = created_at;
        }
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    pub fn content_matches(&self, other: &ObjectSnapshot) -> bool {
        self.checksum == other.checksum
    }

    /// Same key/value pairs, order irrelevant
    pub fn metadata_matches(&self, other: &ObjectSnapshot) -> bool {
        self.metadata == other.metadata
    }

    /// Same grants, order irrelevant
    pub fn acl_matches(&self, other: &ObjectSnapshot) -> bool {
        self.acl == other.acl
    }

    /// Size in decimal gigabytes, for routing and log lines
    pub fn size_in_gb(&self) -> f64 {
        self.size_bytes as f64 / crate::BYTES_PER_GB as f64
    }
}
