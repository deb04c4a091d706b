//! Change events fed to the replication engine

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What happened to the source object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOperation {
    Create,
    Update,
    Delete,
}

impl EventOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOperation::Create => "create",
            EventOperation::Update => "update",
            EventOperation::Delete => "delete",
        }
    }
}

impl FromStr for EventOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(EventOperation::Create),
            "update" => Ok(EventOperation::Update),
            "delete" => Ok(EventOperation::Delete),
            _ => Err(format!("Invalid event operation: {}", s)),
        }
    }
}

impl std::fmt::Display for EventOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change notification for one source object.
///
/// Carries no object state on purpose: every decision is derived from
/// re-reading the source and destination, so redelivered or reordered
/// events converge to the same result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationEvent {
    pub operation: EventOperation,
    pub source_bucket: String,
    pub object_key: String,
}

impl ReplicationEvent {
    pub fn new(
        operation: EventOperation,
        source_bucket: impl Into<String>,
        object_key: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            source_bucket: source_bucket.into(),
            object_key: object_key.into(),
        }
    }

    pub fn create(source_bucket: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self::new(EventOperation::Create, source_bucket, object_key)
    }

    pub fn update(source_bucket: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self::new(EventOperation::Update, source_bucket, object_key)
    }

    pub fn delete(source_bucket: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self::new(EventOperation::Delete, source_bucket, object_key)
    }

    pub fn is_folder_marker(&self) -> bool {
        crate::utils::is_folder_marker(&self.object_key)
    }
}
