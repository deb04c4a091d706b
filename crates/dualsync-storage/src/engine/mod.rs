//! Object store capability trait

use async_trait::async_trait;
use dualsync_core::types::{Acl, ObjectSnapshot};
use dualsync_core::Result;
use std::collections::HashMap;

/// Storage operations the replication engine relies on.
///
/// Every write is a "set to this value" operation, so repeating any call
/// with the same arguments leaves the store in the same state.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket labels. A payload that cannot be parsed is `MalformedPolicy`.
    async fn bucket_labels(&self, bucket: &str) -> Result<HashMap<String, String>>;

    /// Lightweight existence check. Any failure reads as "absent".
    async fn object_exists(&self, bucket: &str, key: &str) -> bool;

    /// Current state of an object, `None` when it does not exist
    async fn snapshot(&self, bucket: &str, key: &str) -> Result<Option<ObjectSnapshot>>;

    /// Replace the object's custom metadata wholesale
    async fn set_metadata(
        &self,
        bucket: &str,
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<()>;

    /// Replace the object's ACL wholesale
    async fn set_acl(&self, bucket: &str, key: &str, acl: &Acl) -> Result<()>;

    /// Copy one object, optionally carrying its metadata and ACL along
    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
        preserve_metadata_and_acl: bool,
    ) -> Result<()>;

    /// Remove an object. Removing an absent object succeeds.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;
}
