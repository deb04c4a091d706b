//! In-memory object store
//!
//! Mirrors [`LocalObjectStore`](crate::LocalObjectStore) semantics without
//! touching disk. Bucket labels are kept as raw JSON so a malformed label
//! payload can be represented.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dualsync_core::types::{Acl, ObjectSnapshot};
use dualsync_core::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

use crate::content_checksum;
use crate::engine::ObjectStore;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    snapshot: ObjectSnapshot,
}

#[derive(Debug, Default)]
struct MemoryBucket {
    labels_json: Option<String>,
    objects: HashMap<String, StoredObject>,
}

/// Process-local object store
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: RwLock<HashMap<String, MemoryBucket>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_bucket(&self, bucket: &str) {
        self.buckets.write().entry(bucket.to_string()).or_default();
    }

    pub fn set_bucket_labels(&self, bucket: &str, labels: &HashMap<String, String>) {
        // A HashMap<String, String> always serializes
        let raw = serde_json::to_string(labels).unwrap_or_default();
        self.set_bucket_labels_raw(bucket, raw);
    }

    /// Store a label payload verbatim, even if it does not parse
    pub fn set_bucket_labels_raw(&self, bucket: &str, raw: impl Into<String>) {
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .labels_json = Some(raw.into());
    }

    /// Store object bytes. Overwriting starts a new object generation.
    pub fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        metadata: HashMap<String, String>,
        acl: Acl,
    ) -> Result<ObjectSnapshot> {
        let snapshot = ObjectSnapshot::new(bucket, key, content_checksum(&data), data.len() as u64)
            .with_metadata(metadata)
            .with_acl(acl);
        self.insert(snapshot.clone(), data)?;
        Ok(snapshot)
    }

    /// Store an object with a caller-built snapshot (timestamps included).
    /// The snapshot's size is taken from `data`; its checksum is kept as given.
    pub fn insert(&self, mut snapshot: ObjectSnapshot, data: Bytes) -> Result<()> {
        let mut buckets = self.buckets.write();
        let bucket = buckets
            .get_mut(&snapshot.bucket)
            .ok_or_else(|| Error::NoSuchBucket(snapshot.bucket.clone()))?;

        snapshot.exists = true;
        snapshot.size_bytes = data.len() as u64;
        bucket
            .objects
            .insert(snapshot.key.clone(), StoredObject { data, snapshot });
        Ok(())
    }

    /// Store a snapshot that claims `size_bytes` without holding the bytes.
    /// Lets large-object routing be exercised without allocating.
    pub fn insert_sized(&self, snapshot: ObjectSnapshot) -> Result<()> {
        let mut buckets = self.buckets.write();
        let bucket = buckets
            .get_mut(&snapshot.bucket)
            .ok_or_else(|| Error::NoSuchBucket(snapshot.bucket.clone()))?;

        bucket.objects.insert(
            snapshot.key.clone(),
            StoredObject {
                data: Bytes::new(),
                snapshot,
            },
        );
        Ok(())
    }

    pub fn read_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        self.buckets
            .read()
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::NoSuchKey(format!("{}/{}", bucket, key)))
    }

    pub fn object_count(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .get(bucket)
            .map(|b| b.objects.len())
            .unwrap_or(0)
    }

    fn with_object_mut<T>(
        &self,
        bucket: &str,
        key: &str,
        f: impl FnOnce(&mut StoredObject) -> T,
    ) -> Result<T> {
        let mut buckets = self.buckets.write();
        let object = buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::NoSuchBucket(bucket.to_string()))?
            .objects
            .get_mut(key)
            .ok_or_else(|| Error::NoSuchKey(format!("{}/{}", bucket, key)))?;
        Ok(f(object))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn bucket_labels(&self, bucket: &str) -> Result<HashMap<String, String>> {
        let buckets = self.buckets.read();
        let b = buckets
            .get(bucket)
            .ok_or_else(|| Error::NoSuchBucket(bucket.to_string()))?;

        match &b.labels_json {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| Error::MalformedPolicy(format!("{}: {}", bucket, e))),
            None => Ok(HashMap::new()),
        }
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> bool {
        self.buckets
            .read()
            .get(bucket)
            .map_or(false, |b| b.objects.contains_key(key))
    }

    async fn snapshot(&self, bucket: &str, key: &str) -> Result<Option<ObjectSnapshot>> {
        Ok(self
            .buckets
            .read()
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .map(|o| o.snapshot.clone()))
    }

    async fn set_metadata(
        &self,
        bucket: &str,
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<()> {
        self.with_object_mut(bucket, key, |object| {
            object.snapshot.metadata = metadata.clone();
            object.snapshot.updated_at = Utc::now();
        })
    }

    async fn set_acl(&self, bucket: &str, key: &str, acl: &Acl) -> Result<()> {
        self.with_object_mut(bucket, key, |object| {
            object.snapshot.acl = acl.clone();
            object.snapshot.updated_at = Utc::now();
        })
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
        preserve_metadata_and_acl: bool,
    ) -> Result<()> {
        let mut buckets = self.buckets.write();

        let source = buckets
            .get(source_bucket)
            .and_then(|b| b.objects.get(source_key))
            .cloned()
            .ok_or_else(|| Error::NoSuchKey(format!("{}/{}", source_bucket, source_key)))?;

        let destination = buckets
            .get_mut(destination_bucket)
            .ok_or_else(|| Error::NoSuchBucket(destination_bucket.to_string()))?;

        // created_at is kept: the copy records which source generation it holds
        let mut snapshot = source.snapshot;
        snapshot.bucket = destination_bucket.to_string();
        snapshot.key = destination_key.to_string();
        snapshot.updated_at = Utc::now();
        if !preserve_metadata_and_acl {
            snapshot.metadata.clear();
            snapshot.acl.clear();
        }

        debug!(
            "Copied {}/{} -> {}/{}",
            source_bucket, source_key, destination_bucket, destination_key
        );
        destination.objects.insert(
            destination_key.to_string(),
            StoredObject {
                data: source.data,
                snapshot,
            },
        );
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        if let Some(b) = self.buckets.write().get_mut(bucket) {
            b.objects.remove(key);
        }
        Ok(())
    }
}
