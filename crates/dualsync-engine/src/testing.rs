//! Test fixtures: an in-memory store wrapped with call counting and fault
//! injection, plus a recording offload pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Duration;
use dualsync_core::config::ReplicationConfig;
use dualsync_core::types::{Acl, ObjectSnapshot};
use dualsync_core::{Error, Result};
use dualsync_storage::{MemoryObjectStore, ObjectStore};
use parking_lot::Mutex;

use crate::error::{EngineError, EngineResult};
use crate::offload::{OffloadPipeline, OffloadRequest};
use crate::reconciler::Reconciler;

pub const SOURCE_BUCKET: &str = "photos";

pub fn meta(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub bucket_labels: usize,
    pub object_exists: usize,
    pub source_snapshots: usize,
    pub destination_snapshots: usize,
    pub set_metadata: usize,
    pub set_acl: usize,
    pub copy_object: usize,
    pub delete_object: usize,
}

impl Calls {
    /// Calls that write to the destination
    pub fn mutating(&self) -> usize {
        self.set_metadata + self.set_acl + self.copy_object + self.delete_object
    }
}

#[derive(Debug, Default)]
struct Faults {
    copy: bool,
    set_metadata: bool,
    set_acl: bool,
    source_snapshot: bool,
    exists_check: bool,
    delete: Option<Error>,
    mutate_source: Option<HashMap<String, String>>,
    rewrite_source: Option<String>,
}

struct RecordingStore {
    inner: Arc<MemoryObjectStore>,
    calls: Mutex<Calls>,
    faults: Mutex<Faults>,
}

fn injected(op: &str) -> Error {
    Error::StorageError(format!("injected {} failure", op))
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn bucket_labels(&self, bucket: &str) -> Result<HashMap<String, String>> {
        self.calls.lock().bucket_labels += 1;
        self.inner.bucket_labels(bucket).await
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> bool {
        self.calls.lock().object_exists += 1;
        if self.faults.lock().exists_check {
            return false;
        }
        self.inner.object_exists(bucket, key).await
    }

    async fn snapshot(&self, bucket: &str, key: &str) -> Result<Option<ObjectSnapshot>> {
        if bucket == SOURCE_BUCKET {
            self.calls.lock().source_snapshots += 1;
            if self.faults.lock().source_snapshot {
                return Err(injected("snapshot"));
            }
        } else {
            self.calls.lock().destination_snapshots += 1;
        }
        self.inner.snapshot(bucket, key).await
    }

    async fn set_metadata(
        &self,
        bucket: &str,
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<()> {
        self.calls.lock().set_metadata += 1;
        if self.faults.lock().set_metadata {
            return Err(injected("set_metadata"));
        }
        self.inner.set_metadata(bucket, key, metadata).await
    }

    async fn set_acl(&self, bucket: &str, key: &str, acl: &Acl) -> Result<()> {
        self.calls.lock().set_acl += 1;
        if self.faults.lock().set_acl {
            return Err(injected("set_acl"));
        }
        self.inner.set_acl(bucket, key, acl).await
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
        preserve_metadata_and_acl: bool,
    ) -> Result<()> {
        self.calls.lock().copy_object += 1;
        if self.faults.lock().copy {
            return Err(injected("copy"));
        }
        self.inner
            .copy_object(
                source_bucket,
                source_key,
                destination_bucket,
                destination_key,
                preserve_metadata_and_acl,
            )
            .await?;

        // Simulate a writer touching the source while the transfer ran
        let mutation = self.faults.lock().mutate_source.take();
        if let Some(metadata) = mutation {
            if let Some(mut current) = self.inner.snapshot(source_bucket, source_key).await? {
                current.metadata = metadata;
                current.updated_at = current.updated_at + Duration::seconds(1);
                self.inner.insert_sized(current)?;
            }
        }
        let rewrite = self.faults.lock().rewrite_source.take();
        if let Some(checksum) = rewrite {
            if let Some(mut current) = self.inner.snapshot(source_bucket, source_key).await? {
                current.checksum = checksum;
                current.created_at = current.updated_at + Duration::seconds(1);
                current.updated_at = current.created_at;
                self.inner.insert_sized(current)?;
            }
        }
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.calls.lock().delete_object += 1;
        let fault = self.faults.lock().delete.take();
        if let Some(err) = fault {
            return Err(err);
        }
        self.inner.delete_object(bucket, key).await
    }
}

#[derive(Default)]
pub struct RecordingOffload {
    requests: Mutex<Vec<OffloadRequest>>,
    reject: Mutex<bool>,
}

#[async_trait]
impl OffloadPipeline for RecordingOffload {
    async fn offload(&self, request: &OffloadRequest) -> EngineResult<()> {
        if *self.reject.lock() {
            return Err(EngineError::Offload("pipeline unavailable".to_string()));
        }
        self.requests.lock().push(request.clone());
        Ok(())
    }
}

/// A source bucket "photos" and its destination "photos-delhi-backup"
pub struct Fixture {
    pub inner: Arc<MemoryObjectStore>,
    store: Arc<RecordingStore>,
    offload: Arc<RecordingOffload>,
    config: ReplicationConfig,
}

impl Fixture {
    /// Source bucket enrolled for dual-region replication
    pub fn new() -> Self {
        let fx = Self::unlabelled();
        fx.inner.set_bucket_labels(
            SOURCE_BUCKET,
            &meta(&[(
                fx.config.policy_label.as_str(),
                fx.config.policy_value.as_str(),
            )]),
        );
        fx
    }

    /// Both buckets exist but the source carries no labels
    pub fn unlabelled() -> Self {
        let config = ReplicationConfig::default();
        let inner = Arc::new(MemoryObjectStore::new());
        inner.create_bucket(SOURCE_BUCKET);
        inner.create_bucket(&config.destination_bucket(SOURCE_BUCKET));

        let store = Arc::new(RecordingStore {
            inner: Arc::clone(&inner),
            calls: Mutex::new(Calls::default()),
            faults: Mutex::new(Faults::default()),
        });

        Self {
            inner,
            store,
            offload: Arc::new(RecordingOffload::default()),
            config,
        }
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.config.clone(), self.store(), self.offload.clone())
    }

    pub fn destination_bucket(&self) -> String {
        self.config.destination_bucket(SOURCE_BUCKET)
    }

    pub fn calls(&self) -> Calls {
        *self.store.calls.lock()
    }

    pub fn offloads(&self) -> Vec<OffloadRequest> {
        self.offload.requests.lock().clone()
    }

    pub fn put_source(
        &self,
        key: &str,
        data: &str,
        metadata: HashMap<String, String>,
    ) -> ObjectSnapshot {
        self.put_source_with_acl(key, data, metadata, Acl::new())
    }

    pub fn put_source_with_acl(
        &self,
        key: &str,
        data: &str,
        metadata: HashMap<String, String>,
        acl: Acl,
    ) -> ObjectSnapshot {
        self.inner
            .put_object(SOURCE_BUCKET, key, Bytes::from(data.to_string()), metadata, acl)
            .unwrap()
    }

    pub fn put_destination(
        &self,
        key: &str,
        data: &str,
        metadata: HashMap<String, String>,
    ) -> ObjectSnapshot {
        self.put_destination_with_acl(key, data, metadata, Acl::new())
    }

    pub fn put_destination_with_acl(
        &self,
        key: &str,
        data: &str,
        metadata: HashMap<String, String>,
        acl: Acl,
    ) -> ObjectSnapshot {
        self.inner
            .put_object(
                &self.destination_bucket(),
                key,
                Bytes::from(data.to_string()),
                metadata,
                acl,
            )
            .unwrap()
    }

    /// Source object claiming `size_bytes` without holding the bytes
    pub fn put_source_sized(&self, key: &str, size_bytes: u64) -> ObjectSnapshot {
        let snapshot =
            ObjectSnapshot::new(SOURCE_BUCKET, key, format!("sized-{}", size_bytes), size_bytes);
        self.insert_source(snapshot.clone());
        snapshot
    }

    pub fn insert_source(&self, snapshot: ObjectSnapshot) {
        self.inner.insert_sized(snapshot).unwrap();
    }

    pub fn insert_destination(&self, snapshot: ObjectSnapshot) {
        self.inner.insert_sized(snapshot).unwrap();
    }

    pub async fn destination_snapshot(&self, key: &str) -> Option<ObjectSnapshot> {
        self.inner
            .snapshot(&self.destination_bucket(), key)
            .await
            .unwrap()
    }

    pub fn fail_copy(&self) {
        self.store.faults.lock().copy = true;
    }

    pub fn fail_set_metadata(&self) {
        self.store.faults.lock().set_metadata = true;
    }

    pub fn fail_set_acl(&self) {
        self.store.faults.lock().set_acl = true;
    }

    pub fn fail_source_snapshot(&self) {
        self.store.faults.lock().source_snapshot = true;
    }

    pub fn fail_exists_check(&self) {
        self.store.faults.lock().exists_check = true;
    }

    pub fn fail_delete(&self) {
        self.store.faults.lock().delete = Some(injected("delete"));
    }

    pub fn fail_delete_not_found(&self) {
        self.store.faults.lock().delete = Some(Error::NoSuchKey(format!(
            "{}/never-existed",
            self.destination_bucket()
        )));
    }

    /// The next copy sees the source rewritten with `metadata` right after it lands
    pub fn mutate_source_during_copy(&self, metadata: HashMap<String, String>) {
        self.store.faults.lock().mutate_source = Some(metadata);
    }

    /// The next copy sees the source replaced by a new generation with `checksum`
    pub fn rewrite_source_during_copy(&self, checksum: &str) {
        self.store.faults.lock().rewrite_source = Some(checksum.to_string());
    }

    pub fn reject_offloads(&self) {
        *self.offload.reject.lock() = true;
    }
}
