//! Local filesystem object store
//!
//! Layout under `data_dir`:
//!
//! ```text
//! <bucket>/labels.json              bucket labels (JSON object)
//! <bucket>/objects/<sha256(key)>    object bytes
//! <bucket>/objects/<sha256(key)>.json  object record (checksum, times, metadata, ACL)
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dualsync_core::types::{Acl, ObjectSnapshot};
use dualsync_core::utils::validate_bucket_name;
use dualsync_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::content_checksum;
use crate::engine::ObjectStore;

/// Persisted per-object record
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ObjectRecord {
    key: String,
    size_bytes: u64,
    checksum: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    #[serde(default)]
    acl: Acl,
}

impl ObjectRecord {
    fn into_snapshot(self, bucket: &str) -> ObjectSnapshot {
        ObjectSnapshot {
            bucket: bucket.to_string(),
            key: self.key,
            exists: true,
            checksum: self.checksum,
            size_bytes: self.size_bytes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            metadata: self.metadata,
            acl: self.acl,
        }
    }
}

/// Local filesystem storage
pub struct LocalObjectStore {
    data_dir: PathBuf,
}

impl LocalObjectStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).await?;
        info!("Storage initialized at {:?}", self.data_dir);
        Ok(())
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf> {
        validate_bucket_name(bucket)?;
        Ok(self.data_dir.join(bucket))
    }

    fn labels_path(&self, bucket: &str) -> Result<PathBuf> {
        Ok(self.bucket_path(bucket)?.join("labels.json"))
    }

    fn data_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        // Keys may contain '/', so they are hashed into a flat directory
        Ok(self
            .bucket_path(bucket)?
            .join("objects")
            .join(content_checksum(key.as_bytes())))
    }

    fn record_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let mut path = self.data_path(bucket, key)?.into_os_string();
        path.push(".json");
        Ok(PathBuf::from(path))
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        if fs::try_exists(self.bucket_path(bucket)?).await? {
            Ok(())
        } else {
            Err(Error::NoSuchBucket(bucket.to_string()))
        }
    }

    async fn read_record(&self, bucket: &str, key: &str) -> Result<Option<ObjectRecord>> {
        match fs::read(self.record_path(bucket, key)?).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn require_record(&self, bucket: &str, key: &str) -> Result<ObjectRecord> {
        self.read_record(bucket, key)
            .await?
            .ok_or_else(|| Error::NoSuchKey(format!("{}/{}", bucket, key)))
    }

    async fn write_record(&self, bucket: &str, record: &ObjectRecord) -> Result<()> {
        let raw = serde_json::to_vec_pretty(record)?;
        write_atomic(&self.record_path(bucket, &record.key)?, &raw).await
    }

    /// Create a bucket directory
    pub async fn create_bucket(&self, bucket: &str) -> Result<()> {
        fs::create_dir_all(self.bucket_path(bucket)?.join("objects")).await?;
        info!("Created bucket {}", bucket);
        Ok(())
    }

    /// Replace a bucket's labels
    pub async fn set_bucket_labels(
        &self,
        bucket: &str,
        labels: &HashMap<String, String>,
    ) -> Result<()> {
        self.ensure_bucket(bucket).await?;
        let raw = serde_json::to_vec_pretty(labels)?;
        write_atomic(&self.labels_path(bucket)?, &raw).await
    }

    /// Store object bytes. Overwriting starts a new object generation.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        metadata: HashMap<String, String>,
        acl: Acl,
    ) -> Result<ObjectSnapshot> {
        self.ensure_bucket(bucket).await?;

        write_atomic(&self.data_path(bucket, key)?, &data).await?;

        let now = Utc::now();
        let record = ObjectRecord {
            key: key.to_string(),
            size_bytes: data.len() as u64,
            checksum: content_checksum(&data),
            created_at: now,
            updated_at: now,
            metadata,
            acl,
        };
        self.write_record(bucket, &record).await?;

        debug!("Stored object {}/{} ({} bytes)", bucket, key, data.len());
        Ok(record.into_snapshot(bucket))
    }

    /// Read object bytes
    pub async fn read_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        match fs::read(self.data_path(bucket, key)?).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NoSuchKey(format!("{}/{}", bucket, key)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Health check - verify storage is accessible
    pub async fn health_check(&self) -> Result<()> {
        if !fs::try_exists(&self.data_dir).await.unwrap_or(false) {
            return Err(Error::StorageError(
                "Data directory does not exist".to_string(),
            ));
        }

        let test_file = self.data_dir.join(".health_check");
        match fs::write(&test_file, "ok").await {
            Ok(_) => {
                let _ = fs::remove_file(&test_file).await;
                Ok(())
            }
            Err(e) => Err(Error::StorageError(format!("Storage not writable: {}", e))),
        }
    }
}

/// Write to a sibling temp file, then rename over the target.
/// Every writer gets its own temp file, so concurrent writers of the same
/// target never clobber each other; the last rename wins.
async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    let tmp = PathBuf::from(tmp);

    let written = async {
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, path).await
    }
    .await;

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn bucket_labels(&self, bucket: &str) -> Result<HashMap<String, String>> {
        self.ensure_bucket(bucket).await?;

        match fs::read(self.labels_path(bucket)?).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map_err(|e| Error::MalformedPolicy(format!("{}: {}", bucket, e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> bool {
        let path = match self.record_path(bucket, key) {
            Ok(path) => path,
            Err(e) => {
                debug!("Existence check for {}/{} refused: {}", bucket, key, e);
                return false;
            }
        };
        match fs::try_exists(path).await {
            Ok(exists) => exists,
            Err(e) => {
                debug!("Existence check for {}/{} failed: {}", bucket, key, e);
                false
            }
        }
    }

    async fn snapshot(&self, bucket: &str, key: &str) -> Result<Option<ObjectSnapshot>> {
        Ok(self
            .read_record(bucket, key)
            .await?
            .map(|record| record.into_snapshot(bucket)))
    }

    async fn set_metadata(
        &self,
        bucket: &str,
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<()> {
        let mut record = self.require_record(bucket, key).await?;
        record.metadata = metadata.clone();
        record.updated_at = Utc::now();
        self.write_record(bucket, &record).await?;
        debug!("Set metadata on {}/{} ({} entries)", bucket, key, metadata.len());
        Ok(())
    }

    async fn set_acl(&self, bucket: &str, key: &str, acl: &Acl) -> Result<()> {
        let mut record = self.require_record(bucket, key).await?;
        record.acl = acl.clone();
        record.updated_at = Utc::now();
        self.write_record(bucket, &record).await?;
        debug!("Set ACL on {}/{} ({} entries)", bucket, key, acl.len());
        Ok(())
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
        preserve_metadata_and_acl: bool,
    ) -> Result<()> {
        let source = self.require_record(source_bucket, source_key).await?;
        let data = self.read_object(source_bucket, source_key).await?;
        self.ensure_bucket(destination_bucket).await?;

        write_atomic(&self.data_path(destination_bucket, destination_key)?, &data).await?;

        let (metadata, acl) = if preserve_metadata_and_acl {
            (source.metadata, source.acl)
        } else {
            (HashMap::new(), Acl::new())
        };
        let record = ObjectRecord {
            key: destination_key.to_string(),
            size_bytes: data.len() as u64,
            checksum: content_checksum(&data),
            // The copy records which source generation it holds
            created_at: source.created_at,
            updated_at: Utc::now(),
            metadata,
            acl,
        };
        self.write_record(destination_bucket, &record).await?;

        debug!(
            "Copied {}/{} -> {}/{} ({} bytes)",
            source_bucket,
            source_key,
            destination_bucket,
            destination_key,
            data.len()
        );
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        for path in [self.record_path(bucket, key)?, self.data_path(bucket, key)?] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!("Deleted object {}/{}", bucket, key);
        Ok(())
    }
}
