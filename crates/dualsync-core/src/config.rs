//! Configuration for DualSync

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DualSyncConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub replication: ReplicationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub offload: OffloadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DualSyncConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::InvalidConfig(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| crate::Error::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("DUALSYNC_BIND_ADDRESS") {
            config.server.bind_address = addr;
        }
        // PORT is what container platforms hand to the process
        if let Ok(port) = std::env::var("DUALSYNC_PORT").or_else(|_| std::env::var("PORT")) {
            if let Ok(p) = port.parse() {
                config.server.port = p;
            }
        }
        if let Ok(suffix) = std::env::var("DUALSYNC_DESTINATION_SUFFIX") {
            config.replication.destination_suffix = suffix;
        }
        if let Ok(label) = std::env::var("DUALSYNC_POLICY_LABEL") {
            config.replication.policy_label = label;
        }
        if let Ok(value) = std::env::var("DUALSYNC_POLICY_VALUE") {
            config.replication.policy_value = value;
        }
        if let Ok(threshold) = std::env::var("DUALSYNC_LARGE_OBJECT_THRESHOLD_BYTES") {
            if let Ok(t) = threshold.parse() {
                config.replication.large_object_threshold_bytes = t;
            }
        }
        if let Ok(backend) = std::env::var("DUALSYNC_STORAGE_BACKEND") {
            if let Ok(b) = backend.parse() {
                config.storage.backend = b;
            }
        }
        if let Ok(dir) = std::env::var("DUALSYNC_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(endpoint) = std::env::var("DUALSYNC_OFFLOAD_ENDPOINT") {
            config.offload.endpoint = Some(endpoint);
        }
        if let Ok(level) = std::env::var("DUALSYNC_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("DUALSYNC_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.replication.validate()?;
        if self.offload.timeout_secs == 0 {
            return Err(crate::Error::InvalidConfig(
                "offload.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Dual-region replication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// Appended to the source bucket name to form the destination bucket
    pub destination_suffix: String,
    /// Bucket label that enrolls a bucket
    pub policy_label: String,
    /// Exact label value required for enrollment
    pub policy_value: String,
    /// Objects of this size or larger are offloaded instead of copied
    pub large_object_threshold_bytes: u64,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            destination_suffix: crate::DEFAULT_DESTINATION_SUFFIX.to_string(),
            policy_label: crate::DUAL_REGION_LABEL.to_string(),
            policy_value: crate::DUAL_REGION_SENTINEL.to_string(),
            large_object_threshold_bytes: crate::LARGE_OBJECT_THRESHOLD_BYTES,
        }
    }
}

impl ReplicationConfig {
    /// Destination bucket for a source bucket. The only naming scheme in use.
    pub fn destination_bucket(&self, source_bucket: &str) -> String {
        format!("{}{}", source_bucket, self.destination_suffix)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.destination_suffix.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "replication.destination_suffix must not be empty".into(),
            ));
        }
        if self.destination_suffix.contains('/') {
            return Err(crate::Error::InvalidConfig(format!(
                "replication.destination_suffix must not contain '/': {}",
                self.destination_suffix
            )));
        }
        if self.policy_label.is_empty() || self.policy_value.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "replication.policy_label and replication.policy_value must be set".into(),
            ));
        }
        if self.large_object_threshold_bytes == 0 {
            return Err(crate::Error::InvalidConfig(
                "replication.large_object_threshold_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Which object store the engine talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Buckets as directories under `data_dir`
    #[default]
    Local,
    /// Process-local, for dry runs
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            data_dir: PathBuf::from("/data/dualsync"),
        }
    }
}

/// Large-object pipeline handoff
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OffloadConfig {
    /// HTTP endpoint accepting offload requests. Unset means large objects fail.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
