//! Handoff to the external large-object transfer pipeline
//!
//! Objects at or above the size threshold are not copied inline. The engine
//! posts a transfer request to the pipeline and treats acceptance as the end
//! of its responsibility for that event.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dualsync_core::config::OffloadConfig;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};

/// Transfer request handed to the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffloadRequest {
    pub source_bucket: String,
    pub source_key: String,
    pub destination_bucket: String,
    pub destination_key: String,
    pub size_bytes: u64,
}

/// The large-object pipeline as seen by the engine
#[async_trait]
pub trait OffloadPipeline: Send + Sync {
    /// Ok once the pipeline has accepted the request
    async fn offload(&self, request: &OffloadRequest) -> EngineResult<()>;
}

/// Posts requests as JSON to an HTTP endpoint
pub struct HttpOffloadPipeline {
    client: Client,
    endpoint: String,
}

impl HttpOffloadPipeline {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> EngineResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl OffloadPipeline for HttpOffloadPipeline {
    async fn offload(&self, request: &OffloadRequest) -> EngineResult<()> {
        debug!(
            "Posting offload request for {}/{} to {}",
            request.source_bucket, request.source_key, self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| EngineError::Offload(format!("{}: {}", self.endpoint, e)))?;

        if !response.status().is_success() {
            return Err(EngineError::Offload(format!(
                "{} rejected {}/{}: {}",
                self.endpoint,
                request.source_bucket,
                request.source_key,
                response.status()
            )));
        }

        info!(
            "Offloaded {}/{} ({} bytes) to large-object pipeline",
            request.source_bucket, request.source_key, request.size_bytes
        );
        Ok(())
    }
}

/// Used when no pipeline is configured. Large objects fail so that the
/// event source keeps them pending instead of silently dropping them.
#[derive(Debug, Default)]
pub struct DisabledOffload;

#[async_trait]
impl OffloadPipeline for DisabledOffload {
    async fn offload(&self, request: &OffloadRequest) -> EngineResult<()> {
        Err(EngineError::Offload(format!(
            "no offload endpoint configured for {}/{} ({} bytes)",
            request.source_bucket, request.source_key, request.size_bytes
        )))
    }
}

/// Build the pipeline client described by the configuration
pub fn offload_from_config(config: &OffloadConfig) -> EngineResult<Arc<dyn OffloadPipeline>> {
    match &config.endpoint {
        Some(endpoint) => Ok(Arc::new(HttpOffloadPipeline::new(
            endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )?)),
        None => Ok(Arc::new(DisabledOffload)),
    }
}
