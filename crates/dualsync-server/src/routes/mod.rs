//! Intake routes

mod audit;

pub use audit::AuditLogEntry;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dualsync_core::{
    types::{EventOperation, ReconcileOutcome, ReplicationEvent},
    utils::{generate_request_id, validate_bucket_name},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::server::AppState;

/// Request-level failures, before any reconciliation happens
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl IntakeError {
    pub fn code(&self) -> &'static str {
        match self {
            IntakeError::InvalidPayload(_) => "InvalidPayload",
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        warn!("Rejected notification: {}", self);
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": self.code(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeResponse {
    pub request_id: String,
    pub operation: EventOperation,
    pub bucket: String,
    pub key: String,
    pub outcome: ReconcileOutcome,
}

impl IntoResponse for OutcomeResponse {
    fn into_response(self) -> Response {
        let status = if self.outcome.is_success() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}

async fn reconcile(state: &AppState, event: ReplicationEvent) -> OutcomeResponse {
    let request_id = generate_request_id();
    info!(
        request_id = %request_id,
        "Received {} for {}/{}",
        event.operation, event.source_bucket, event.object_key
    );

    let outcome = state.reconciler.handle(&event).await;

    OutcomeResponse {
        request_id,
        operation: event.operation,
        bucket: event.source_bucket,
        key: event.object_key,
        outcome,
    }
}

async fn audit_notification(
    state: &AppState,
    operation: EventOperation,
    body: &[u8],
) -> Result<OutcomeResponse, IntakeError> {
    let event = AuditLogEntry::parse(body)?.into_event(operation)?;
    Ok(reconcile(state, event).await)
}

/// POST /create
pub async fn create_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<OutcomeResponse, IntakeError> {
    audit_notification(&state, EventOperation::Create, &body).await
}

/// POST /update
pub async fn update_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<OutcomeResponse, IntakeError> {
    audit_notification(&state, EventOperation::Update, &body).await
}

/// POST /delete
pub async fn delete_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<OutcomeResponse, IntakeError> {
    audit_notification(&state, EventOperation::Delete, &body).await
}

/// POST /events
/// Transport-independent `{operation, sourceBucket, objectKey}` body
pub async fn event_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<OutcomeResponse, IntakeError> {
    let event: ReplicationEvent = serde_json::from_slice(&body)
        .map_err(|e| IntakeError::InvalidPayload(e.to_string()))?;
    if event.source_bucket.is_empty() || event.object_key.is_empty() {
        return Err(IntakeError::InvalidPayload(
            "sourceBucket and objectKey are required".to_string(),
        ));
    }
    validate_bucket_name(&event.source_bucket)
        .map_err(|e| IntakeError::InvalidPayload(e.to_string()))?;
    Ok(reconcile(&state, event).await)
}

/// POST /
pub async fn ping_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": dualsync_core::VERSION,
        "uptimeSecs": state.metrics.uptime_secs(),
        "destinationSuffix": state.config.replication.destination_suffix,
    }))
}
