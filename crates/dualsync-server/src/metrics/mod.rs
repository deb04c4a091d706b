//! Prometheus metrics for DualSync
//!
//! Exposes metrics at `/metrics` endpoint in Prometheus format. Engine
//! counters (`dualsync_events_total` and friends) are recorded by
//! `dualsync-engine` and rendered here alongside the HTTP metrics.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Metric names
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "dualsync_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "dualsync_http_request_duration_seconds";

    // System metrics
    pub const UPTIME_SECONDS: &str = "dualsync_uptime_seconds";
    pub const INFO: &str = "dualsync_info";
}

/// One recorder per process; every `MetricsRecorder` shares it.
static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Intake endpoints, used as a low-cardinality metric label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeEndpoint {
    Create,
    Update,
    Delete,
    Events,
    Ping,
    Health,
    Metrics,
}

impl IntakeEndpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Events => "events",
            Self::Ping => "ping",
            Self::Health => "health",
            Self::Metrics => "metrics",
        }
    }

    /// Detect endpoint from HTTP method and path
    pub fn from_request(method: &str, path: &str) -> Option<Self> {
        match (method, path) {
            ("POST", "/create") => Some(Self::Create),
            ("POST", "/update") => Some(Self::Update),
            ("POST", "/delete") => Some(Self::Delete),
            ("POST", "/events") => Some(Self::Events),
            ("POST", "/") => Some(Self::Ping),
            ("GET", "/health") => Some(Self::Health),
            ("GET", "/metrics") => Some(Self::Metrics),
            _ => None,
        }
    }
}

/// Metrics recorder
#[derive(Clone)]
pub struct MetricsRecorder {
    handle: PrometheusHandle,
    start_time: Instant,
}

impl MetricsRecorder {
    /// Initialize the metrics system, installing the global recorder on first use
    pub fn new() -> Result<Self, BuildError> {
        let handle = PROMETHEUS
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())?
            .clone();

        gauge!(names::INFO, "version" => dualsync_core::VERSION).set(1.0);

        Ok(Self {
            handle,
            start_time: Instant::now(),
        })
    }

    /// Get metrics output in Prometheus format
    pub fn render(&self) -> String {
        gauge!(names::UPTIME_SECONDS).set(self.start_time.elapsed().as_secs_f64());

        self.handle.render()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Record an HTTP request
    pub fn record_http_request(&self, endpoint: &'static str, status: u16, duration_secs: f64) {
        let status_class = format!("{}xx", status / 100);

        counter!(
            names::HTTP_REQUESTS_TOTAL,
            "endpoint" => endpoint,
            "status" => status.to_string(),
            "status_class" => status_class
        )
        .increment(1);

        histogram!(
            names::HTTP_REQUEST_DURATION_SECONDS,
            "endpoint" => endpoint
        )
        .record(duration_secs);
    }
}

/// Axum middleware for recording HTTP metrics
pub async fn metrics_middleware(
    State(metrics): State<Arc<MetricsRecorder>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let endpoint = IntakeEndpoint::from_request(&method, &path)
        .map(|e| e.as_str())
        .unwrap_or("other");

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    metrics.record_http_request(endpoint, status, duration);

    debug!(
        method = %method,
        path = %path,
        status = %status,
        duration_ms = %(duration * 1000.0),
        "Request completed"
    );

    response
}

/// Handler for /metrics endpoint
pub async fn metrics_handler(State(metrics): State<Arc<MetricsRecorder>>) -> impl IntoResponse {
    let output = metrics.render();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        output,
    )
}
