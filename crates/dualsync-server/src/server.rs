//! Intake server implementation

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use dualsync_core::{config::DualSyncConfig, Error, Result};
use dualsync_engine::Reconciler;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::info;

use crate::metrics::{metrics_handler, metrics_middleware, MetricsRecorder};
use crate::routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DualSyncConfig>,
    pub reconciler: Arc<Reconciler>,
    pub metrics: Arc<MetricsRecorder>,
}

impl FromRef<AppState> for Arc<MetricsRecorder> {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

impl AppState {
    pub fn new(config: DualSyncConfig, reconciler: Arc<Reconciler>) -> Result<Self> {
        let metrics = MetricsRecorder::new()
            .map_err(|e| Error::InternalError(format!("metrics recorder: {}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            reconciler,
            metrics: Arc::new(metrics),
        })
    }
}

/// Build the intake router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(routes::health_handler))
        .route("/", post(routes::ping_handler))
        .route("/create", post(routes::create_handler))
        .route("/update", post(routes::update_handler))
        .route("/delete", post(routes::delete_handler))
        .route("/events", post(routes::event_handler))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(state)
}

/// HTTP intake server
pub struct IntakeServer {
    state: AppState,
}

impl IntakeServer {
    pub fn new(config: DualSyncConfig, reconciler: Arc<Reconciler>) -> Result<Self> {
        Ok(Self {
            state: AppState::new(config, reconciler)?,
        })
    }

    pub async fn run(self) -> Result<()> {
        let addr = format!(
            "{}:{}",
            self.state.config.server.bind_address, self.state.config.server.port
        );
        let listener = TcpListener::bind(&addr).await?;

        info!("DualSync intake listening on http://{}", addr);
        info!("Prometheus metrics at http://{}/metrics", addr);
        info!(
            "Replicating dual-region buckets to <bucket>{}",
            self.state.config.replication.destination_suffix
        );

        let app = create_router(self.state);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("DualSync intake stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
