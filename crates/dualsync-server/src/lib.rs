//! HTTP intake for DualSync
//!
//! Receives object-change notifications, hands each one to the
//! [`Reconciler`](dualsync_engine::Reconciler) and reports the outcome.

pub mod metrics;
pub mod routes;
pub mod server;

pub use metrics::MetricsRecorder;
pub use server::{AppState, IntakeServer};
