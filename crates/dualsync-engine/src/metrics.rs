//! Engine metrics
//!
//! Recorded through the `metrics` facade; they are no-ops until the host
//! process installs a recorder.

use std::time::Duration;

use dualsync_core::types::{EventOperation, ReconcileOutcome};
use metrics::{counter, histogram};

/// Metric names
pub mod names {
    pub const EVENTS_TOTAL: &str = "dualsync_events_total";
    pub const EVENT_DURATION_SECONDS: &str = "dualsync_event_duration_seconds";
    pub const ACTIONS_TOTAL: &str = "dualsync_actions_total";
    pub const SYNC_FAILURES_TOTAL: &str = "dualsync_sync_failures_total";
}

/// Record one handled event and every action it applied
pub fn record_event(operation: EventOperation, outcome: &ReconcileOutcome, elapsed: Duration) {
    counter!(
        names::EVENTS_TOTAL,
        "operation" => operation.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(
        names::EVENT_DURATION_SECONDS,
        "operation" => operation.as_str()
    )
    .record(elapsed.as_secs_f64());

    for action in outcome.actions() {
        counter!(names::ACTIONS_TOTAL, "action" => action.as_str()).increment(1);
    }
}

/// Record a swallowed metadata or ACL push failure
pub fn record_sync_failure(kind: &'static str) {
    counter!(names::SYNC_FAILURES_TOTAL, "kind" => kind).increment(1);
}
