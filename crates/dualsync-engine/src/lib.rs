//! DualSync Engine - dual-region replication reconciliation
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Reconciler                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  event ─► EligibilityFilter ─► existence check ─► Divergence │
//! │              (labels)            (destination)     Detector  │
//! │                                                      │       │
//! │                     ┌────────────────────────────────┤       │
//! │                     ▼                                ▼       │
//! │               SizeRouter                       skip content  │
//! │             │            │                           │       │
//! │             ▼            ▼                           │       │
//! │     CopyOrchestrator  OffloadPipeline                │       │
//! │             │                                        │       │
//! │             └──────────────┬─────────────────────────┘       │
//! │                            ▼                                 │
//! │           MetadataReconciler ─► AclReconciler ─► outcome     │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every event is handled from scratch: source and destination are
//! re-read, a single [`ReconciliationDecision`] is derived, and only
//! idempotent "set to the source's value" writes are issued. Duplicate,
//! late or concurrent events therefore converge on the same state.

mod acl;
mod copy;
mod divergence;
mod eligibility;
mod error;
mod metadata;
pub mod metrics;
mod offload;
mod reconciler;
mod router;

pub use acl::AclReconciler;
pub use copy::{CopyOrchestrator, CopyReport};
pub use divergence::DivergenceDetector;
pub use eligibility::EligibilityFilter;
pub use error::{EngineError, EngineResult};
pub use metadata::MetadataReconciler;
pub use offload::{
    offload_from_config, DisabledOffload, HttpOffloadPipeline, OffloadPipeline, OffloadRequest,
};
pub use reconciler::Reconciler;
pub use router::SizeRouter;

// Re-export types from core
pub use dualsync_core::types::{
    AppliedAction, EventOperation, FailureKind, ObjectSnapshot, ReconcileOutcome,
    ReconciliationDecision, ReplicationEvent, SkipReason,
};

#[cfg(test)]
pub(crate) mod testing;
