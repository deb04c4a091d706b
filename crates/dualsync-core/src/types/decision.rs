//! Reconciliation decisions and per-event outcomes

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Why an event was skipped without touching the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Key ends in `/`
    FolderMarker,
    /// Bucket is not labelled for dual-region replication
    NotDualRegion,
    /// Source object no longer exists; its delete event owns the cleanup
    SourceMissing,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::FolderMarker => "folder_marker",
            SkipReason::NotDualRegion => "not_dual_region",
            SkipReason::SourceMissing => "source_missing",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single action chosen for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum ReconciliationDecision {
    Skip(SkipReason),
    CopyContent,
    OffloadLarge,
    SyncMetadataOnly,
    SyncAclOnly,
    SyncBoth,
    NoAction,
    Delete,
}

impl ReconciliationDecision {
    /// Decision for a content-equal pair, from which auxiliary parts differ
    pub fn from_diffs(metadata_differs: bool, acl_differs: bool) -> Self {
        match (metadata_differs, acl_differs) {
            (true, true) => ReconciliationDecision::SyncBoth,
            (true, false) => ReconciliationDecision::SyncMetadataOnly,
            (false, true) => ReconciliationDecision::SyncAclOnly,
            (false, false) => ReconciliationDecision::NoAction,
        }
    }

    pub fn syncs_metadata(&self) -> bool {
        matches!(
            self,
            ReconciliationDecision::SyncMetadataOnly | ReconciliationDecision::SyncBoth
        )
    }

    pub fn syncs_acl(&self) -> bool {
        matches!(
            self,
            ReconciliationDecision::SyncAclOnly | ReconciliationDecision::SyncBoth
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationDecision::Skip(_) => "skip",
            ReconciliationDecision::CopyContent => "copy_content",
            ReconciliationDecision::OffloadLarge => "offload_large",
            ReconciliationDecision::SyncMetadataOnly => "sync_metadata_only",
            ReconciliationDecision::SyncAclOnly => "sync_acl_only",
            ReconciliationDecision::SyncBoth => "sync_both",
            ReconciliationDecision::NoAction => "no_action",
            ReconciliationDecision::Delete => "delete",
        }
    }
}

impl std::fmt::Display for ReconciliationDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconciliationDecision::Skip(reason) => write!(f, "skip({})", reason),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A write that was actually applied to the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedAction {
    CopiedContent,
    SyncedMetadata,
    SyncedAcl,
    Deleted,
    Offloaded,
}

impl AppliedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppliedAction::CopiedContent => "copied_content",
            AppliedAction::SyncedMetadata => "synced_metadata",
            AppliedAction::SyncedAcl => "synced_acl",
            AppliedAction::Deleted => "deleted",
            AppliedAction::Offloaded => "offloaded",
        }
    }
}

/// Terminal failure categories. Only these ask the event source to redeliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ContentCopy,
    Offload,
    Delete,
    SourceUnreadable,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ContentCopy => "content_copy",
            FailureKind::Offload => "offload",
            FailureKind::Delete => "delete",
            FailureKind::SourceUnreadable => "source_unreadable",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally observable result of handling one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Skipped { reason: SkipReason },
    Converged { actions: BTreeSet<AppliedAction> },
    Failed { kind: FailureKind },
}

impl ReconcileOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        ReconcileOutcome::Skipped { reason }
    }

    pub fn converged(actions: impl IntoIterator<Item = AppliedAction>) -> Self {
        ReconcileOutcome::Converged {
            actions: actions.into_iter().collect(),
        }
    }

    pub fn failed(kind: FailureKind) -> Self {
        ReconcileOutcome::Failed { kind }
    }

    /// Skips and (possibly partial) convergence both count as success
    pub fn is_success(&self) -> bool {
        !matches!(self, ReconcileOutcome::Failed { .. })
    }

    pub fn actions(&self) -> BTreeSet<AppliedAction> {
        match self {
            ReconcileOutcome::Converged { actions } => actions.clone(),
            _ => BTreeSet::new(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Skipped { .. } => "skipped",
            ReconcileOutcome::Converged { .. } => "converged",
            ReconcileOutcome::Failed { .. } => "failed",
        }
    }
}
