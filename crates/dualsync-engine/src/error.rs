//! Engine error types

use dualsync_core::types::FailureKind;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures that end an event's handling
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Content copy failed: {0}")]
    ContentCopy(String),

    #[error("Offload handoff failed: {0}")]
    Offload(String),

    #[error("Destination delete failed: {0}")]
    Delete(String),

    #[error("Source object unreadable: {0}")]
    SourceUnreadable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Outcome category reported for this error
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            EngineError::ContentCopy(_) | EngineError::InvalidConfig(_) => FailureKind::ContentCopy,
            EngineError::Offload(_) => FailureKind::Offload,
            EngineError::Delete(_) => FailureKind::Delete,
            EngineError::SourceUnreadable(_) => FailureKind::SourceUnreadable,
        }
    }
}
