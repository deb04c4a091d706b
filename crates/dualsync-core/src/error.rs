//! Error types for DualSync storage operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Bucket Errors
    #[error("The specified bucket does not exist: {0}")]
    NoSuchBucket(String),

    #[error("Malformed bucket policy: {0}")]
    MalformedPolicy(String),

    // Object Errors
    #[error("The specified key does not exist: {0}")]
    NoSuchKey(String),

    // Validation Errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Storage Errors
    #[error("Storage backend error: {0}")]
    StorageError(String),

    // Internal Errors
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::NoSuchBucket(_) => "NoSuchBucket",
            Error::MalformedPolicy(_) => "MalformedPolicy",
            Error::NoSuchKey(_) => "NoSuchKey",
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::InvalidConfig(_) => "InvalidConfig",
            Error::StorageError(_) => "StorageError",
            Error::InternalError(_) => "InternalError",
            Error::Io(_) => "IoError",
            Error::Json(_) => "SerializationError",
        }
    }

    /// True when the error means the addressed object (or its bucket) is absent
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NoSuchKey(_) | Error::NoSuchBucket(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(Error::NoSuchKey("a".into()).is_not_found());
        assert!(Error::NoSuchBucket("b".into()).is_not_found());
        assert!(Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound)).is_not_found());
        assert!(!Error::StorageError("disk".into()).is_not_found());
        assert!(!Error::MalformedPolicy("{".into()).is_not_found());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::NoSuchKey("k".into()).code(), "NoSuchKey");
        assert_eq!(Error::MalformedPolicy("x".into()).code(), "MalformedPolicy");
        assert_eq!(Error::StorageError("x".into()).code(), "StorageError");
        assert_eq!(Error::InvalidArgument("x".into()).code(), "InvalidArgument");
    }
}
