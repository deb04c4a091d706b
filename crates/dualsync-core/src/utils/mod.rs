//! Utility functions

use uuid::Uuid;

/// Generate a unique request ID
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string().replace("-", "").to_uppercase()
}

/// Folder markers are zero-byte placeholders whose key ends in `/`
pub fn is_folder_marker(key: &str) -> bool {
    key.ends_with('/')
}

/// Bucket names become path components on the local backend, so anything
/// that could leave the data directory is refused.
pub fn validate_bucket_name(bucket: &str) -> crate::Result<()> {
    let invalid = bucket.is_empty()
        || bucket == "."
        || bucket.contains("..")
        || bucket.contains('/')
        || bucket.contains('\\')
        || bucket.contains('\0');
    if invalid {
        return Err(crate::Error::InvalidArgument(format!(
            "invalid bucket name: {:?}",
            bucket
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_marker() {
        assert!(is_folder_marker("photos/"));
        assert!(is_folder_marker("a/b/c/"));
        assert!(!is_folder_marker("photos/cat.jpg"));
        assert!(!is_folder_marker(""));
    }

    #[test]
    fn test_bucket_name_validation() {
        assert!(validate_bucket_name("photos").is_ok());
        assert!(validate_bucket_name("photos-delhi-backup").is_ok());
        assert!(validate_bucket_name("my.bucket.v2").is_ok());

        for bad in ["", ".", "..", "../etc", "a/b", "/etc", "a\\b", "x..y"] {
            let err = validate_bucket_name(bad).unwrap_err();
            assert!(matches!(err, crate::Error::InvalidArgument(_)), "{:?}", bad);
        }
    }

    #[test]
    fn test_request_id_shape() {
        let id = generate_request_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }
}
