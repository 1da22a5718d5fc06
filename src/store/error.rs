//! Error types for object storage.

use std::io;

use thiserror::Error;

/// Errors that can occur when accessing a bucket.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The bucket exists but cannot be read or written with the current identity.
    #[error("access to bucket {bucket:?} is forbidden: check that your credentials allow reading and writing it")]
    Forbidden { bucket: String },

    /// The bucket does not exist.
    #[error("bucket {bucket:?} does not exist: create it first or fix `storage.bucket`")]
    BucketNotFound { bucket: String },

    /// The object does not exist.
    #[error("object {key:?} not found in bucket {bucket:?}")]
    KeyNotFound { bucket: String, key: String },

    /// Key is empty, absolute, or escapes the bucket.
    #[error("invalid object key {0:?}")]
    InvalidKey(String),

    /// Any other I/O failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Map an I/O error raised while touching `bucket` (and optionally `key`).
    pub(crate) fn from_io(err: io::Error, bucket: &str, key: Option<&str>) -> Self {
        match (err.kind(), key) {
            (io::ErrorKind::PermissionDenied, _) => StoreError::Forbidden {
                bucket: bucket.to_string(),
            },
            (io::ErrorKind::NotFound, Some(key)) => StoreError::KeyNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            (io::ErrorKind::NotFound, None) => StoreError::BucketNotFound {
                bucket: bucket.to_string(),
            },
            _ => StoreError::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_is_forbidden() {
        let err = StoreError::from_io(io::Error::from(io::ErrorKind::PermissionDenied), "b", None);
        assert!(matches!(err, StoreError::Forbidden { .. }));
        assert!(err.to_string().contains("forbidden"));
    }

    #[test]
    fn test_not_found_depends_on_key() {
        let err = StoreError::from_io(io::Error::from(io::ErrorKind::NotFound), "b", None);
        assert!(matches!(err, StoreError::BucketNotFound { .. }));

        let err = StoreError::from_io(io::Error::from(io::ErrorKind::NotFound), "b", Some("k"));
        assert!(matches!(err, StoreError::KeyNotFound { .. }));
    }
}
