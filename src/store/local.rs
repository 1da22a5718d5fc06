//! Directory-backed bucket.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::{ObjectStore, StoreError};

/// A bucket stored as a directory: `<root>/<bucket>/<key>`.
///
/// The bucket directory must already exist; it is never created
/// implicitly, mirroring how a real bucket has to be provisioned first.
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    bucket: String,
    description: String,
}

impl LocalStore {
    /// Create a store for `bucket` under `root`.
    pub fn new<P: AsRef<Path>>(root: P, bucket: impl Into<String>) -> Self {
        let root = root.as_ref().to_path_buf();
        let bucket = bucket.into();
        let description = format!("local://{}/{}", root.display(), bucket);
        Self {
            root,
            bucket,
            description,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    /// Resolve a key to a path inside the bucket, rejecting keys that escape it.
    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let well_formed = !key.is_empty()
            && !key.ends_with('/')
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !well_formed {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.bucket_dir().join(relative))
    }

    fn collect_keys(&self, dir: &Path, prefix: &str, keys: &mut Vec<String>) -> Result<(), StoreError> {
        let entries = fs::read_dir(dir).map_err(|e| StoreError::from_io(e, &self.bucket, None))?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.collect_keys(&path, prefix, keys)?;
                continue;
            }
            let Ok(relative) = path.strip_prefix(self.bucket_dir()) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        Ok(())
    }
}

impl ObjectStore for LocalStore {
    fn head_bucket(&self) -> Result<(), StoreError> {
        let dir = self.bucket_dir();
        let metadata = fs::metadata(&dir).map_err(|e| StoreError::from_io(e, &self.bucket, None))?;
        if !metadata.is_dir() {
            return Err(StoreError::BucketNotFound {
                bucket: self.bucket.clone(),
            });
        }
        // Listing fails with PermissionDenied on unreadable buckets
        fs::read_dir(&dir).map_err(|e| StoreError::from_io(e, &self.bucket, None))?;
        Ok(())
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<(), StoreError> {
        let path = self.object_path(key)?;
        self.head_bucket()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::from_io(e, &self.bucket, None))?;
        }
        fs::write(&path, body).map_err(|e| StoreError::from_io(e, &self.bucket, None))?;
        debug!(bucket = %self.bucket, key, bytes = body.len(), "object written");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(key)?;
        self.head_bucket()?;
        fs::read(&path).map_err(|e| StoreError::from_io(e, &self.bucket, Some(key)))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.head_bucket()?;
        let mut keys = Vec::new();
        self.collect_keys(&self.bucket_dir(), prefix, &mut keys)?;
        keys.sort();
        Ok(keys)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with_bucket() -> (TempDir, LocalStore) {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("bucket")).unwrap();
        let store = LocalStore::new(root.path(), "bucket");
        (root, store)
    }

    #[test]
    fn test_missing_bucket_is_not_found() {
        let root = TempDir::new().unwrap();
        let store = LocalStore::new(root.path(), "nope");
        let err = store.head_bucket().unwrap_err();
        assert!(matches!(err, StoreError::BucketNotFound { ref bucket } if bucket == "nope"));

        let err = store.put("a/b.csv", b"x").unwrap_err();
        assert!(matches!(err, StoreError::BucketNotFound { .. }));
    }

    #[test]
    fn test_put_get_roundtrip() {
        let (_root, store) = store_with_bucket();
        store.put("training-data/impeller/sensors.csv", b"Timestamp,Sensor0\n").unwrap();
        let body = store.get("training-data/impeller/sensors.csv").unwrap();
        assert_eq!(body, b"Timestamp,Sensor0\n");
    }

    #[test]
    fn test_get_missing_key() {
        let (_root, store) = store_with_bucket();
        let err = store.get("missing.csv").unwrap_err();
        assert!(matches!(err, StoreError::KeyNotFound { ref key, .. } if key == "missing.csv"));
    }

    #[test]
    fn test_list_with_prefix() {
        let (_root, store) = store_with_bucket();
        store.put("training-data/volute/sensors.csv", b"").unwrap();
        store.put("training-data/impeller/sensors.csv", b"").unwrap();
        store.put("labels/labels.csv", b"").unwrap();

        let keys = store.list("training-data/").unwrap();
        assert_eq!(
            keys,
            vec!["training-data/impeller/sensors.csv", "training-data/volute/sensors.csv"]
        );
        assert_eq!(store.list("").unwrap().len(), 3);
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let (_root, store) = store_with_bucket();
        for key in ["", "../outside.csv", "a/../../b.csv", "/abs.csv", "dir/"] {
            let err = store.put(key, b"x").unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)), "key {key:?}");
        }
    }

    #[test]
    fn test_description() {
        let store = LocalStore::new("/data", "bucket");
        assert_eq!(store.description(), "local:///data/bucket");
    }
}
