//! Object storage for prepared datasets and labels.
//!
//! This module provides a trait-based abstraction over the bucket that
//! training data is uploaded to, so preparation code does not care whether
//! objects land in a local directory or somewhere else.
//!
//! Key layout used by the preparer: `<prefix>/<component>/sensors.csv`.

mod error;
mod local;
pub mod region;

pub use error::StoreError;
pub use local::LocalStore;

use std::fmt::Debug;

/// Trait for reading and writing objects in a bucket.
///
/// # Example
///
/// ```no_run
/// use eqwatch::{LocalStore, ObjectStore};
///
/// let store = LocalStore::new("./buckets", "my-bucket");
/// store.head_bucket()?;
/// store.put("training-data/impeller/sensors.csv", b"Timestamp,Sensor0\n")?;
/// # Ok::<(), eqwatch::StoreError>(())
/// ```
pub trait ObjectStore: Debug {
    /// Check that the bucket exists and is accessible.
    ///
    /// Distinguishes a forbidden bucket from a missing one.
    fn head_bucket(&self) -> Result<(), StoreError>;

    /// Write an object, replacing any existing one.
    fn put(&self, key: &str, body: &[u8]) -> Result<(), StoreError>;

    /// Read an object.
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// List keys starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Returns a human-readable description of the store (e.g. `local://buckets/name`).
    fn description(&self) -> &str;
}

/// Join key segments with `/`, dropping empty segments and stray slashes.
pub fn join_key(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
