//! Model evaluation sources.
//!
//! This module provides a trait-based abstraction over where the
//! describe-model document comes from (a file on disk, or a document
//! already held in memory).

mod file;
mod memory;
mod response;

pub use file::FileSource;
pub use memory::StaticSource;
pub use response::{ModelEvaluation, ModelMetrics};

use std::fmt::Debug;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a describe-model document.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ModelMetrics is not valid JSON: {0}")]
    EmbeddedMetrics(#[source] serde_json::Error),

    #[error("response has no ModelMetrics; is the model trained?")]
    MissingMetrics,

    #[error("document is neither a describe-model response nor a metrics object")]
    Unrecognized,

    #[error("{kind} range #{index} ends before it starts")]
    InvalidRange { kind: &'static str, index: usize },

    #[error("diagnostic {name:?} has invalid importance {value}")]
    NegativeImportance { name: String, value: f64 },
}

/// Trait for receiving model evaluations from various sources.
///
/// # Example
///
/// ```no_run
/// use eqwatch::{FileSource, ModelSource};
///
/// let mut source = FileSource::new("model.json");
/// if let Some(eval) = source.poll() {
///     println!("{} predicted ranges", eval.predicted_ranges().len());
/// }
/// ```
pub trait ModelSource: Send + Debug {
    /// Poll for the latest evaluation.
    ///
    /// Returns `Some` when new data is available, `None` otherwise.
    fn poll(&mut self) -> Option<ModelEvaluation>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// Returns the error message from the last poll, if it failed.
    fn error(&self) -> Option<&str>;
}
