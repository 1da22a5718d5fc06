//! Error type for the core types.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised while constructing core types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// A timestamp string matched none of the accepted formats.
    #[error("invalid timestamp: {0:?}")]
    Timestamp(String),

    /// A range whose end precedes its start.
    #[error("range ends before it starts: {start} > {end}")]
    InvertedRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// A tag assigned to two different components.
    #[error("tag {tag:?} is assigned to both {existing:?} and {conflicting:?}")]
    TagConflict {
        tag: String,
        existing: String,
        conflicting: String,
    },
}
