//! Dataset preparation: from per-component CSV files to one wide table.
//!
//! ## Submodules
//!
//! - [`table`]: The wide, time-indexed [`SensorTable`] and its resampling
//! - [`csv_io`]: Reading and writing tables and tag maps as CSV
//! - [`merge`]: Component discovery, merging and the inverse split
//! - [`upload`]: Writing component files to an [`ObjectStore`](crate::store::ObjectStore)
//!
//! ## Data Flow
//!
//! ```text
//! <input>/<component>/*.csv
//!        │
//!        ▼
//! discover_components() ──▶ Vec<ComponentFrame>
//!        │
//!        ├──▶ merge() ──▶ (SensorTable, TagComponentMap) ──▶ merged.csv, tags.csv
//!        │
//!        └──▶ upload_dataset() ──▶ <prefix>/<component>/sensors.csv
//! ```

pub mod csv_io;
pub mod merge;
pub mod table;
pub mod upload;

pub use csv_io::{read_table, read_table_path, read_tag_map, write_table, write_tag_map};
pub use merge::{discover_components, merge, read_component_csv, split, ComponentFrame};
pub use table::{SensorColumn, SensorTable};
pub use upload::{component_key, upload_dataset, SENSOR_FILE_NAME};

use std::path::PathBuf;

use chrono::NaiveDateTime;
use eqwatch_types::TypesError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while loading, merging or uploading sensor data.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error("missing header row")]
    MissingHeader,

    #[error("row {row}: {source}")]
    Timestamp {
        row: usize,
        #[source]
        source: TypesError,
    },

    #[error("row {row}: invalid value {value:?} for sensor {tag:?}")]
    InvalidValue { row: usize, tag: String, value: String },

    #[error("duplicate timestamp {0}")]
    DuplicateTimestamp(NaiveDateTime),

    #[error("timestamps are not strictly increasing at {0}")]
    NotMonotonic(NaiveDateTime),

    #[error("sensor {0:?} appears more than once")]
    DuplicateTag(String),

    #[error("column {tag:?} has {actual} values, expected {expected}")]
    ColumnLength {
        tag: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown sensor {0:?}")]
    UnknownTag(String),

    #[error("sensor {0:?} has no component in the tag map")]
    UnmappedTag(String),

    #[error("resample width must be at least one second")]
    InvalidWidth,

    #[error("no component directories with CSV files found under {}", .0.display())]
    NoComponents(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),
}
