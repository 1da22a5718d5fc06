//! Ground-truth anomaly ranges.
//!
//! A label file has two columns, start and end. The header row is optional:
//! when the first row does not parse as timestamps it is skipped.
//!
//! ```text
//! 2019-08-08 00:00:00,2019-08-09 00:00:00
//! 2019-09-14 12:00:00,2019-09-15 06:30:00
//! ```

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use eqwatch_types::{format_timestamp, parse_timestamp, LabeledRange, TypesError};
use thiserror::Error;
use tracing::{debug, info};

use crate::store::{ObjectStore, StoreError};

/// Errors raised while reading or writing label files.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: expected 2 columns, found {found}")]
    Columns { row: usize, found: usize },

    #[error("row {row}: {source}")]
    Range {
        row: usize,
        #[source]
        source: TypesError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read labeled ranges from CSV.
pub fn read_labels<R: Read>(reader: R) -> Result<Vec<LabeledRange>, LabelError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut labels = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        let row = idx + 1;

        // Blank lines come through as a single empty field
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() < 2 {
            return Err(LabelError::Columns {
                row,
                found: record.len(),
            });
        }

        let (raw_start, raw_end) = (&record[0], &record[1]);
        let parsed = parse_timestamp(raw_start).and_then(|s| parse_timestamp(raw_end).map(|e| (s, e)));
        let (start, end) = match parsed {
            Ok(pair) => pair,
            Err(_) if row == 1 => {
                debug!(header = ?record, "treating first row as header");
                continue;
            }
            Err(source) => return Err(LabelError::Range { row, source }),
        };

        let label = LabeledRange::new(start, end).map_err(|source| LabelError::Range { row, source })?;
        labels.push(label);
    }

    debug!(labels = labels.len(), "labels read");
    Ok(labels)
}

/// Read labeled ranges from a file.
pub fn read_labels_path(path: &Path) -> Result<Vec<LabeledRange>, LabelError> {
    let file = File::open(path).map_err(|source| LabelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_labels(file)
}

/// Write labeled ranges as headerless `start,end` rows.
pub fn write_labels<W: Write>(labels: &[LabeledRange], writer: W) -> Result<(), LabelError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    for label in labels {
        wtr.write_record([format_timestamp(&label.range.start), format_timestamp(&label.range.end)])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write labeled ranges to `key` in the store.
pub fn upload_labels(store: &dyn ObjectStore, key: &str, labels: &[LabeledRange]) -> Result<(), LabelError> {
    store.head_bucket()?;
    let mut body = Vec::new();
    write_labels(labels, &mut body)?;
    store.put(key, &body)?;
    info!(store = store.description(), key, labels = labels.len(), "labels uploaded");
    Ok(())
}
