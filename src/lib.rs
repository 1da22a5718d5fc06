// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # eqwatch
//!
//! Dataset preparation, diagnostics aggregation and plotting for an
//! industrial anomaly-detection workflow.
//!
//! Sensor readings arrive as one folder of CSV files per equipment
//! component. They are merged into one wide table, uploaded to a bucket
//! for training, and once a model has been evaluated its describe-model
//! document is turned into per-component contributions, charts and an
//! interactive terminal inspector.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  prepare ──▶ store (bucket)          labels ──▶ store            │
//! │                                                                  │
//! │  source (describe-model JSON)                                    │
//! │     │                                                            │
//! │     ▼                                                            │
//! │  data (aggregate, window, matching) ──▶ plot (SVG / PNG)         │
//! │     │                                                            │
//! │     └──▶ app + ui (terminal inspector)                            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`prepare`]**: Merging per-component CSVs into a [`SensorTable`] plus a
//!   [`TagComponentMap`], the inverse split, resampling, and upload
//! - **[`labels`]**: Reading and writing known anomaly ranges
//! - **[`store`]**: The [`ObjectStore`] trait and a directory-backed [`LocalStore`]
//! - **[`source`]**: Model evaluations from a describe-model document ([`ModelSource`] trait)
//! - **[`data`]**: Component aggregation, duration-weighted sensor sums, event
//!   matching and distributions
//! - **[`plot`]**: Overlay, bar and histogram charts rendered with plotters
//! - **[`app`]**, **[`ui`]**, **[`events`]**: The ratatui inspector
//! - **[`config`]**: Layered settings from `eqwatch.toml` and `EQWATCH_*` variables
//!
//! ## Usage
//!
//! ### Command line
//!
//! ```bash
//! # Merge component folders and upload them to the configured bucket
//! eqwatch prepare --input data/ --output merged.csv --tags tags.csv --upload
//!
//! # Rank components behind each detected event
//! eqwatch diagnose --model model.json --tags tags.csv
//!
//! # Browse the evaluation interactively
//! eqwatch inspect --model model.json --tags tags.csv
//! ```
//!
//! ### As a library
//!
//! ```
//! use eqwatch::{ComponentAggregator, TagComponentMap, SensorImportance};
//!
//! let map = TagComponentMap::builder()
//!     .component("impeller", ["Sensor0", "Sensor1"])
//!     .build()
//!     .unwrap();
//! let sensors = vec![
//!     SensorImportance::new("pump\\Sensor0", 0.5),
//!     SensorImportance::new("pump\\Sensor1", 0.25),
//! ];
//! let aggregation = ComponentAggregator::new(&map).aggregate(&sensors).unwrap();
//! assert_eq!(aggregation.get("impeller"), Some(0.75));
//! ```
//!
//! ### With a model source
//!
//! ```no_run
//! use eqwatch::{App, DiagnosticsOptions, FileSource, TagComponentMap};
//!
//! let source = Box::new(FileSource::new("model.json"));
//! let app = App::new(source, TagComponentMap::new(), DiagnosticsOptions::default());
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod labels;
pub mod plot;
pub mod prepare;
pub mod source;
pub mod store;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use data::{
    Aggregation, ComponentAggregator, DiagnosticsData, DiagnosticsOptions, EventData, UnresolvedPolicy,
};
pub use eqwatch_types::{
    ComponentContribution, LabeledRange, PredictedRange, SensorDiagnostic, SensorImportance,
    TagComponentMap, TimeRange,
};
pub use prepare::{ComponentFrame, SensorTable};
pub use source::{FileSource, ModelEvaluation, ModelMetrics, ModelSource, SourceError, StaticSource};
pub use store::{LocalStore, ObjectStore, StoreError};
