//! # eqwatch-types
//!
//! Core types shared by everything that prepares sensor datasets for an
//! anomaly-detection model or explains what the model flagged.
//!
//! ## Design Goals
//!
//! - **Small surface**: plain data types plus the few operations every consumer needs
//!   (range overlap, tag resolution, ranking)
//! - **Optional serialization**: enable the `serde` feature to read and write the
//!   service's JSON shapes (`{"start": ..., "end": ...}`, `{"name": ..., "value": ...}`)
//! - **Naive UTC time**: every timestamp is a [`chrono::NaiveDateTime`] in UTC; offsets
//!   found in input are applied and dropped by [`parse_timestamp`]
//!
//! ## Features
//!
//! - `serde`: JSON serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use eqwatch_types::{PredictedRange, TagComponentMap, TimeRange};
//!
//! let map = TagComponentMap::builder()
//!     .component("impeller", ["Sensor0", "Sensor1"])
//!     .component("volute", ["Sensor2"])
//!     .build()
//!     .unwrap();
//!
//! let range = TimeRange::parse("2019-08-08T00:42:00", "2019-08-08T01:48:00").unwrap();
//! let predicted = PredictedRange::builder(range)
//!     .diagnostic("impeller\\Sensor0", 0.42)
//!     .diagnostic("volute\\Sensor2", 0.17)
//!     .build();
//!
//! assert_eq!(map.resolve(&predicted.diagnostics[0].name), Some("impeller"));
//! assert!((predicted.total_importance() - 0.59).abs() < 1e-9);
//! ```

mod contribution;
mod error;
mod range;
mod tags;
mod timestamp;

pub use contribution::*;
pub use error::*;
pub use range::*;
pub use tags::*;
pub use timestamp::*;
