//! Diagnostics processing: from a model evaluation to ranked contributions.
//!
//! ## Submodules
//!
//! - [`aggregate`]: Rolling sensor importance up to components ([`ComponentAggregator`])
//! - [`window`]: Duration-weighted per-sensor sums over a time window ([`SensorWindow`])
//! - [`matching`]: Matching predicted ranges against labels
//! - [`distribution`]: Normal vs anomalous value histograms
//! - [`diagnostics`]: Display-ready data models ([`DiagnosticsData`], [`EventData`])
//! - [`duration`]: Parsing window widths (e.g. "10min") and formatting durations
//! - [`report`]: JSON export
//!
//! ## Data Flow
//!
//! ```text
//! ModelEvaluation (describe-model JSON)
//!        │
//!        ▼
//! DiagnosticsData::from_evaluation()
//!        │
//!        ├──▶ EventData per predicted range (ComponentAggregator)
//!        │
//!        ├──▶ SensorWindow::sum() ──▶ overall components
//!        │
//!        └──▶ match_events() (labeled vs unknown)
//! ```

pub mod aggregate;
pub mod diagnostics;
pub mod distribution;
pub mod duration;
pub mod matching;
pub mod report;
pub mod window;

pub use aggregate::{Aggregation, ComponentAggregator, UnresolvedPolicy};
pub use diagnostics::{DiagnosticsData, DiagnosticsOptions, EventData};
pub use distribution::{compare_distributions, DistributionOptions, ValueDistribution};
pub use matching::{match_events, EventMatch, EventSummary};
pub use window::{sample_count, top_sensors, SensorWindow, DEFAULT_STEP};

use thiserror::Error;

use crate::prepare::PrepareError;

/// Errors raised while aggregating diagnostics.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("sensors not in the tag map: {}", .0.join(", "))]
    Unresolved(Vec<String>),

    #[error("sampling step must be positive")]
    InvalidStep,

    #[error("histogram needs at least one bin")]
    InvalidBins,

    #[error("unknown sensor {0:?}")]
    UnknownSensor(String),

    #[error(transparent)]
    Prepare(#[from] PrepareError),
}
