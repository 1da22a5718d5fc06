//! Time ranges: ground-truth labels and model predictions.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};

use crate::{parse_timestamp, SensorDiagnostic, TypesError};

/// A closed interval `[start, end]` of naive UTC timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeRange {
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_timestamp"))]
    pub start: NaiveDateTime,
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_timestamp"))]
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// Create a range, rejecting `end < start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, TypesError> {
        if end < start {
            return Err(TypesError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse both ends with [`parse_timestamp`].
    pub fn parse(start: &str, end: &str) -> Result<Self, TypesError> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    /// Check the `start <= end` invariant (useful after deserialization).
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Inclusive on both ends.
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        self.start <= *ts && *ts <= self.end
    }

    /// True when the two closed intervals share at least one instant.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The shared part of two ranges, if any.
    pub fn intersect(&self, other: &TimeRange) -> Option<TimeRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(TimeRange {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// Smallest range covering every input range.
    pub fn span<'a, I>(ranges: I) -> Option<TimeRange>
    where
        I: IntoIterator<Item = &'a TimeRange>,
    {
        ranges.into_iter().fold(None, |acc: Option<TimeRange>, r| {
            Some(match acc {
                None => *r,
                Some(a) => TimeRange {
                    start: a.start.min(r.start),
                    end: a.end.max(r.end),
                },
            })
        })
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            crate::format_timestamp(&self.start),
            crate::format_timestamp(&self.end)
        )
    }
}

/// A ground-truth anomaly period supplied by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabeledRange {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub range: TimeRange,
}

impl LabeledRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, TypesError> {
        Ok(Self {
            range: TimeRange::new(start, end)?,
        })
    }
}

impl From<TimeRange> for LabeledRange {
    fn from(range: TimeRange) -> Self {
        Self { range }
    }
}

/// An anomalous period flagged by the model, with the per-sensor
/// diagnostics that explain it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PredictedRange {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub range: TimeRange,

    /// Per-sensor contributions. Non-negative; not required to sum to 1.
    #[cfg_attr(feature = "serde", serde(default))]
    pub diagnostics: Vec<SensorDiagnostic>,
}

impl PredictedRange {
    pub fn new(range: TimeRange, diagnostics: Vec<SensorDiagnostic>) -> Self {
        Self { range, diagnostics }
    }

    /// Create a builder for a predicted range.
    pub fn builder(range: TimeRange) -> PredictedRangeBuilder {
        PredictedRangeBuilder {
            range,
            diagnostics: Vec::new(),
        }
    }

    /// Sum of all diagnostic values.
    pub fn total_importance(&self) -> f64 {
        self.diagnostics.iter().map(|d| d.value).sum()
    }
}

/// Builder for [`PredictedRange`].
#[derive(Debug)]
pub struct PredictedRangeBuilder {
    range: TimeRange,
    diagnostics: Vec<SensorDiagnostic>,
}

impl PredictedRangeBuilder {
    /// Add a diagnostic entry.
    pub fn diagnostic(mut self, name: impl Into<String>, value: f64) -> Self {
        self.diagnostics.push(SensorDiagnostic::new(name, value));
        self
    }

    pub fn build(self) -> PredictedRange {
        PredictedRange {
            range: self.range,
            diagnostics: self.diagnostics,
        }
    }
}
