//! Value distributions during normal and anomalous periods.

use chrono::{NaiveDateTime, TimeDelta};
use eqwatch_types::TimeRange;

use super::AggregateError;
use crate::prepare::SensorTable;

/// Histograms of one sensor's readings, split by period.
///
/// Both histograms share `edges` (`bins + 1` values). With `density` set
/// each histogram integrates to 1 over the edges, otherwise it holds counts.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDistribution {
    pub tag: String,
    pub edges: Vec<f64>,
    pub normal: Vec<f64>,
    pub anomalous: Vec<f64>,
    pub normal_samples: usize,
    pub anomalous_samples: usize,
    pub density: bool,
}

impl ValueDistribution {
    pub fn bins(&self) -> usize {
        self.normal.len()
    }

    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.last()) {
            (Some(lo), Some(hi)) if self.bins() > 0 => (hi - lo) / self.bins() as f64,
            _ => 0.0,
        }
    }
}

/// How to build the histograms.
#[derive(Debug, Clone, Copy)]
pub struct DistributionOptions {
    pub bins: usize,
    pub density: bool,
    /// Average readings into windows of this width first.
    pub resample: Option<TimeDelta>,
}

impl Default for DistributionOptions {
    fn default() -> Self {
        Self {
            bins: 30,
            density: true,
            resample: None,
        }
    }
}

/// Build one [`ValueDistribution`] per tag.
///
/// A reading is anomalous when its timestamp lies in any of `ranges`
/// (inclusive).
pub fn compare_distributions(
    table: &SensorTable,
    tags: &[&str],
    ranges: &[TimeRange],
    options: &DistributionOptions,
) -> Result<Vec<ValueDistribution>, AggregateError> {
    if options.bins == 0 {
        return Err(AggregateError::InvalidBins);
    }

    let resampled;
    let table = match options.resample {
        Some(width) => {
            resampled = table.resample(width)?;
            &resampled
        }
        None => table,
    };

    tags.iter()
        .map(|tag| {
            let series = table
                .series(tag)
                .ok_or_else(|| AggregateError::UnknownSensor(tag.to_string()))?;
            let (anomalous, normal): (Vec<(NaiveDateTime, f64)>, Vec<_>) = series
                .into_iter()
                .partition(|(ts, _)| ranges.iter().any(|r| r.contains(ts)));
            let normal: Vec<f64> = normal.into_iter().map(|(_, v)| v).collect();
            let anomalous: Vec<f64> = anomalous.into_iter().map(|(_, v)| v).collect();
            Ok(histograms(tag, &normal, &anomalous, options))
        })
        .collect()
}

fn histograms(tag: &str, normal: &[f64], anomalous: &[f64], options: &DistributionOptions) -> ValueDistribution {
    let bins = options.bins;
    let (mut lo, mut hi) = normal
        .iter()
        .chain(anomalous)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        (lo, hi) = (0.0, 1.0);
    } else if lo == hi {
        // A constant sensor still gets one visible bin around its value
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins)
        .map(|i| if i == bins { hi } else { lo + width * i as f64 })
        .collect();

    let histogram = |values: &[f64]| {
        let mut counts = vec![0.0; bins];
        for &v in values {
            let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1.0;
        }
        if options.density && !values.is_empty() {
            let scale = values.len() as f64 * width;
            for c in &mut counts {
                *c /= scale;
            }
        }
        counts
    };

    ValueDistribution {
        tag: tag.to_string(),
        edges,
        normal: histogram(normal),
        anomalous: histogram(anomalous),
        normal_samples: normal.len(),
        anomalous_samples: anomalous.len(),
        density: options.density,
    }
}
