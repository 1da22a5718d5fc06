//! Per-sensor importance summed over a time window.
//!
//! Each predicted range is treated as a series of samples every `step`,
//! starting at the range start and including the end when it falls on a
//! step. A sensor's weight over a window is its diagnostic value times the
//! number of the range's samples inside the window, so long events weigh
//! more than short ones.

use std::collections::BTreeMap;

use chrono::TimeDelta;
use eqwatch_types::{rank, PredictedRange, SensorImportance, TimeRange};

use super::AggregateError;

/// One sample per minute, the service's usual sampling rate.
pub const DEFAULT_STEP: TimeDelta = TimeDelta::minutes(1);

/// Number of samples of `range` (every `step` from its start) that fall in
/// `window`. With no window every sample counts.
pub fn sample_count(range: &TimeRange, window: Option<&TimeRange>, step: TimeDelta) -> Result<i64, AggregateError> {
    let step_ms = step.num_milliseconds();
    if step_ms <= 0 {
        return Err(AggregateError::InvalidStep);
    }

    let last = range.duration().num_milliseconds() / step_ms;
    let Some(window) = window else {
        return Ok(last + 1);
    };
    let Some(shared) = range.intersect(window) else {
        return Ok(0);
    };

    let lo = (shared.start - range.start).num_milliseconds();
    let hi = (shared.end - range.start).num_milliseconds();
    let first = (lo + step_ms - 1) / step_ms;
    let final_sample = (hi / step_ms).min(last);
    Ok((final_sample - first + 1).max(0))
}

/// Sums diagnostics over predicted ranges, weighted by samples in a window.
#[derive(Debug, Clone, Copy)]
pub struct SensorWindow {
    step: TimeDelta,
    window: Option<TimeRange>,
}

impl Default for SensorWindow {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            window: None,
        }
    }
}

impl SensorWindow {
    pub fn new(step: TimeDelta) -> Self {
        Self { step, window: None }
    }

    /// Restrict to samples inside `window`; `None` counts every sample.
    pub fn with_window(mut self, window: Option<TimeRange>) -> Self {
        self.window = window;
        self
    }

    pub fn step(&self) -> TimeDelta {
        self.step
    }

    pub fn window(&self) -> Option<&TimeRange> {
        self.window.as_ref()
    }

    /// Ranked per-sensor totals, keyed by full diagnostic name.
    ///
    /// Sensors whose ranges have no sample in the window are left out.
    pub fn sum(&self, ranges: &[PredictedRange]) -> Result<Vec<SensorImportance>, AggregateError> {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for predicted in ranges {
            let samples = sample_count(&predicted.range, self.window.as_ref(), self.step)?;
            if samples == 0 {
                continue;
            }
            for diag in &predicted.diagnostics {
                *totals.entry(diag.name.as_str()).or_default() += diag.value * samples as f64;
            }
        }

        let mut sensors: Vec<SensorImportance> = totals
            .into_iter()
            .map(|(name, value)| SensorImportance::new(name, value))
            .collect();
        rank(&mut sensors);
        Ok(sensors)
    }
}

/// The `n` most important sensors, ranked.
pub fn top_sensors(mut sensors: Vec<SensorImportance>, n: usize) -> Vec<SensorImportance> {
    rank(&mut sensors);
    sensors.truncate(n);
    sensors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::parse(start, end).unwrap()
    }

    #[test]
    fn test_sample_count_whole_range() {
        let r = range("2019-08-08T00:42", "2019-08-08T01:48");
        assert_eq!(sample_count(&r, None, DEFAULT_STEP).unwrap(), 67);

        let point = range("2019-08-08T00:42", "2019-08-08T00:42");
        assert_eq!(sample_count(&point, None, DEFAULT_STEP).unwrap(), 1);
    }

    #[test]
    fn test_sample_count_clipped_by_window() {
        let r = range("2019-08-08T00:42", "2019-08-08T01:48");
        let w = range("2019-08-08T01:00", "2019-08-09T00:00");
        // 01:00 through 01:48
        assert_eq!(sample_count(&r, Some(&w), DEFAULT_STEP).unwrap(), 49);

        let off_step = range("2019-08-08T00:42:30", "2019-08-08T00:43:30");
        // only 00:43 lies on the range's step grid
        assert_eq!(sample_count(&r, Some(&off_step), DEFAULT_STEP).unwrap(), 1);

        let outside = range("2019-08-09T00:00", "2019-08-10T00:00");
        assert_eq!(sample_count(&r, Some(&outside), DEFAULT_STEP).unwrap(), 0);
    }

    #[test]
    fn test_sample_count_rejects_zero_step() {
        let r = range("2019-08-08T00:42", "2019-08-08T01:48");
        assert!(matches!(sample_count(&r, None, TimeDelta::zero()), Err(AggregateError::InvalidStep)));
    }

    #[test]
    fn test_sum_weights_by_duration() {
        let short = PredictedRange::builder(range("2019-08-08T00:00", "2019-08-08T00:01"))
            .diagnostic("pump\\Sensor0", 0.9)
            .diagnostic("pump\\Sensor1", 0.1)
            .build();
        let long = PredictedRange::builder(range("2019-08-09T00:00", "2019-08-09T00:09"))
            .diagnostic("pump\\Sensor0", 0.2)
            .diagnostic("pump\\Sensor1", 0.8)
            .build();

        let sensors = SensorWindow::default().sum(&[short, long]).unwrap();
        // Sensor1: 0.1 * 2 + 0.8 * 10
        assert_eq!(sensors[0].sensor, "pump\\Sensor1");
        assert!((sensors[0].value - 8.2).abs() < 1e-9);
        assert!((sensors[1].value - 3.8).abs() < 1e-9);
    }

    #[test]
    fn test_sum_skips_ranges_outside_window() {
        let r = PredictedRange::builder(range("2019-08-08T00:00", "2019-08-08T00:01"))
            .diagnostic("pump\\Sensor0", 1.0)
            .build();
        let sensors = SensorWindow::new(DEFAULT_STEP)
            .with_window(Some(range("2019-09-01", "2019-09-02")))
            .sum(&[r])
            .unwrap();
        assert!(sensors.is_empty());
    }

    #[test]
    fn test_top_sensors() {
        let sensors = vec![
            SensorImportance::new("a", 1.0),
            SensorImportance::new("b", 3.0),
            SensorImportance::new("c", 2.0),
        ];
        let top = top_sensors(sensors, 2);
        assert_eq!(top.iter().map(|s| s.sensor.as_str()).collect::<Vec<_>>(), vec!["b", "c"]);
    }
}
