//! Diagnostics computed from a model evaluation, ready for display.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use chrono::TimeDelta;
use eqwatch_types::{rank, LabeledRange, SensorImportance, TagComponentMap, TimeRange};
use tracing::warn;

use super::aggregate::{Aggregation, ComponentAggregator, UnresolvedPolicy};
use super::matching::{match_events, EventSummary};
use super::window::{SensorWindow, DEFAULT_STEP};
use super::AggregateError;
use crate::source::{FileSource, ModelEvaluation};

/// Knobs for turning an evaluation into [`DiagnosticsData`].
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsOptions {
    pub policy: UnresolvedPolicy,
    /// Sampling step used to weight ranges by duration.
    pub step: TimeDelta,
    /// Only ranges overlapping this window are considered.
    pub window: Option<TimeRange>,
}

impl Default for DiagnosticsOptions {
    fn default() -> Self {
        Self {
            policy: UnresolvedPolicy::default(),
            step: DEFAULT_STEP,
            window: None,
        }
    }
}

/// One predicted range with its ranked sensors and component roll-up.
#[derive(Debug, Clone)]
pub struct EventData {
    /// Position in the service's predicted ranges.
    pub index: usize,
    pub range: TimeRange,
    pub sensors: Vec<SensorImportance>,
    pub components: Aggregation,
    /// Overlaps at least one labeled range.
    pub labeled: bool,
}

impl EventData {
    pub fn duration(&self) -> TimeDelta {
        self.range.duration()
    }

    pub fn top_sensor(&self) -> Option<&SensorImportance> {
        self.sensors.first()
    }

    pub fn top_component(&self) -> Option<&str> {
        self.components.components.first().map(|c| c.component.as_str())
    }
}

/// Complete diagnostics for one model.
#[derive(Debug, Clone)]
pub struct DiagnosticsData {
    pub model_name: String,
    pub status: Option<String>,
    pub window: Option<TimeRange>,
    pub labels: Vec<LabeledRange>,
    pub events: Vec<EventData>,
    /// Sensors summed over every event in the window, duration weighted.
    pub sensors: Vec<SensorImportance>,
    /// `sensors` rolled up to components.
    pub components: Aggregation,
    pub summary: EventSummary,
    pub policy: UnresolvedPolicy,
    pub last_updated: Instant,
}

impl DiagnosticsData {
    /// Load a describe-model document and compute diagnostics.
    pub fn load(path: &Path, map: &TagComponentMap, options: &DiagnosticsOptions) -> Result<Self> {
        let evaluation = FileSource::new(path).load()?;
        Ok(Self::from_evaluation(evaluation, map, options)?)
    }

    pub fn parse(content: &str, map: &TagComponentMap, options: &DiagnosticsOptions) -> Result<Self> {
        let evaluation = ModelEvaluation::parse(content)?;
        Ok(Self::from_evaluation(evaluation, map, options)?)
    }

    /// Compute per-event and overall diagnostics.
    ///
    /// This is the conversion used by every model source.
    pub fn from_evaluation(
        evaluation: ModelEvaluation,
        map: &TagComponentMap,
        options: &DiagnosticsOptions,
    ) -> Result<Self, AggregateError> {
        let in_window = |r: &TimeRange| options.window.as_ref().map_or(true, |w| w.overlaps(r));

        let model_name = evaluation.display_name().to_string();
        let window = options.window.or_else(|| evaluation.evaluation_window());
        let ModelEvaluation { status, metrics, .. } = evaluation;

        let labels: Vec<LabeledRange> = metrics
            .labeled_ranges
            .into_iter()
            .filter(|l| in_window(&l.range))
            .collect();
        let (indices, predicted): (Vec<usize>, Vec<_>) = metrics
            .predicted_ranges
            .into_iter()
            .enumerate()
            .filter(|(_, p)| in_window(&p.range))
            .unzip();
        let summary = match_events(&labels, &predicted);

        let aggregator = ComponentAggregator::new(map).with_policy(options.policy);
        let events = predicted
            .iter()
            .zip(indices)
            .enumerate()
            .map(|(pos, (range, index))| {
                let mut sensors: Vec<SensorImportance> = range
                    .diagnostics
                    .iter()
                    .map(|d| SensorImportance::new(d.name.clone(), d.value))
                    .collect();
                rank(&mut sensors);
                Ok(EventData {
                    index,
                    range: range.range,
                    sensors,
                    components: aggregator.aggregate_range(range)?,
                    labeled: summary.is_labeled(pos),
                })
            })
            .collect::<Result<Vec<_>, AggregateError>>()?;

        let sensors = SensorWindow::new(options.step)
            .with_window(options.window)
            .sum(&predicted)?;
        let components = aggregator.aggregate(&sensors)?;

        if !components.unresolved.is_empty() {
            warn!(
                count = components.unresolved.len(),
                share = components.unresolved_total() / components.total().max(f64::MIN_POSITIVE),
                "sensors missing from the tag map are reported as unresolved"
            );
        }

        Ok(Self {
            model_name,
            status,
            window,
            labels,
            events,
            sensors,
            components,
            summary,
            policy: options.policy,
            last_updated: Instant::now(),
        })
    }

    /// Every sensor name that no event could attribute to a component.
    pub fn unresolved_sensors(&self) -> BTreeSet<&str> {
        self.events
            .iter()
            .flat_map(|e| e.components.unresolved.iter())
            .chain(&self.components.unresolved)
            .map(|s| s.sensor.as_str())
            .collect()
    }

    pub fn unknown_count(&self) -> usize {
        self.summary.unknown.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRICS: &str = r#"{
        "labeled_ranges": [{"start": "2019-08-08", "end": "2019-08-09"}],
        "predicted_ranges": [
            {"start": "2019-08-08T00:42", "end": "2019-08-08T01:48",
             "diagnostics": [{"name": "pump\\Sensor0", "value": 0.25}, {"name": "pump\\Sensor2", "value": 0.75}]},
            {"start": "2019-09-01T00:00", "end": "2019-09-01T00:09",
             "diagnostics": [{"name": "pump\\Sensor0", "value": 0.5}, {"name": "pump\\Sensor9", "value": 0.5}]}
        ]
    }"#;

    fn map() -> TagComponentMap {
        TagComponentMap::builder()
            .component("impeller", ["Sensor0"])
            .component("volute", ["Sensor2"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_from_evaluation() {
        let data = DiagnosticsData::parse(METRICS, &map(), &DiagnosticsOptions::default()).unwrap();

        assert_eq!(data.events.len(), 2);
        assert!(data.events[0].labeled);
        assert!(!data.events[1].labeled);
        assert_eq!(data.unknown_count(), 1);
        assert_eq!(data.events[0].top_component(), Some("volute"));
        assert_eq!(data.events[0].duration(), TimeDelta::minutes(66));

        // 67 samples for the first event, 10 for the second
        let sensor0 = data.sensors.iter().find(|s| s.sensor == "pump\\Sensor0").unwrap();
        assert!((sensor0.value - (0.25 * 67.0 + 0.5 * 10.0)).abs() < 1e-9);
        assert_eq!(data.unresolved_sensors().into_iter().collect::<Vec<_>>(), vec!["pump\\Sensor9"]);

        let input_total: f64 = data.sensors.iter().map(|s| s.value).sum();
        assert!((data.components.total() - input_total).abs() < 1e-9);
    }

    #[test]
    fn test_window_filters_events() {
        let options = DiagnosticsOptions {
            window: Some(TimeRange::parse("2019-08-01", "2019-08-31").unwrap()),
            ..DiagnosticsOptions::default()
        };
        let data = DiagnosticsData::parse(METRICS, &map(), &options).unwrap();
        assert_eq!(data.events.len(), 1);
        assert_eq!(data.events[0].index, 0);
        assert!(data.unresolved_sensors().is_empty());
        assert_eq!(data.summary.recall(), Some(1.0));
    }

    #[test]
    fn test_strict_policy_propagates() {
        let options = DiagnosticsOptions {
            policy: UnresolvedPolicy::Strict,
            ..DiagnosticsOptions::default()
        };
        let err = DiagnosticsData::parse(METRICS, &map(), &options).unwrap_err();
        assert!(err.to_string().contains("Sensor9"));
    }
}
