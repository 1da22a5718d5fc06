//! Ranked horizontal bar charts of importance.

use eqwatch_types::{tag_of, SensorImportance};

use crate::data::Aggregation;

/// Bar for importance no component accounts for.
pub const UNMAPPED_LABEL: &str = "(unmapped)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    Component,
    Sensor,
    Unmapped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub kind: BarKind,
}

/// Bars in display order, largest first.
#[derive(Debug, Clone, PartialEq)]
pub struct BarPlan {
    pub title: String,
    pub bars: Vec<Bar>,
    pub normalized: bool,
}

impl BarPlan {
    /// One bar per component plus one for unresolved sensors, if any.
    pub fn from_aggregation(title: impl Into<String>, aggregation: &Aggregation, normalize: bool) -> Self {
        let aggregation = if normalize {
            aggregation.normalized()
        } else {
            aggregation.clone()
        };

        let mut bars: Vec<Bar> = aggregation
            .components
            .iter()
            .map(|c| Bar {
                label: c.component.clone(),
                value: c.value,
                kind: BarKind::Component,
            })
            .collect();
        if !aggregation.unresolved.is_empty() {
            bars.push(Bar {
                label: UNMAPPED_LABEL.to_string(),
                value: aggregation.unresolved_total(),
                kind: BarKind::Unmapped,
            });
        }
        bars.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.label.cmp(&b.label)));

        Self {
            title: title.into(),
            bars,
            normalized: normalize,
        }
    }

    /// The `top` most important sensors, labeled by tag.
    pub fn from_sensors(title: impl Into<String>, sensors: &[SensorImportance], top: usize, normalize: bool) -> Self {
        let total: f64 = sensors.iter().map(|s| s.value).sum();
        let scale = if normalize && total > 0.0 { total } else { 1.0 };

        let mut ranked = sensors.to_vec();
        eqwatch_types::rank(&mut ranked);
        let bars = ranked
            .iter()
            .take(top)
            .map(|s| Bar {
                label: tag_of(&s.sensor).to_string(),
                value: s.value / scale,
                kind: BarKind::Sensor,
            })
            .collect();

        Self {
            title: title.into(),
            bars,
            normalized: normalize,
        }
    }

    pub fn max_value(&self) -> f64 {
        self.bars.iter().map(|b| b.value).fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqwatch_types::ComponentContribution;

    fn aggregation() -> Aggregation {
        Aggregation {
            components: vec![ComponentContribution::new("volute", 5.0), ComponentContribution::new("impeller", 2.0)],
            unresolved: vec![SensorImportance::new("pump\\Sensor9", 3.0)],
        }
    }

    #[test]
    fn test_components_with_unmapped_bar() {
        let plan = BarPlan::from_aggregation("components", &aggregation(), false);
        let labels: Vec<&str> = plan.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["volute", UNMAPPED_LABEL, "impeller"]);
        assert_eq!(plan.bars[1].kind, BarKind::Unmapped);
        assert_eq!(plan.max_value(), 5.0);
    }

    #[test]
    fn test_normalized_bars_sum_to_one() {
        let plan = BarPlan::from_aggregation("components", &aggregation(), true);
        let sum: f64 = plan.bars.iter().map(|b| b.value).sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(plan.normalized);
    }

    #[test]
    fn test_top_sensors_by_tag() {
        let sensors = vec![
            SensorImportance::new("pump\\Sensor1", 1.0),
            SensorImportance::new("pump\\Sensor0", 3.0),
            SensorImportance::new("pump\\Sensor2", 2.0),
        ];
        let plan = BarPlan::from_sensors("sensors", &sensors, 2, false);
        let labels: Vec<&str> = plan.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Sensor0", "Sensor2"]);
    }
}
