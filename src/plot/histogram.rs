//! Normal vs anomalous value distributions, one panel per sensor.

use crate::data::ValueDistribution;

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionPlan {
    pub title: String,
    pub panels: Vec<ValueDistribution>,
}

impl DistributionPlan {
    pub fn new(title: impl Into<String>, panels: Vec<ValueDistribution>) -> Self {
        Self {
            title: title.into(),
            panels,
        }
    }

    /// Grid shape `(rows, cols)` with at most `max_cols` columns.
    pub fn grid(&self, max_cols: usize) -> (usize, usize) {
        let n = self.panels.len().max(1);
        let cols = n.min(max_cols.max(1));
        (n.div_ceil(cols), cols)
    }

    /// Tallest bar of a panel, across both periods.
    pub fn y_max(panel: &ValueDistribution) -> f64 {
        panel
            .normal
            .iter()
            .chain(&panel.anomalous)
            .copied()
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(tag: &str) -> ValueDistribution {
        ValueDistribution {
            tag: tag.to_string(),
            edges: vec![0.0, 1.0, 2.0],
            normal: vec![3.0, 1.0],
            anomalous: vec![0.0, 4.0],
            normal_samples: 4,
            anomalous_samples: 4,
            density: false,
        }
    }

    #[test]
    fn test_grid() {
        let plan = DistributionPlan::new("d", (0..5).map(|i| panel(&format!("S{i}"))).collect());
        assert_eq!(plan.grid(3), (2, 3));
        assert_eq!(DistributionPlan::new("d", vec![]).grid(3), (1, 1));
    }

    #[test]
    fn test_y_max() {
        assert_eq!(DistributionPlan::y_max(&panel("S")), 4.0);
    }
}
