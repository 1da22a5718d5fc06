//! Match predicted ranges against labeled ones.

use chrono::{NaiveDateTime, TimeDelta};
use eqwatch_types::{LabeledRange, PredictedRange, TimeRange};

/// How one labeled range was covered by predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMatch {
    pub label: TimeRange,
    /// Indices into the predicted ranges that overlap this label.
    pub overlapping: Vec<usize>,
    /// Earliest flagged instant inside the label.
    pub first_detection: Option<NaiveDateTime>,
}

impl EventMatch {
    pub fn detected(&self) -> bool {
        !self.overlapping.is_empty()
    }

    /// Time from label start to first detection.
    pub fn detection_delay(&self) -> Option<TimeDelta> {
        self.first_detection.map(|t| t - self.label.start)
    }
}

/// Label coverage plus predictions that match no label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSummary {
    pub matches: Vec<EventMatch>,
    /// Indices of predicted ranges overlapping no label.
    pub unknown: Vec<usize>,
}

impl EventSummary {
    pub fn detected_count(&self) -> usize {
        self.matches.iter().filter(|m| m.detected()).count()
    }

    /// Share of labels with at least one overlapping prediction.
    pub fn recall(&self) -> Option<f64> {
        if self.matches.is_empty() {
            return None;
        }
        Some(self.detected_count() as f64 / self.matches.len() as f64)
    }

    /// True when predicted range `index` overlaps some label.
    pub fn is_labeled(&self, index: usize) -> bool {
        !self.unknown.contains(&index)
    }
}

/// Overlap every label with every prediction (closed intervals).
pub fn match_events(labels: &[LabeledRange], predicted: &[PredictedRange]) -> EventSummary {
    let matches = labels
        .iter()
        .map(|label| {
            let overlapping: Vec<usize> = predicted
                .iter()
                .enumerate()
                .filter(|(_, p)| p.range.overlaps(&label.range))
                .map(|(i, _)| i)
                .collect();
            let first_detection = overlapping
                .iter()
                .map(|&i| predicted[i].range.start.max(label.range.start))
                .min();
            EventMatch {
                label: label.range,
                overlapping,
                first_detection,
            }
        })
        .collect();

    let unknown = predicted
        .iter()
        .enumerate()
        .filter(|(_, p)| !labels.iter().any(|l| l.range.overlaps(&p.range)))
        .map(|(i, _)| i)
        .collect();

    EventSummary { matches, unknown }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(start: &str, end: &str) -> LabeledRange {
        TimeRange::parse(start, end).unwrap().into()
    }

    fn predicted(start: &str, end: &str) -> PredictedRange {
        PredictedRange::builder(TimeRange::parse(start, end).unwrap()).build()
    }

    #[test]
    fn test_match_events() {
        let labels = [label("2019-08-08", "2019-08-09"), label("2019-09-01", "2019-09-02")];
        let preds = [
            predicted("2019-08-08T00:42", "2019-08-08T01:48"),
            predicted("2019-08-07T22:00", "2019-08-08T00:10"),
            predicted("2019-08-20", "2019-08-21"),
        ];
        let summary = match_events(&labels, &preds);

        assert_eq!(summary.matches[0].overlapping, vec![0, 1]);
        assert_eq!(
            summary.matches[0].first_detection,
            Some(labels[0].range.start),
            "a prediction starting before the label detects it at label start"
        );
        assert_eq!(summary.matches[0].detection_delay(), Some(TimeDelta::zero()));
        assert!(!summary.matches[1].detected());
        assert_eq!(summary.unknown, vec![2]);
        assert_eq!(summary.recall(), Some(0.5));
        assert!(summary.is_labeled(0));
        assert!(!summary.is_labeled(2));
    }

    #[test]
    fn test_no_labels() {
        let summary = match_events(&[], &[predicted("2019-08-20", "2019-08-21")]);
        assert_eq!(summary.recall(), None);
        assert_eq!(summary.unknown, vec![0]);
    }
}
