//! Time series with label and prediction bands.

use chrono::NaiveDateTime;
use eqwatch_types::{LabeledRange, PredictedRange, TimeRange};

use crate::prepare::SensorTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    Label,
    Prediction,
}

impl BandKind {
    pub fn legend(&self) -> &'static str {
        match self {
            BandKind::Label => "Known anomaly",
            BandKind::Prediction => "Detected event",
        }
    }
}

/// A shaded interval, already clipped to the plot window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub kind: BandKind,
    pub range: TimeRange,
}

/// One sensor line.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(NaiveDateTime, f64)>,
}

impl Series {
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |acc, &(_, v)| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Everything an overlay chart draws.
///
/// Series points and bands outside `window` are dropped; bands crossing
/// its edges are clipped.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPlan {
    pub title: String,
    pub window: TimeRange,
    pub series: Vec<Series>,
    pub bands: Vec<Band>,
}

impl OverlayPlan {
    pub fn new(title: impl Into<String>, window: TimeRange) -> Self {
        Self {
            title: title.into(),
            window,
            series: Vec::new(),
            bands: Vec::new(),
        }
    }

    pub fn with_series(mut self, name: impl Into<String>, points: Vec<(NaiveDateTime, f64)>) -> Self {
        let points = points.into_iter().filter(|(ts, _)| self.window.contains(ts)).collect();
        self.series.push(Series {
            name: name.into(),
            points,
        });
        self
    }

    /// Add one series per tag from `table`. Unknown tags are skipped.
    pub fn with_table(self, table: &SensorTable, tags: &[&str]) -> Self {
        tags.iter().fold(self, |plan, tag| match table.series(tag) {
            Some(points) => plan.with_series(*tag, points),
            None => plan,
        })
    }

    pub fn with_labels(self, labels: &[LabeledRange]) -> Self {
        self.with_bands(BandKind::Label, labels.iter().map(|l| l.range))
    }

    pub fn with_predictions(self, predicted: &[PredictedRange]) -> Self {
        self.with_bands(BandKind::Prediction, predicted.iter().map(|p| p.range))
    }

    fn with_bands(mut self, kind: BandKind, ranges: impl Iterator<Item = TimeRange>) -> Self {
        for range in ranges {
            if let Some(range) = range.intersect(&self.window) {
                self.bands.push(Band { kind, range });
            }
        }
        self
    }

    pub fn bands_of(&self, kind: BandKind) -> impl Iterator<Item = &Band> {
        self.bands.iter().filter(move |b| b.kind == kind)
    }

    /// Seconds from window start, the x coordinate used when drawing.
    pub fn x_of(&self, ts: &NaiveDateTime) -> f64 {
        (*ts - self.window.start).num_milliseconds() as f64 / 1000.0
    }

    pub fn x_extent(&self) -> f64 {
        self.x_of(&self.window.end).max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqwatch_types::parse_timestamp;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn test_one_label_band_and_one_prediction_band() {
        let labels = vec![LabeledRange::from(TimeRange::parse("2019-08-08", "2019-08-09").unwrap())];
        let predicted = vec![PredictedRange::new(
            TimeRange::parse("2019-08-08T00:42", "2019-08-08T01:48").unwrap(),
            Vec::new(),
        )];
        let window = TimeRange::parse("2019-08-01", "2019-10-27").unwrap();

        let plan = OverlayPlan::new("evaluation", window)
            .with_labels(&labels)
            .with_predictions(&predicted);

        assert_eq!(plan.bands_of(BandKind::Label).count(), 1);
        assert_eq!(plan.bands_of(BandKind::Prediction).count(), 1);
        assert_eq!(plan.bands.len(), 2);
    }

    #[test]
    fn test_bands_clipped_to_window() {
        let window = TimeRange::parse("2019-08-08T01:00", "2019-08-08T12:00").unwrap();
        let plan = OverlayPlan::new("zoom", window)
            .with_labels(&[
                TimeRange::parse("2019-08-08", "2019-08-09").unwrap().into(),
                TimeRange::parse("2019-09-01", "2019-09-02").unwrap().into(),
            ]);

        assert_eq!(plan.bands.len(), 1);
        assert_eq!(plan.bands[0].range, window);
    }

    #[test]
    fn test_series_clipped_to_window() {
        let window = TimeRange::parse("2019-08-08T00:01", "2019-08-08T00:02").unwrap();
        let plan = OverlayPlan::new("s", window).with_series(
            "Sensor0",
            vec![(ts("2019-08-08T00:00"), 1.0), (ts("2019-08-08T00:01"), 2.0), (ts("2019-08-08T00:03"), 3.0)],
        );
        assert_eq!(plan.series[0].points, vec![(ts("2019-08-08T00:01"), 2.0)]);
        assert_eq!(plan.series[0].value_range(), Some((2.0, 2.0)));
        assert_eq!(plan.x_of(&ts("2019-08-08T00:02")), 60.0);
    }

    #[test]
    fn test_with_table_skips_unknown_tags() {
        let table = SensorTable::from_rows(
            vec!["Sensor0".into()],
            vec![(ts("2019-08-08T00:00"), vec![Some(1.0)])],
        )
        .unwrap();
        let plan = OverlayPlan::new("t", table.span().unwrap()).with_table(&table, &["Sensor0", "Nope"]);
        assert_eq!(plan.series.len(), 1);
    }
}
