//! The describe-model response document and the evaluation extracted from it.

use chrono::{DateTime, NaiveDateTime};
use eqwatch_types::{parse_timestamp, LabeledRange, PredictedRange, TimeRange};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::SourceError;

/// Evaluation results the service reports for a trained model.
///
/// This is the `ModelMetrics` payload. The service returns it as a JSON
/// string embedded in the describe-model response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    #[serde(default)]
    pub labeled_ranges: Vec<LabeledRange>,
    #[serde(default)]
    pub predicted_ranges: Vec<PredictedRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labeled_event_metrics: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_event_metrics: Option<Value>,
}

/// `ModelMetrics` as it appears in a response: embedded string or object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MetricsField {
    Embedded(String),
    Inline(ModelMetrics),
}

/// The subset of the describe-model response this tool reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeModelResponse {
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, deserialize_with = "optional_time")]
    training_data_start_time: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "optional_time")]
    training_data_end_time: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "optional_time")]
    evaluation_data_start_time: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "optional_time")]
    evaluation_data_end_time: Option<NaiveDateTime>,
    #[serde(default)]
    model_metrics: Option<MetricsField>,
}

/// Timestamps in responses are epoch seconds or date strings depending on
/// which client serialized them.
fn optional_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Epoch(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Epoch(secs)) => {
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
            DateTime::from_timestamp(whole as i64, nanos)
                .map(|dt| Some(dt.naive_utc()))
                .ok_or_else(|| D::Error::custom(format!("epoch time {secs} out of range")))
        }
        Some(Raw::Text(text)) => parse_timestamp(&text).map(Some).map_err(D::Error::custom),
    }
}

fn window(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Option<TimeRange> {
    TimeRange::new(start?, end?).ok()
}

/// Everything extracted from one describe-model document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelEvaluation {
    pub model_name: Option<String>,
    pub status: Option<String>,
    pub training_window: Option<TimeRange>,
    /// Evaluation window as reported by the service.
    pub reported_window: Option<TimeRange>,
    pub metrics: ModelMetrics,
}

impl ModelEvaluation {
    /// Parse a full describe-model response or a bare `ModelMetrics` object.
    pub fn parse(content: &str) -> Result<Self, SourceError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, SourceError> {
        let Some(object) = value.as_object() else {
            return Err(SourceError::Unrecognized);
        };

        let evaluation = if object.contains_key("ModelMetrics") || object.contains_key("ModelName") {
            let response: DescribeModelResponse = serde_json::from_value(value)?;
            let metrics = match response.model_metrics {
                Some(MetricsField::Embedded(raw)) => {
                    serde_json::from_str(&raw).map_err(SourceError::EmbeddedMetrics)?
                }
                Some(MetricsField::Inline(metrics)) => metrics,
                None => return Err(SourceError::MissingMetrics),
            };
            Self {
                model_name: response.model_name,
                status: response.status,
                training_window: window(response.training_data_start_time, response.training_data_end_time),
                reported_window: window(
                    response.evaluation_data_start_time,
                    response.evaluation_data_end_time,
                ),
                metrics,
            }
        } else if object.contains_key("predicted_ranges") || object.contains_key("labeled_ranges") {
            Self {
                metrics: serde_json::from_value(value)?,
                ..Self::default()
            }
        } else {
            return Err(SourceError::Unrecognized);
        };

        evaluation.validate()?;
        Ok(evaluation)
    }

    fn validate(&self) -> Result<(), SourceError> {
        for (index, label) in self.metrics.labeled_ranges.iter().enumerate() {
            if !label.range.is_valid() {
                return Err(SourceError::InvalidRange { kind: "labeled", index });
            }
        }
        for (index, predicted) in self.metrics.predicted_ranges.iter().enumerate() {
            if !predicted.range.is_valid() {
                return Err(SourceError::InvalidRange { kind: "predicted", index });
            }
            if let Some(bad) = predicted
                .diagnostics
                .iter()
                .find(|d| !d.value.is_finite() || d.value < 0.0)
            {
                return Err(SourceError::NegativeImportance {
                    name: bad.name.clone(),
                    value: bad.value,
                });
            }
        }
        Ok(())
    }

    pub fn labeled_ranges(&self) -> &[LabeledRange] {
        &self.metrics.labeled_ranges
    }

    pub fn predicted_ranges(&self) -> &[PredictedRange] {
        &self.metrics.predicted_ranges
    }

    /// The evaluation window, or the span of all ranges when the service did
    /// not report one.
    pub fn evaluation_window(&self) -> Option<TimeRange> {
        self.reported_window.or_else(|| {
            TimeRange::span(
                self.metrics
                    .labeled_ranges
                    .iter()
                    .map(|l| &l.range)
                    .chain(self.metrics.predicted_ranges.iter().map(|p| &p.range)),
            )
        })
    }

    /// Short name for display.
    pub fn display_name(&self) -> &str {
        self.model_name.as_deref().unwrap_or("(unnamed model)")
    }
}
