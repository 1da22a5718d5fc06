//! Per-sensor diagnostics and the ranked contributions derived from them.

use std::cmp::Ordering;

/// Separator between the component and tag parts of a diagnostic name
/// (`centrifugal-pump\Sensor0`).
pub const TAG_SEPARATOR: char = '\\';

/// Return the tag part of a diagnostic name (text after the last separator).
///
/// Names without a separator are returned unchanged.
pub fn tag_of(name: &str) -> &str {
    match name.rfind(TAG_SEPARATOR) {
        Some(idx) => &name[idx + TAG_SEPARATOR.len_utf8()..],
        None => name,
    }
}

/// Common view over anything with a label and an importance value.
pub trait Contribution {
    fn label(&self) -> &str;
    fn value(&self) -> f64;
    fn set_value(&mut self, value: f64);
}

/// Sort descending by value, ties broken by label ascending.
pub fn rank<T: Contribution>(items: &mut [T]) {
    items.sort_by(|a, b| {
        b.value()
            .partial_cmp(&a.value())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label().cmp(b.label()))
    });
}

/// Divide every value by the total so the values sum to 1.
///
/// Leaves the values untouched when the total is zero.
pub fn normalize<T: Contribution>(items: &mut [T]) {
    let total: f64 = items.iter().map(|i| i.value()).sum();
    if total > 0.0 {
        for item in items.iter_mut() {
            let v = item.value();
            item.set_value(v / total);
        }
    }
}

/// One entry of a predicted range's diagnostics list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorDiagnostic {
    /// Sensor name as reported by the service, usually `component\tag`.
    pub name: String,
    /// Importance of this sensor for the range.
    pub value: f64,
}

impl SensorDiagnostic {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// The tag part of the name.
    pub fn tag(&self) -> &str {
        tag_of(&self.name)
    }

    /// The component part of a `component\tag` name, if present.
    pub fn component_hint(&self) -> Option<&str> {
        let idx = self.name.rfind(TAG_SEPARATOR)?;
        let component = &self.name[..idx];
        (!component.is_empty()).then_some(component)
    }
}

impl Contribution for SensorDiagnostic {
    fn label(&self) -> &str {
        &self.name
    }
    fn value(&self) -> f64 {
        self.value
    }
    fn set_value(&mut self, value: f64) {
        self.value = value;
    }
}

/// Summed importance for one sensor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorImportance {
    pub sensor: String,
    pub value: f64,
}

impl SensorImportance {
    pub fn new(sensor: impl Into<String>, value: f64) -> Self {
        Self {
            sensor: sensor.into(),
            value,
        }
    }
}

impl Contribution for SensorImportance {
    fn label(&self) -> &str {
        &self.sensor
    }
    fn value(&self) -> f64 {
        self.value
    }
    fn set_value(&mut self, value: f64) {
        self.value = value;
    }
}

/// Summed importance for one component.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentContribution {
    pub component: String,
    pub value: f64,
}

impl ComponentContribution {
    pub fn new(component: impl Into<String>, value: f64) -> Self {
        Self {
            component: component.into(),
            value,
        }
    }
}

impl Contribution for ComponentContribution {
    fn label(&self) -> &str {
        &self.component
    }
    fn value(&self) -> f64 {
        self.value
    }
    fn set_value(&mut self, value: f64) {
        self.value = value;
    }
}
