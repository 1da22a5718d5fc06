//! Roll sensor-level importance up to components.

use std::collections::BTreeMap;

use eqwatch_types::{
    rank, ComponentContribution, Contribution, PredictedRange, SensorImportance, TagComponentMap,
    TAG_SEPARATOR,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::AggregateError;

/// What to do with sensors the tag map does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Keep their totals in [`Aggregation::unresolved`].
    #[default]
    Report,
    /// Use the component part of a `component\tag` name, else report.
    #[serde(rename = "prefix")]
    #[value(name = "prefix")]
    NamePrefix,
    /// Fail, listing the unknown sensors.
    Strict,
}

impl UnresolvedPolicy {
    /// Cycle Report → NamePrefix → Strict.
    pub fn next(self) -> Self {
        match self {
            UnresolvedPolicy::Report => UnresolvedPolicy::NamePrefix,
            UnresolvedPolicy::NamePrefix => UnresolvedPolicy::Strict,
            UnresolvedPolicy::Strict => UnresolvedPolicy::Report,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UnresolvedPolicy::Report => "report",
            UnresolvedPolicy::NamePrefix => "prefix",
            UnresolvedPolicy::Strict => "strict",
        }
    }
}

/// Component totals plus whatever could not be attributed to a component.
///
/// `total()` always equals the sum of the inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Ranked descending by value, ties by name.
    pub components: Vec<ComponentContribution>,
    /// Sensors with no component, ranked the same way.
    pub unresolved: Vec<SensorImportance>,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.unresolved.is_empty()
    }

    pub fn resolved_total(&self) -> f64 {
        self.components.iter().map(|c| c.value).sum()
    }

    pub fn unresolved_total(&self) -> f64 {
        self.unresolved.iter().map(|s| s.value).sum()
    }

    pub fn total(&self) -> f64 {
        self.resolved_total() + self.unresolved_total()
    }

    pub fn get(&self, component: &str) -> Option<f64> {
        self.components.iter().find(|c| c.component == component).map(|c| c.value)
    }

    /// The `n` largest components.
    pub fn top(&self, n: usize) -> &[ComponentContribution] {
        &self.components[..n.min(self.components.len())]
    }

    /// Every value divided by the grand total, so components and
    /// unresolved sensors together sum to 1. An all-zero aggregation is
    /// returned unchanged.
    pub fn normalized(&self) -> Aggregation {
        let total = self.total();
        if total <= 0.0 {
            return self.clone();
        }
        let mut out = self.clone();
        for c in &mut out.components {
            c.value /= total;
        }
        for s in &mut out.unresolved {
            s.value /= total;
        }
        out
    }
}

/// Groups per-sensor values by component through a [`TagComponentMap`].
///
/// A name resolves if the map knows the full name or its tag part.
#[derive(Debug, Clone, Copy)]
pub struct ComponentAggregator<'a> {
    map: &'a TagComponentMap,
    policy: UnresolvedPolicy,
}

impl<'a> ComponentAggregator<'a> {
    pub fn new(map: &'a TagComponentMap) -> Self {
        Self {
            map,
            policy: UnresolvedPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> UnresolvedPolicy {
        self.policy
    }

    /// Sum `items` per component. Empty input gives an empty aggregation.
    pub fn aggregate<T: Contribution>(&self, items: &[T]) -> Result<Aggregation, AggregateError> {
        let mut components: BTreeMap<&str, f64> = BTreeMap::new();
        let mut unresolved: BTreeMap<&str, f64> = BTreeMap::new();

        for item in items {
            let name = item.label();
            let component = self.map.resolve(name).or_else(|| match self.policy {
                UnresolvedPolicy::NamePrefix => name_prefix(name),
                _ => None,
            });
            match component {
                Some(c) => *components.entry(c).or_default() += item.value(),
                None => *unresolved.entry(name).or_default() += item.value(),
            }
        }

        if !unresolved.is_empty() {
            let names: Vec<String> = unresolved.keys().map(|s| s.to_string()).collect();
            if self.policy == UnresolvedPolicy::Strict {
                return Err(AggregateError::Unresolved(names));
            }
            warn!(count = names.len(), sensors = %names.join(", "), "unresolved sensors");
        }

        let mut components: Vec<ComponentContribution> = components
            .into_iter()
            .map(|(c, v)| ComponentContribution::new(c, v))
            .collect();
        let mut unresolved: Vec<SensorImportance> = unresolved
            .into_iter()
            .map(|(s, v)| SensorImportance::new(s, v))
            .collect();
        rank(&mut components);
        rank(&mut unresolved);

        Ok(Aggregation {
            components,
            unresolved,
        })
    }

    /// Aggregate one predicted range's diagnostics.
    pub fn aggregate_range(&self, range: &PredictedRange) -> Result<Aggregation, AggregateError> {
        self.aggregate(&range.diagnostics)
    }
}

fn name_prefix(name: &str) -> Option<&str> {
    name.rsplit_once(TAG_SEPARATOR)
        .map(|(component, _)| component)
        .filter(|c| !c.is_empty())
}
