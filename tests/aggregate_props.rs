//! Property tests for rolling sensor importance up to components.

use eqwatch::data::{ComponentAggregator, UnresolvedPolicy};
use eqwatch::{SensorImportance, TagComponentMap};
use proptest::prelude::*;

const TAGS: usize = 10;
const COMPONENTS: &[&str] = &["bearing", "impeller", "motor", "volute"];

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

/// Each of `Sensor0..Sensor9` is mapped to a component or left out.
fn tag_map() -> impl Strategy<Value = TagComponentMap> {
    prop::collection::vec(prop::option::of(0..COMPONENTS.len()), TAGS).prop_map(|assignment| {
        let mut map = TagComponentMap::new();
        for (tag, component) in assignment.into_iter().enumerate() {
            if let Some(c) = component {
                map.insert(format!("Sensor{tag}"), COMPONENTS[c]).unwrap();
            }
        }
        map
    })
}

/// Diagnostics may name sensors beyond the mapped range and may repeat.
fn diagnostics() -> impl Strategy<Value = Vec<SensorImportance>> {
    prop::collection::vec((0..TAGS + 3, 0.0f64..10.0), 0..24).prop_map(|items| {
        items
            .into_iter()
            .map(|(tag, value)| SensorImportance::new(format!("pump\\Sensor{tag}"), value))
            .collect()
    })
}

proptest! {
    #[test]
    fn test_components_are_a_subset_of_the_map(map in tag_map(), items in diagnostics()) {
        let known = map.components();
        for policy in [UnresolvedPolicy::Report, UnresolvedPolicy::Strict] {
            if let Ok(aggregation) = ComponentAggregator::new(&map).with_policy(policy).aggregate(&items) {
                for c in &aggregation.components {
                    prop_assert!(known.contains(c.component.as_str()), "{} not in map", c.component);
                }
            }
        }
    }

    #[test]
    fn test_total_is_conserved(map in tag_map(), items in diagnostics()) {
        let input: f64 = items.iter().map(|s| s.value).sum();
        for policy in [UnresolvedPolicy::Report, UnresolvedPolicy::NamePrefix] {
            let aggregation = ComponentAggregator::new(&map).with_policy(policy).aggregate(&items).unwrap();
            prop_assert!(close(aggregation.total(), input), "{} != {}", aggregation.total(), input);
        }
    }

    #[test]
    fn test_resolved_sum_matches_when_every_sensor_maps(map in tag_map(), items in diagnostics()) {
        let resolvable: Vec<SensorImportance> =
            items.into_iter().filter(|s| map.resolve(&s.sensor).is_some()).collect();
        let input: f64 = resolvable.iter().map(|s| s.value).sum();

        let aggregation = ComponentAggregator::new(&map)
            .with_policy(UnresolvedPolicy::Strict)
            .aggregate(&resolvable)
            .unwrap();
        prop_assert!(aggregation.unresolved.is_empty());
        prop_assert!(close(aggregation.resolved_total(), input));
    }

    #[test]
    fn test_strict_fails_exactly_when_report_has_unresolved(map in tag_map(), items in diagnostics()) {
        let report = ComponentAggregator::new(&map).aggregate(&items).unwrap();
        let strict = ComponentAggregator::new(&map).with_policy(UnresolvedPolicy::Strict).aggregate(&items);
        prop_assert_eq!(strict.is_err(), !report.unresolved.is_empty());
    }

    #[test]
    fn test_output_is_ranked(map in tag_map(), items in diagnostics()) {
        let aggregation = ComponentAggregator::new(&map).aggregate(&items).unwrap();
        for pair in aggregation.components.windows(2) {
            prop_assert!(pair[0].value >= pair[1].value);
        }
        for pair in aggregation.unresolved.windows(2) {
            prop_assert!(pair[0].value >= pair[1].value);
        }
    }
}
