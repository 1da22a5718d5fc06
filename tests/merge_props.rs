//! Property tests for merging component frames and splitting them back.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use eqwatch::prepare::{merge, split, ComponentFrame};
use eqwatch::SensorTable;
use proptest::prelude::*;

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2019, 8, 8)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// A frame with `tags` sensors over a random subset of 30 minutes.
///
/// Every row has at least one reading, since split drops empty rows.
fn frame(component: usize, tags: usize) -> impl Strategy<Value = ComponentFrame> {
    let row = prop::collection::vec(prop::option::of(-100.0f64..100.0), tags)
        .prop_map(|mut cells| {
            if cells.iter().all(Option::is_none) {
                cells[0] = Some(0.0);
            }
            cells
        });
    prop::collection::btree_map(0i64..30, row, 1..12).prop_map(move |rows| {
        let names: Vec<String> = (0..tags).map(|t| format!("C{component}_Sensor{t}")).collect();
        let rows = rows
            .into_iter()
            .map(|(minute, cells)| (base() + TimeDelta::minutes(minute), cells))
            .collect();
        let table = SensorTable::from_rows(names, rows).unwrap();
        ComponentFrame::new(format!("component{component}"), table)
    })
}

fn frames() -> impl Strategy<Value = Vec<ComponentFrame>> {
    prop::collection::vec(1usize..4, 1..5).prop_flat_map(|sizes| {
        sizes
            .into_iter()
            .enumerate()
            .map(|(component, tags)| frame(component, tags))
            .collect::<Vec<_>>()
    })
}

proptest! {
    #[test]
    fn test_split_inverts_merge(frames in frames()) {
        let (table, map) = merge(&frames).unwrap();
        let tag_count: usize = frames.iter().map(|f| f.table.columns().len()).sum();
        prop_assert_eq!(map.len(), tag_count);
        prop_assert_eq!(table.columns().len(), tag_count);

        let restored = split(&table, &map).unwrap();
        prop_assert_eq!(restored, frames);
    }

    #[test]
    fn test_merged_index_is_the_union(frames in frames()) {
        let (table, _) = merge(&frames).unwrap();
        let mut expected: Vec<NaiveDateTime> =
            frames.iter().flat_map(|f| f.table.timestamps().iter().copied()).collect();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(table.timestamps(), expected.as_slice());
    }
}
