//! Wide, time-indexed sensor table.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, NaiveDateTime, TimeDelta};
use eqwatch_types::TimeRange;

use super::PrepareError;

/// One sensor's values, aligned with the table's timestamp index.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorColumn {
    pub tag: String,
    /// `None` marks a missing reading.
    pub values: Vec<Option<f64>>,
}

impl SensorColumn {
    pub fn new(tag: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            tag: tag.into(),
            values,
        }
    }

    /// Number of non-missing readings.
    pub fn present(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Sensor readings as one column per sensor over a shared timestamp index.
///
/// Invariants: timestamps are strictly increasing, every column has one
/// value per timestamp, and tags are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorTable {
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<SensorColumn>,
}

impl SensorTable {
    /// Build a table from an already sorted index and aligned columns.
    pub fn new(timestamps: Vec<NaiveDateTime>, columns: Vec<SensorColumn>) -> Result<Self, PrepareError> {
        if let Some(w) = timestamps.windows(2).find(|w| w[1] <= w[0]) {
            return Err(if w[1] == w[0] {
                PrepareError::DuplicateTimestamp(w[1])
            } else {
                PrepareError::NotMonotonic(w[1])
            });
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.tag.as_str()) {
                return Err(PrepareError::DuplicateTag(column.tag.clone()));
            }
            if column.values.len() != timestamps.len() {
                return Err(PrepareError::ColumnLength {
                    tag: column.tag.clone(),
                    expected: timestamps.len(),
                    actual: column.values.len(),
                });
            }
        }

        Ok(Self {
            timestamps,
            columns,
        })
    }

    /// Build a table from unsorted rows; rows are sorted by timestamp.
    pub fn from_rows(
        tags: Vec<String>,
        mut rows: Vec<(NaiveDateTime, Vec<Option<f64>>)>,
    ) -> Result<Self, PrepareError> {
        rows.sort_by_key(|(ts, _)| *ts);

        let mut columns: Vec<SensorColumn> = tags
            .into_iter()
            .map(|tag| SensorColumn::new(tag, Vec::with_capacity(rows.len())))
            .collect();
        let mut timestamps = Vec::with_capacity(rows.len());

        for (ts, values) in rows {
            if values.len() != columns.len() {
                return Err(PrepareError::ColumnLength {
                    tag: format!("<row {}>", ts),
                    expected: columns.len(),
                    actual: values.len(),
                });
            }
            timestamps.push(ts);
            for (column, value) in columns.iter_mut().zip(values) {
                column.values.push(value);
            }
        }

        Self::new(timestamps, columns)
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[SensorColumn] {
        &self.columns
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.tag.as_str())
    }

    pub fn column(&self, tag: &str) -> Option<&SensorColumn> {
        self.columns.iter().find(|c| c.tag == tag)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// First and last timestamp.
    pub fn span(&self) -> Option<TimeRange> {
        let start = *self.timestamps.first()?;
        let end = *self.timestamps.last()?;
        Some(TimeRange { start, end })
    }

    /// Non-missing `(timestamp, value)` points for one sensor.
    pub fn series(&self, tag: &str) -> Option<Vec<(NaiveDateTime, f64)>> {
        let column = self.column(tag)?;
        Some(
            self.timestamps
                .iter()
                .zip(&column.values)
                .filter_map(|(ts, v)| v.map(|v| (*ts, v)))
                .collect(),
        )
    }

    /// Rows whose timestamp lies inside `window` (inclusive).
    pub fn slice(&self, window: &TimeRange) -> SensorTable {
        self.filter_rows(|idx| window.contains(&self.timestamps[idx]))
    }

    /// Keep only the given sensors, in the given order.
    pub fn select(&self, tags: &[&str]) -> Result<SensorTable, PrepareError> {
        let columns = tags
            .iter()
            .map(|tag| {
                self.column(tag)
                    .cloned()
                    .ok_or_else(|| PrepareError::UnknownTag(tag.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        SensorTable::new(self.timestamps.clone(), columns)
    }

    /// Keep the rows for which `keep(row_index)` is true.
    pub(crate) fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> SensorTable {
        let rows: Vec<usize> = (0..self.len()).filter(|&i| keep(i)).collect();
        SensorTable {
            timestamps: rows.iter().map(|&i| self.timestamps[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| SensorColumn::new(c.tag.clone(), rows.iter().map(|&i| c.values[i]).collect()))
                .collect(),
        }
    }

    /// Outer join on timestamp. Cells a table does not cover become missing.
    ///
    /// Fails if the same tag appears in more than one table.
    pub fn outer_join<'a, I>(tables: I) -> Result<SensorTable, PrepareError>
    where
        I: IntoIterator<Item = &'a SensorTable>,
    {
        let tables: Vec<&SensorTable> = tables.into_iter().collect();

        let mut seen = HashSet::new();
        for table in &tables {
            for tag in table.tags() {
                if !seen.insert(tag) {
                    return Err(PrepareError::DuplicateTag(tag.to_string()));
                }
            }
        }

        let index: Vec<NaiveDateTime> = tables
            .iter()
            .flat_map(|t| t.timestamps.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut columns = Vec::new();
        for table in &tables {
            let positions: Vec<Option<usize>> = index
                .iter()
                .map(|ts| table.timestamps.binary_search(ts).ok())
                .collect();
            for column in &table.columns {
                let values = positions.iter().map(|p| p.and_then(|i| column.values[i])).collect();
                columns.push(SensorColumn::new(column.tag.clone(), values));
            }
        }

        SensorTable::new(index, columns)
    }

    /// Stack tables that cover different time periods (e.g. one file per month).
    ///
    /// Tags are unioned in order of first appearance; a timestamp present in
    /// two tables is an error.
    pub fn concat<'a, I>(tables: I) -> Result<SensorTable, PrepareError>
    where
        I: IntoIterator<Item = &'a SensorTable>,
    {
        let mut tags: Vec<String> = Vec::new();
        let mut rows: BTreeMap<NaiveDateTime, BTreeMap<String, Option<f64>>> = BTreeMap::new();

        for table in tables {
            for tag in table.tags() {
                if !tags.iter().any(|t| t == tag) {
                    tags.push(tag.to_string());
                }
            }
            for (idx, ts) in table.timestamps.iter().enumerate() {
                if rows.contains_key(ts) {
                    return Err(PrepareError::DuplicateTimestamp(*ts));
                }
                let row = table
                    .columns
                    .iter()
                    .map(|c| (c.tag.clone(), c.values[idx]))
                    .collect();
                rows.insert(*ts, row);
            }
        }

        let rows = rows
            .into_iter()
            .map(|(ts, mut row)| {
                let values = tags.iter().map(|t| row.remove(t).flatten()).collect();
                (ts, values)
            })
            .collect();
        SensorTable::from_rows(tags, rows)
    }

    /// Average readings into fixed-width windows aligned to the Unix epoch.
    ///
    /// Each output row is stamped with its window start. Missing cells are
    /// ignored; a window with no reading for a sensor stays missing.
    pub fn resample(&self, width: TimeDelta) -> Result<SensorTable, PrepareError> {
        let width_secs = width.num_seconds();
        if width_secs < 1 {
            return Err(PrepareError::InvalidWidth);
        }

        // bucket start (epoch seconds) -> per-column (sum, count)
        let mut buckets: BTreeMap<i64, Vec<(f64, usize)>> = BTreeMap::new();
        for (idx, ts) in self.timestamps.iter().enumerate() {
            let secs = ts.and_utc().timestamp();
            let bucket = secs - secs.rem_euclid(width_secs);
            let acc = buckets
                .entry(bucket)
                .or_insert_with(|| vec![(0.0, 0); self.columns.len()]);
            for (slot, column) in acc.iter_mut().zip(&self.columns) {
                if let Some(v) = column.values[idx] {
                    slot.0 += v;
                    slot.1 += 1;
                }
            }
        }

        let mut timestamps = Vec::with_capacity(buckets.len());
        let mut columns: Vec<SensorColumn> = self
            .columns
            .iter()
            .map(|c| SensorColumn::new(c.tag.clone(), Vec::with_capacity(buckets.len())))
            .collect();

        for (bucket, acc) in buckets {
            let Some(start) = DateTime::from_timestamp(bucket, 0) else {
                continue;
            };
            timestamps.push(start.naive_utc());
            for (column, (sum, count)) in columns.iter_mut().zip(acc) {
                column.values.push((count > 0).then(|| sum / count as f64));
            }
        }

        SensorTable::new(timestamps, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqwatch_types::parse_timestamp;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn table(rows: &[(&str, &[Option<f64>])], tags: &[&str]) -> SensorTable {
        SensorTable::from_rows(
            tags.iter().map(|t| t.to_string()).collect(),
            rows.iter().map(|(t, v)| (ts(t), v.to_vec())).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_from_rows_sorts() {
        let t = table(
            &[("2019-08-08T00:02", &[Some(2.0)]), ("2019-08-08T00:01", &[Some(1.0)])],
            &["Sensor0"],
        );
        assert_eq!(t.timestamps()[0], ts("2019-08-08T00:01"));
        assert_eq!(t.column("Sensor0").unwrap().values, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_duplicate_timestamp_rejected() {
        let err = SensorTable::from_rows(
            vec!["Sensor0".into()],
            vec![(ts("2019-08-08T00:01"), vec![Some(1.0)]), (ts("2019-08-08T00:01"), vec![Some(2.0)])],
        )
        .unwrap_err();
        assert!(matches!(err, PrepareError::DuplicateTimestamp(_)));
    }

    #[test]
    fn test_new_rejects_unsorted_and_bad_lengths() {
        let err = SensorTable::new(vec![ts("2019-08-08T00:02"), ts("2019-08-08T00:01")], vec![]).unwrap_err();
        assert!(matches!(err, PrepareError::NotMonotonic(_)));

        let err = SensorTable::new(
            vec![ts("2019-08-08T00:01")],
            vec![SensorColumn::new("Sensor0", vec![Some(1.0), Some(2.0)])],
        )
        .unwrap_err();
        assert!(matches!(err, PrepareError::ColumnLength { expected: 1, actual: 2, .. }));
    }

    #[test]
    fn test_outer_join_fills_missing() {
        let a = table(&[("2019-08-08T00:00", &[Some(1.0)]), ("2019-08-08T00:01", &[Some(2.0)])], &["A"]);
        let b = table(&[("2019-08-08T00:01", &[Some(20.0)]), ("2019-08-08T00:02", &[Some(30.0)])], &["B"]);
        let joined = SensorTable::outer_join([&a, &b]).unwrap();

        assert_eq!(joined.len(), 3);
        assert_eq!(joined.column("A").unwrap().values, vec![Some(1.0), Some(2.0), None]);
        assert_eq!(joined.column("B").unwrap().values, vec![None, Some(20.0), Some(30.0)]);
    }

    #[test]
    fn test_outer_join_rejects_duplicate_tag() {
        let a = table(&[("2019-08-08T00:00", &[Some(1.0)])], &["A"]);
        let err = SensorTable::outer_join([&a, &a]).unwrap_err();
        assert!(matches!(err, PrepareError::DuplicateTag(ref t) if t == "A"));
    }

    #[test]
    fn test_concat_stacks_periods() {
        let aug = table(&[("2019-08-31T23:59", &[Some(1.0)])], &["A"]);
        let sep = table(&[("2019-09-01T00:00", &[Some(2.0), Some(5.0)])], &["A", "B"]);
        let all = SensorTable::concat([&sep, &aug]).unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(all.tags().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(all.column("B").unwrap().values, vec![None, Some(5.0)]);
        assert!(SensorTable::concat([&aug, &aug]).is_err());
    }

    #[test]
    fn test_slice_and_select() {
        let t = table(
            &[
                ("2019-08-08T00:00", &[Some(1.0), Some(9.0)]),
                ("2019-08-08T00:01", &[Some(2.0), None]),
                ("2019-08-08T00:02", &[Some(3.0), Some(7.0)]),
            ],
            &["A", "B"],
        );
        let window = TimeRange::parse("2019-08-08T00:01", "2019-08-08T00:02").unwrap();
        let sliced = t.slice(&window);
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced.series("B").unwrap(), vec![(ts("2019-08-08T00:02"), 7.0)]);

        let only_b = t.select(&["B"]).unwrap();
        assert_eq!(only_b.columns().len(), 1);
        assert!(matches!(t.select(&["C"]), Err(PrepareError::UnknownTag(_))));
    }

    #[test]
    fn test_resample_averages_buckets() {
        let t = table(
            &[
                ("2019-08-08T00:00", &[Some(1.0), None]),
                ("2019-08-08T00:05", &[Some(3.0), None]),
                ("2019-08-08T00:10", &[Some(10.0), Some(4.0)]),
            ],
            &["A", "B"],
        );
        let r = t.resample(TimeDelta::minutes(10)).unwrap();
        assert_eq!(r.timestamps(), &[ts("2019-08-08T00:00"), ts("2019-08-08T00:10")]);
        assert_eq!(r.column("A").unwrap().values, vec![Some(2.0), Some(10.0)]);
        assert_eq!(r.column("B").unwrap().values, vec![None, Some(4.0)]);
    }

    #[test]
    fn test_resample_rejects_sub_second_width() {
        let t = SensorTable::default();
        assert!(matches!(t.resample(TimeDelta::milliseconds(500)), Err(PrepareError::InvalidWidth)));
    }
}
