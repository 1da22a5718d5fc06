//! CSV reading and writing for sensor tables and tag maps.
//!
//! Table layout: the first column holds timestamps (any header name), every
//! other column is one sensor. Empty cells are missing readings.
//!
//! Tag map layout: two columns, `Tag,Component`.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use eqwatch_types::{format_timestamp, parse_timestamp, TagComponentMap};
use tracing::debug;

use super::{PrepareError, SensorTable};

/// Header written for the timestamp column.
pub const TIMESTAMP_HEADER: &str = "Timestamp";

const TAG_HEADER: &str = "Tag";
const COMPONENT_HEADER: &str = "Component";

/// Read a wide sensor table from CSV.
pub fn read_table<R: Read>(reader: R) -> Result<SensorTable, PrepareError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(PrepareError::MissingHeader);
    }
    let tags: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    for (row_num, result) in rdr.records().enumerate() {
        let record = result?;
        // Row numbers in messages are 1-based and count the header
        let row = row_num + 2;

        let raw_ts = record.get(0).unwrap_or_default();
        let ts = parse_timestamp(raw_ts).map_err(|source| PrepareError::Timestamp { row, source })?;

        let mut values = Vec::with_capacity(tags.len());
        for (i, tag) in tags.iter().enumerate() {
            let cell = record.get(i + 1).unwrap_or_default();
            if cell.is_empty() {
                values.push(None);
                continue;
            }
            let value = cell.parse::<f64>().map_err(|_| PrepareError::InvalidValue {
                row,
                tag: tag.clone(),
                value: cell.to_string(),
            })?;
            values.push(Some(value));
        }
        rows.push((ts, values));
    }

    debug!(rows = rows.len(), sensors = tags.len(), "sensor table read");
    SensorTable::from_rows(tags, rows)
}

/// Read a wide sensor table from a CSV file.
pub fn read_table_path(path: &Path) -> Result<SensorTable, PrepareError> {
    let file = File::open(path).map_err(|source| PrepareError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_table(file)
}

/// Write a table as CSV with a `Timestamp` first column.
pub fn write_table<W: Write>(table: &SensorTable, writer: W) -> Result<(), PrepareError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![TIMESTAMP_HEADER.to_string()];
    header.extend(table.tags().map(str::to_string));
    wtr.write_record(&header)?;

    for (idx, ts) in table.timestamps().iter().enumerate() {
        let mut record = Vec::with_capacity(table.columns().len() + 1);
        record.push(format_timestamp(ts));
        for column in table.columns() {
            record.push(column.values[idx].map(|v| v.to_string()).unwrap_or_default());
        }
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Read a `Tag,Component` CSV.
pub fn read_tag_map<R: Read>(reader: R) -> Result<TagComponentMap, PrepareError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut map = TagComponentMap::new();
    for result in rdr.records() {
        let record = result?;
        let (Some(tag), Some(component)) = (record.get(0), record.get(1)) else {
            continue;
        };
        if tag.is_empty() || component.is_empty() {
            continue;
        }
        map.insert(tag, component)?;
    }
    Ok(map)
}

/// Write a `Tag,Component` CSV sorted by tag.
pub fn write_tag_map<W: Write>(map: &TagComponentMap, writer: W) -> Result<(), PrepareError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([TAG_HEADER, COMPONENT_HEADER])?;
    for (tag, component) in map.iter() {
        wtr.write_record([tag, component])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Timestamp,Sensor0,Sensor1
2019-08-08T00:01:00,1.5,
2019-08-08T00:00:00,1.25,7
";

    #[test]
    fn test_read_table() {
        let table = read_table(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.tags().collect::<Vec<_>>(), vec!["Sensor0", "Sensor1"]);
        assert_eq!(table.column("Sensor0").unwrap().values, vec![Some(1.25), Some(1.5)]);
        assert_eq!(table.column("Sensor1").unwrap().values, vec![Some(7.0), None]);
    }

    #[test]
    fn test_write_then_read_preserves_values() {
        let table = read_table(SAMPLE.as_bytes()).unwrap();
        let mut buf = Vec::new();
        write_table(&table, &mut buf).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("Timestamp,Sensor0,Sensor1\n2019-08-08T00:00:00,1.25,7\n"));
        assert_eq!(read_table(buf.as_slice()).unwrap(), table);
    }

    #[test]
    fn test_bad_value_names_row_and_sensor() {
        let csv = "Timestamp,Sensor0\n2019-08-08T00:00:00,abc\n";
        let err = read_table(csv.as_bytes()).unwrap_err();
        match err {
            PrepareError::InvalidValue { row, tag, value } => {
                assert_eq!(row, 2);
                assert_eq!(tag, "Sensor0");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_timestamp() {
        let csv = "Timestamp,Sensor0\nnot-a-time,1\n";
        assert!(matches!(
            read_table(csv.as_bytes()),
            Err(PrepareError::Timestamp { row: 2, .. })
        ));
    }

    #[test]
    fn test_tag_map_roundtrip() {
        let map = TagComponentMap::builder()
            .component("impeller", ["Sensor0"])
            .component("volute", ["Sensor1"])
            .build()
            .unwrap();
        let mut buf = Vec::new();
        write_tag_map(&map, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf.clone()).unwrap(),
            "Tag,Component\nSensor0,impeller\nSensor1,volute\n"
        );
        assert_eq!(read_tag_map(buf.as_slice()).unwrap(), map);
    }

    #[test]
    fn test_tag_map_conflict_is_error() {
        let csv = "Tag,Component\nSensor0,impeller\nSensor0,volute\n";
        assert!(matches!(read_tag_map(csv.as_bytes()), Err(PrepareError::Types(_))));
    }
}
