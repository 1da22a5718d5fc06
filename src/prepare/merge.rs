//! Component discovery, merging into one wide table, and the inverse split.

use std::fs;
use std::path::{Path, PathBuf};

use eqwatch_types::TagComponentMap;
use tracing::{debug, info, warn};

use super::{read_table_path, PrepareError, SensorTable};

/// The sensors of one component, as loaded from its CSV file(s).
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentFrame {
    pub component: String,
    pub table: SensorTable,
}

impl ComponentFrame {
    pub fn new(component: impl Into<String>, table: SensorTable) -> Self {
        Self {
            component: component.into(),
            table,
        }
    }
}

/// Load one component CSV.
pub fn read_component_csv(path: &Path, component: &str) -> Result<ComponentFrame, PrepareError> {
    let table = read_table_path(path)?;
    debug!(component, path = %path.display(), sensors = table.columns().len(), "component file read");
    Ok(ComponentFrame::new(component, table))
}

/// Load every component under `dir`.
///
/// Each sub-directory is a component named after the directory; all `.csv`
/// files inside are stacked by time. Directories without CSV files are
/// skipped with a warning. Components are returned sorted by name.
pub fn discover_components(dir: &Path) -> Result<Vec<ComponentFrame>, PrepareError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| PrepareError::Io { path, source }
    };

    let mut component_dirs: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err(dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    component_dirs.sort();

    let mut frames = Vec::new();
    for component_dir in component_dirs {
        let Some(component) = component_dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        let mut files: Vec<PathBuf> = fs::read_dir(&component_dir)
            .map_err(io_err(&component_dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
            .collect();
        files.sort();

        if files.is_empty() {
            warn!(component = %component, "no CSV files found, skipping component");
            continue;
        }

        let tables = files
            .iter()
            .map(|f| read_table_path(f))
            .collect::<Result<Vec<_>, _>>()?;
        let table = if tables.len() == 1 {
            tables.into_iter().next().unwrap_or_default()
        } else {
            SensorTable::concat(&tables)?
        };

        info!(
            component = %component,
            files = files.len(),
            sensors = table.columns().len(),
            rows = table.len(),
            "component loaded"
        );
        frames.push(ComponentFrame::new(component, table));
    }

    if frames.is_empty() {
        return Err(PrepareError::NoComponents(dir.to_path_buf()));
    }
    Ok(frames)
}

/// Merge component frames into one wide table and build the tag map.
///
/// Rows are outer-joined on timestamp; a tag present in two components is
/// an error.
pub fn merge(frames: &[ComponentFrame]) -> Result<(SensorTable, TagComponentMap), PrepareError> {
    let mut map = TagComponentMap::new();
    for frame in frames {
        for tag in frame.table.tags() {
            if let Some(existing) = map.component_of(tag) {
                if existing != frame.component {
                    warn!(tag, first = existing, second = %frame.component, "tag found in two components");
                }
                return Err(PrepareError::DuplicateTag(tag.to_string()));
            }
            map.insert(tag, frame.component.clone())?;
        }
    }

    let table = SensorTable::outer_join(frames.iter().map(|f| &f.table))?;
    info!(
        components = frames.len(),
        sensors = map.len(),
        rows = table.len(),
        "components merged"
    );
    Ok((table, map))
}

/// Split a wide table back into one frame per component of `map`.
///
/// Rows where every sensor of a component is missing are dropped from that
/// component's frame. Every tag in the table must be in the map. Frames are
/// sorted by component name.
pub fn split(table: &SensorTable, map: &TagComponentMap) -> Result<Vec<ComponentFrame>, PrepareError> {
    for tag in table.tags() {
        if !map.contains_tag(tag) {
            return Err(PrepareError::UnmappedTag(tag.to_string()));
        }
    }

    let mut frames = Vec::new();
    for component in map.components() {
        let tags: Vec<&str> = table
            .tags()
            .filter(|t| map.component_of(t) == Some(component))
            .collect();
        if tags.is_empty() {
            debug!(component, "component has no sensors in table");
            continue;
        }

        let selected = table.select(&tags)?;
        let populated = selected.filter_rows(|idx| selected.columns().iter().any(|c| c.values[idx].is_some()));
        frames.push(ComponentFrame::new(component, populated));
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = fs::File::create(path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    fn sample_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "impeller/impeller.csv",
            "Timestamp,Sensor0,Sensor1\n2019-08-08T00:00:00,1,2\n2019-08-08T00:01:00,3,4\n",
        );
        write_file(
            dir.path(),
            "volute/volute.csv",
            "Timestamp,Sensor2\n2019-08-08T00:01:00,5\n2019-08-08T00:02:00,6\n",
        );
        fs::create_dir(dir.path().join("empty")).unwrap();
        dir
    }

    #[test]
    fn test_discover_components() {
        let dir = sample_dir();
        let frames = discover_components(dir.path()).unwrap();
        let names: Vec<&str> = frames.iter().map(|f| f.component.as_str()).collect();
        assert_eq!(names, vec!["impeller", "volute"]);
        assert_eq!(frames[0].table.columns().len(), 2);
    }

    #[test]
    fn test_discover_stacks_multiple_files() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "pump/2019-08.csv", "Timestamp,S\n2019-08-31T00:00:00,1\n");
        write_file(dir.path(), "pump/2019-09.csv", "Timestamp,S\n2019-09-01T00:00:00,2\n");
        let frames = discover_components(dir.path()).unwrap();
        assert_eq!(frames[0].table.len(), 2);
    }

    #[test]
    fn test_discover_empty_dir_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(discover_components(dir.path()), Err(PrepareError::NoComponents(_))));
    }

    #[test]
    fn test_merge_builds_map_and_outer_join() {
        let dir = sample_dir();
        let frames = discover_components(dir.path()).unwrap();
        let (table, map) = merge(&frames).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.tags().collect::<Vec<_>>(), vec!["Sensor0", "Sensor1", "Sensor2"]);
        assert_eq!(map.component_of("Sensor2"), Some("volute"));
        assert_eq!(table.column("Sensor2").unwrap().values, vec![None, Some(5.0), Some(6.0)]);
    }

    #[test]
    fn test_merge_rejects_tag_in_two_components() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a/a.csv", "Timestamp,S\n2019-08-08T00:00:00,1\n");
        write_file(dir.path(), "b/b.csv", "Timestamp,S\n2019-08-08T00:00:00,1\n");
        let frames = discover_components(dir.path()).unwrap();
        assert!(matches!(merge(&frames), Err(PrepareError::DuplicateTag(ref t)) if t == "S"));
    }

    #[test]
    fn test_split_roundtrips_merge() {
        let dir = sample_dir();
        let frames = discover_components(dir.path()).unwrap();
        let (table, map) = merge(&frames).unwrap();
        let back = split(&table, &map).unwrap();
        assert_eq!(back, frames);
    }

    #[test]
    fn test_split_requires_mapped_tags() {
        let dir = sample_dir();
        let frames = discover_components(dir.path()).unwrap();
        let (table, _) = merge(&frames).unwrap();
        let partial = TagComponentMap::builder().component("impeller", ["Sensor0", "Sensor1"]).build().unwrap();
        assert!(matches!(split(&table, &partial), Err(PrepareError::UnmappedTag(ref t)) if t == "Sensor2"));
    }
}
