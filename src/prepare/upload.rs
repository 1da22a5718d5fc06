//! Upload prepared component files to object storage.

use tracing::info;

use super::{write_table, ComponentFrame, PrepareError};
use crate::store::{join_key, ObjectStore};

/// File name of each component's object.
pub const SENSOR_FILE_NAME: &str = "sensors.csv";

/// Key for a component's sensor file: `<prefix>/<component>/sensors.csv`.
pub fn component_key(prefix: &str, component: &str) -> String {
    join_key(&[prefix, component, SENSOR_FILE_NAME])
}

/// Write one CSV object per component and return the keys written.
///
/// The bucket is checked first so a missing or forbidden bucket fails
/// before anything is uploaded.
pub fn upload_dataset(
    store: &dyn ObjectStore,
    prefix: &str,
    frames: &[ComponentFrame],
) -> Result<Vec<String>, PrepareError> {
    store.head_bucket()?;

    let mut keys = Vec::with_capacity(frames.len());
    for frame in frames {
        let key = component_key(prefix, &frame.component);
        let mut body = Vec::new();
        write_table(&frame.table, &mut body)?;
        store.put(&key, &body)?;
        info!(store = store.description(), key = %key, bytes = body.len(), "component uploaded");
        keys.push(key);
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::{read_table, SensorTable};
    use crate::store::{LocalStore, StoreError};
    use eqwatch_types::parse_timestamp;
    use tempfile::TempDir;

    fn frame(component: &str, tag: &str) -> ComponentFrame {
        let table = SensorTable::from_rows(
            vec![tag.to_string()],
            vec![(parse_timestamp("2019-08-08T00:00:00").unwrap(), vec![Some(1.0)])],
        )
        .unwrap();
        ComponentFrame::new(component, table)
    }

    #[test]
    fn test_component_key() {
        assert_eq!(component_key("training-data", "impeller"), "training-data/impeller/sensors.csv");
        assert_eq!(component_key("", "impeller"), "impeller/sensors.csv");
    }

    #[test]
    fn test_upload_writes_one_object_per_component() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("bucket")).unwrap();
        let store = LocalStore::new(dir.path(), "bucket");

        let frames = vec![frame("impeller", "Sensor0"), frame("volute", "Sensor1")];
        let keys = upload_dataset(&store, "training-data", &frames).unwrap();
        assert_eq!(
            keys,
            vec!["training-data/impeller/sensors.csv", "training-data/volute/sensors.csv"]
        );
        assert_eq!(store.list("training-data").unwrap(), keys);

        let body = store.get(&keys[1]).unwrap();
        assert_eq!(read_table(body.as_slice()).unwrap(), frames[1].table);
    }

    #[test]
    fn test_upload_to_missing_bucket_fails_first() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path(), "absent");
        let err = upload_dataset(&store, "training-data", &[frame("impeller", "Sensor0")]).unwrap_err();
        assert!(matches!(err, PrepareError::Store(StoreError::BucketNotFound { .. })));
    }
}
