//! File-based model source.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use super::{ModelEvaluation, ModelSource, SourceError};

/// Reads a describe-model document from a JSON file.
///
/// The source tracks the file's modification time and only returns new
/// data when the file has been rewritten, so a response saved again after
/// retraining shows up without restarting the inspector.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            last_modified: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file once, returning the error instead of storing it.
    pub fn load(&self) -> Result<ModelEvaluation, SourceError> {
        let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let evaluation = ModelEvaluation::parse(&content)?;
        debug!(
            path = %self.path.display(),
            labeled = evaluation.labeled_ranges().len(),
            predicted = evaluation.predicted_ranges().len(),
            "model evaluation loaded"
        );
        Ok(evaluation)
    }

    fn modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }
}

impl ModelSource for FileSource {
    fn poll(&mut self) -> Option<ModelEvaluation> {
        let current_modified = self.modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,
            // File disappeared, keep what we have
            (Some(_), None) => false,
            (Some(last), Some(current)) => current > last,
        };
        if !file_changed {
            return None;
        }

        match self.load() {
            Ok(evaluation) => {
                self.last_error = None;
                self.last_modified = current_modified;
                Some(evaluation)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{
            "ModelName": "pump-model",
            "ModelMetrics": "{\"labeled_ranges\": [], \"predicted_ranges\": [{\"start\": \"2019-08-08T00:42:00\", \"end\": \"2019-08-08T01:48:00\", \"diagnostics\": [{\"name\": \"impeller\\\\Sensor0\", \"value\": 1.0}]}]}"
        }"#
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/model.json");
        assert_eq!(source.path(), Path::new("/tmp/model.json"));
        assert_eq!(source.description(), "file: /tmp/model.json");
        assert!(source.error().is_none());
    }

    #[test]
    fn test_file_source_poll_reads_once() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path());
        let eval = source.poll().unwrap();
        assert_eq!(eval.display_name(), "pump-model");
        assert_eq!(eval.predicted_ranges()[0].diagnostics[0].tag(), "Sensor0");

        // Unchanged file yields nothing new
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/model.json");
        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("cannot read"));
        assert!(matches!(source.load(), Err(SourceError::Io { .. })));
    }

    #[test]
    fn test_file_source_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("invalid JSON"));
    }
}
