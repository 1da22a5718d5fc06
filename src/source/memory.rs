//! In-memory source.

use super::{ModelEvaluation, ModelSource};

/// A source holding one evaluation, returned on the first poll only.
#[derive(Debug)]
pub struct StaticSource {
    pending: Option<ModelEvaluation>,
    description: String,
}

impl StaticSource {
    pub fn new(evaluation: ModelEvaluation) -> Self {
        let description = format!("memory: {}", evaluation.display_name());
        Self {
            pending: Some(evaluation),
            description,
        }
    }
}

impl ModelSource for StaticSource {
    fn poll(&mut self) -> Option<ModelEvaluation> {
        self.pending.take()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_source_yields_once() {
        let mut source = StaticSource::new(ModelEvaluation::default());
        assert_eq!(source.description(), "memory: (unnamed model)");
        assert!(source.poll().is_some());
        assert!(source.poll().is_none());
        assert!(source.error().is_none());
    }
}
