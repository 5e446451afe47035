use std::collections::HashMap;

/// Outputs accumulated during one pipeline run, keyed by stage name.
///
/// The seed request is kept apart from stage outputs so a stage may not
/// shadow it. Dropped when the run ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineContext {
    request: String,
    outputs: HashMap<String, String>,
}

impl PipelineContext {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            outputs: HashMap::new(),
        }
    }

    pub fn request(&self) -> &str {
        &self.request
    }

    pub fn output(&self, stage: &str) -> Option<&str> {
        self.outputs.get(stage).map(String::as_str)
    }

    pub(crate) fn insert(&mut self, stage: impl Into<String>, output: impl Into<String>) {
        self.outputs.insert(stage.into(), output.into());
    }

    /// Number of recorded stage outputs.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
