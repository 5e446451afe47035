use std::fmt;

use crate::agent::Agent;

use super::context::PipelineContext;

pub type PromptBuilder = Box<dyn Fn(&PipelineContext) -> String + Send + Sync>;

/// A named pipeline step: an agent plus the function that turns earlier
/// outputs into its input.
pub struct StageSpec {
    name: String,
    description: Option<String>,
    agent: Agent,
    build_prompt: PromptBuilder,
}

impl StageSpec {
    pub fn new<F>(name: impl Into<String>, agent: Agent, build_prompt: F) -> Self
    where
        F: Fn(&PipelineContext) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: None,
            agent,
            build_prompt: Box::new(build_prompt),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Falls back to the stage name.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn build_prompt(&self, ctx: &PipelineContext) -> String {
        (self.build_prompt)(ctx)
    }
}

impl fmt::Debug for StageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("agent", &self.agent)
            .finish_non_exhaustive()
    }
}
