use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::agent::Agent;
use crate::config::{ModelSlot, PipelineConfig, model_env_var};
use crate::errors::ConfigError;
use crate::pipeline::StageSpec;
use crate::providers::TextGenerationClient;
use crate::template::{PromptTemplate, REQUEST_PLACEHOLDER};
use crate::types::ModelId;

pub const DEFAULT_REQUEST: &str = "Create a simple Tic-Tac-Toe (X&Os) game in Python";

pub const BUILTIN_PIPELINES: [&str; 3] = ["game-development", "content-review", "content-pipeline"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Model used when neither the environment nor the config file names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Variable overriding the model; defaults to `<NAME>_MODEL`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub prompt: String,
}

impl StageDefinition {
    pub fn model_env_var(&self) -> String {
        self.model_env
            .clone()
            .unwrap_or_else(|| model_env_var(&self.name))
    }
}

/// An ordered list of stages, loaded from YAML or built in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Request used when the caller supplies none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    pub stages: Vec<StageDefinition>,
}

fn stage(
    name: &str,
    description: &str,
    model: ModelId,
    system_prompt: Option<&str>,
    prompt: &str,
) -> StageDefinition {
    StageDefinition {
        name: name.to_string(),
        description: Some(description.to_string()),
        model: Some(model.to_string()),
        model_env: None,
        system_prompt: system_prompt.map(str::to_string),
        prompt: prompt.to_string(),
    }
}

impl PipelineDefinition {
    /// Built-in definition by name, see [`BUILTIN_PIPELINES`].
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "game-development" => Some(Self::game_development()),
            "content-review" => Some(Self::content_review()),
            "content-pipeline" => Some(Self::content_pipeline()),
            _ => None,
        }
    }

    /// Architecture -> development -> testing -> documentation.
    pub fn game_development() -> Self {
        Self {
            name: Some("game-development".to_string()),
            request: Some(DEFAULT_REQUEST.to_string()),
            stages: vec![
                stage(
                    "architecture",
                    "Creating architecture",
                    ModelId::claude_3_sonnet(),
                    Some("You are a software architect. Create detailed technical specifications and architecture for software projects."),
                    "Create a detailed architecture and rulebook for: {{request}}",
                ),
                stage(
                    "development",
                    "Writing code",
                    ModelId::claude_3_haiku(),
                    Some("You are a Python developer. Write clean, functional code based on specifications."),
                    "Based on this architecture, write complete Python code:\n{{architecture}}",
                ),
                stage(
                    "testing",
                    "Creating tests",
                    ModelId::nova_lite(),
                    Some("You are a QA engineer. Create comprehensive tests for code to ensure it works correctly."),
                    "Create comprehensive unit tests for this code:\n{{development}}",
                ),
                // Titan text models reject system prompts.
                stage(
                    "documentation",
                    "Creating documentation",
                    ModelId::titan_text_express(),
                    None,
                    "Act as a technical writer. Create comprehensive documentation for this Tic-Tac-Toe game. \
                     Include setup instructions, usage guide, architecture overview, testing approach, and API reference.\n\n\
                     Architecture:\n{{architecture}}\n\n\
                     Code Implementation:\n{{development}}\n\n\
                     Test Suite:\n{{testing}}\n\n\
                     Create documentation that explains the architecture decisions, how to use the application, and how it was tested.",
                ),
            ],
        }
    }

    /// Generate with Claude, then have Titan edit the result.
    pub fn content_review() -> Self {
        Self {
            name: Some("content-review".to_string()),
            request: Some(
                "Write a short marketing message for a new AI-powered productivity app".to_string(),
            ),
            stages: vec![
                stage(
                    "generation",
                    "Generating content",
                    ModelId::claude_3_haiku(),
                    Some("You are a content creator. Generate creative content based on user input."),
                    "{{request}}",
                ),
                stage(
                    "review",
                    "Reviewing content",
                    ModelId::titan_text_express(),
                    None,
                    "Act as an editor. Review and improve this content to make it more concise and professional: {{generation}}",
                ),
            ],
        }
    }

    /// Analyze a topic, draft content from the key points, then polish it.
    pub fn content_pipeline() -> Self {
        Self {
            name: Some("content-pipeline".to_string()),
            request: Some("Benefits of cloud computing for small businesses".to_string()),
            stages: vec![
                stage(
                    "analysis",
                    "Analyzing topic",
                    ModelId::claude_3_haiku(),
                    None,
                    "Analyze this topic and suggest key points: {{request}}",
                ),
                stage(
                    "draft",
                    "Writing draft",
                    ModelId::nova_lite(),
                    None,
                    "Write content about: {{request}}. Key points: {{analysis}}",
                ),
                stage(
                    "editing",
                    "Editing draft",
                    ModelId::claude_3_haiku(),
                    None,
                    "Edit and polish this content: {{draft}}",
                ),
            ],
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: PathBuf::from(path),
            source,
        })?;
        let definition: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from(path),
            message: e.to_string(),
        })?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("pipeline")
    }

    pub fn request(&self) -> Option<&str> {
        self.request.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// Check names and templates. Placeholders may only refer to the request
    /// or to stages that run earlier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parse_templates().map(|_| ())
    }

    fn parse_templates(&self) -> Result<Vec<PromptTemplate>, ConfigError> {
        let mut earlier: HashSet<&str> = HashSet::new();
        let mut templates = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let name = stage.name.as_str();
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyStageName);
            }
            if name == REQUEST_PLACEHOLDER {
                return Err(ConfigError::Template {
                    stage: name.to_string(),
                    message: format!("'{REQUEST_PLACEHOLDER}' is reserved for the seed request"),
                });
            }
            if earlier.contains(name) {
                return Err(ConfigError::DuplicateStage(name.to_string()));
            }
            if stage.prompt.trim().is_empty() {
                return Err(ConfigError::EmptyPrompt(name.to_string()));
            }

            let template = PromptTemplate::parse(&stage.prompt).map_err(|message| {
                ConfigError::Template {
                    stage: name.to_string(),
                    message,
                }
            })?;
            if let Some(reference) = template
                .stage_references()
                .into_iter()
                .find(|r| !earlier.contains(r))
            {
                return Err(ConfigError::UnknownReference {
                    stage: name.to_string(),
                    reference: reference.to_string(),
                });
            }

            earlier.insert(name);
            templates.push(template);
        }

        Ok(templates)
    }

    /// Model slots to resolve against the environment and config file.
    pub fn model_slots(&self) -> Vec<ModelSlot> {
        self.stages
            .iter()
            .map(|stage| ModelSlot {
                stage: stage.name.clone(),
                env_var: stage.model_env_var(),
                default: stage.model.as_deref().map(ModelId::new),
            })
            .collect()
    }

    /// Bind every stage to an agent on `client` with the model `config`
    /// resolved for it.
    pub fn build_stages(
        &self,
        config: &PipelineConfig,
        client: Arc<dyn TextGenerationClient>,
    ) -> Result<Vec<StageSpec>, ConfigError> {
        let templates = self.parse_templates()?;
        let inference = config.inference.to_config();

        self.stages
            .iter()
            .zip(templates)
            .map(|(stage, template)| {
                let model = config
                    .model_for(&stage.name)
                    .cloned()
                    .or_else(|| stage.model.as_deref().map(ModelId::new))
                    .ok_or_else(|| ConfigError::MissingModel {
                        stage: stage.name.clone(),
                        env_var: stage.model_env_var(),
                    })?;

                let mut agent =
                    Agent::new(Arc::clone(&client), model).with_inference(inference.clone());
                if let Some(prompt) = &stage.system_prompt {
                    agent = agent.with_system_prompt(prompt.as_str());
                }

                let mut spec = StageSpec::new(stage.name.as_str(), agent, move |ctx| {
                    template.render(ctx)
                });
                if let Some(description) = &stage.description {
                    spec = spec.with_description(description.as_str());
                }
                Ok(spec)
            })
            .collect()
    }
}
