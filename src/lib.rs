pub mod agent;
pub mod api;
pub mod config;
pub mod config_file;
pub mod credentials;
pub mod definition;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod sanitize;
pub mod template;
pub mod types;
pub mod ui;

pub use crate::agent::Agent;
pub use crate::config::{Endpoint, PipelineConfig};
pub use crate::definition::PipelineDefinition;
pub use crate::errors::{AgentError, ConfigError, PipelineError, ProviderError};
pub use crate::pipeline::{PipelineContext, PipelineOrchestrator, PipelineResult, StageOutcome, StageSpec};
pub use crate::providers::TextGenerationClient;
pub use crate::types::ModelId;
