mod context;
mod orchestrator;
mod stage;
mod types;

pub use context::PipelineContext;
pub use orchestrator::PipelineOrchestrator;
pub use stage::{PromptBuilder, StageSpec};
pub use types::{PipelineResult, PipelineState, StageOutcome, StageState};
