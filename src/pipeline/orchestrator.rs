//! Sequential stage execution with fail-fast semantics.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::errors::{AgentError, ConfigError};
use crate::events::{Event, EventContext, EventManager};

use super::context::PipelineContext;
use super::stage::StageSpec;
use super::types::{PipelineResult, PipelineState, StageOutcome, StageState};

/// Runs an ordered list of stages one at a time.
///
/// Each stage's output is recorded in the run's `PipelineContext` before the
/// next stage builds its prompt. The first failure ends the run; later
/// stages are never attempted. Stages are never retried.
#[derive(Debug)]
pub struct PipelineOrchestrator {
    stages: Vec<StageSpec>,
    stage_timeout: Option<Duration>,
    events: EventManager,
}

impl PipelineOrchestrator {
    /// Stage names must be non-empty and unique.
    pub fn new(stages: Vec<StageSpec>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for stage in &stages {
            if stage.name().trim().is_empty() {
                return Err(ConfigError::EmptyStageName);
            }
            if !seen.insert(stage.name()) {
                return Err(ConfigError::DuplicateStage(stage.name().to_string()));
            }
        }

        Ok(Self {
            stages,
            stage_timeout: None,
            events: EventManager::new(),
        })
    }

    /// Deadline for each agent call; exceeding it fails the stage.
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn with_events(mut self, events: EventManager) -> Self {
        self.events = events;
        self
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Execute every stage in order, seeding the context with `request`.
    ///
    /// Always returns a result; inspect `overall_success` or call
    /// `into_result` to propagate a failure.
    pub async fn execute(&self, request: &str) -> PipelineResult {
        let total = self.stages.len();
        let mut state = PipelineState::Idle;
        let mut ctx = PipelineContext::new(request);
        let mut outcomes = Vec::with_capacity(total);

        let pipeline_start = Instant::now();
        transition(&mut state, PipelineState::Running);
        self.events.fire(
            Event::PipelineStart,
            &EventContext::new()
                .with_request(request)
                .with_stage_count(total)
                .with_pipeline_state(state),
        );

        for (i, stage) in self.stages.iter().enumerate() {
            let position = i + 1;
            let agent = stage.agent();
            let base_ctx = EventContext::new()
                .with_stage(position, total, stage.name())
                .with_description(stage.description())
                .with_model(agent.model().as_str());

            let input = stage.build_prompt(&ctx);
            log::info!(
                "stage {position}/{total} '{}' starting on {}",
                stage.name(),
                agent.model()
            );
            self.events.fire(
                Event::StageStart,
                &base_ctx.clone().with_stage_state(StageState::Running),
            );

            let started = Instant::now();
            let result = match self.stage_timeout {
                Some(limit) => match tokio::time::timeout(limit, agent.run(&input)).await {
                    Ok(result) => result,
                    Err(_) => Err(AgentError::Timeout(limit)),
                },
                None => agent.run(&input).await,
            };
            let elapsed = started.elapsed();

            match result {
                Ok(output) => {
                    log::info!(
                        "stage '{}' succeeded in {:.2}s",
                        stage.name(),
                        elapsed.as_secs_f64()
                    );
                    self.events.fire(
                        Event::StageSuccess,
                        &base_ctx
                            .with_stage_state(StageState::Succeeded)
                            .with_duration(elapsed)
                            .with_output(output.as_str()),
                    );
                    ctx.insert(stage.name(), output.as_str());
                    outcomes.push(StageOutcome::succeeded(stage.name(), elapsed, output));
                }
                Err(err) => {
                    let error = err.to_string();
                    log::warn!(
                        "stage '{}' failed after {:.2}s: {error}",
                        stage.name(),
                        elapsed.as_secs_f64()
                    );
                    self.events.fire(
                        Event::StageFailure,
                        &base_ctx
                            .with_stage_state(StageState::Failed)
                            .with_duration(elapsed)
                            .with_error(error.as_str()),
                    );
                    outcomes.push(StageOutcome::failed(stage.name(), elapsed, error));
                    transition(&mut state, PipelineState::Aborted);
                    break;
                }
            }
        }

        let total_duration = pipeline_start.elapsed();
        if state == PipelineState::Running {
            transition(&mut state, PipelineState::Completed);
        }

        let result = PipelineResult::new(outcomes, total_duration, total);
        debug_assert_eq!(result.state(), state);

        self.events.fire(
            Event::PipelineEnd,
            &EventContext::new()
                .with_stage_count(total)
                .with_pipeline_state(state)
                .with_duration(total_duration),
        );
        log::info!(
            "pipeline {state} after {:.2}s ({}/{} stages)",
            total_duration.as_secs_f64(),
            result.outcomes().len(),
            total
        );

        result
    }
}

fn transition(state: &mut PipelineState, next: PipelineState) {
    log::debug!("pipeline state {state} -> {next}");
    *state = next;
}
