use std::fmt;
use std::time::Duration;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::errors::PipelineError;

/// `Pending -> Running -> {Succeeded | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// `Idle -> Running -> {Completed | Aborted}`; terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Running,
    Completed,
    Aborted,
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageState::Pending => "pending",
            StageState::Running => "running",
            StageState::Succeeded => "succeeded",
            StageState::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Running => "running",
            PipelineState::Completed => "completed",
            PipelineState::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum StageStatus {
    Succeeded(String),
    Failed(String),
}

/// Record of one attempted stage. Carries an output iff it succeeded and an
/// error iff it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    name: String,
    duration: Duration,
    status: StageStatus,
}

impl StageOutcome {
    pub fn succeeded(name: impl Into<String>, duration: Duration, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration,
            status: StageStatus::Succeeded(output.into()),
        }
    }

    pub fn failed(name: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration,
            status: StageStatus::Failed(error.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    pub fn success(&self) -> bool {
        matches!(self.status, StageStatus::Succeeded(_))
    }

    pub fn output(&self) -> Option<&str> {
        match &self.status {
            StageStatus::Succeeded(out) => Some(out),
            StageStatus::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            StageStatus::Succeeded(_) => None,
            StageStatus::Failed(err) => Some(err),
        }
    }

    pub fn state(&self) -> StageState {
        if self.success() {
            StageState::Succeeded
        } else {
            StageState::Failed
        }
    }
}

impl Serialize for StageOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("StageOutcome", 4)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("duration_seconds", &self.duration_seconds())?;
        s.serialize_field("success", &self.success())?;
        match &self.status {
            StageStatus::Succeeded(out) => s.serialize_field("output", out)?,
            StageStatus::Failed(err) => s.serialize_field("error", err)?,
        }
        s.end()
    }
}

/// Everything one run produced: one outcome per attempted stage in
/// execution order. Stages after a failure never appear.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    outcomes: Vec<StageOutcome>,
    total_duration: Duration,
    stage_count: usize,
}

impl PipelineResult {
    pub fn new(outcomes: Vec<StageOutcome>, total_duration: Duration, stage_count: usize) -> Self {
        Self {
            outcomes,
            total_duration,
            stage_count,
        }
    }

    pub fn outcomes(&self) -> &[StageOutcome] {
        &self.outcomes
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.total_duration.as_secs_f64()
    }

    /// Number of stages the pipeline was defined with.
    pub fn stage_count(&self) -> usize {
        self.stage_count
    }

    /// True iff every stage was attempted and every attempt succeeded.
    pub fn overall_success(&self) -> bool {
        self.outcomes.len() == self.stage_count && self.outcomes.iter().all(StageOutcome::success)
    }

    pub fn state(&self) -> PipelineState {
        if self.overall_success() {
            PipelineState::Completed
        } else {
            PipelineState::Aborted
        }
    }

    /// Zero-based index and outcome of the stage that failed.
    pub fn failed_stage(&self) -> Option<(usize, &StageOutcome)> {
        self.outcomes.iter().enumerate().find(|(_, o)| !o.success())
    }

    /// State of every configured stage; stages never attempted stay `Pending`.
    pub fn stage_states(&self) -> Vec<StageState> {
        let mut states: Vec<StageState> = self.outcomes.iter().map(StageOutcome::state).collect();
        states.resize(self.stage_count.max(states.len()), StageState::Pending);
        states
    }

    pub fn output(&self, stage: &str) -> Option<&str> {
        self.outcomes
            .iter()
            .find(|o| o.name() == stage)
            .and_then(StageOutcome::output)
    }

    /// Output of the last stage, when the whole pipeline succeeded.
    pub fn final_output(&self) -> Option<&str> {
        if !self.overall_success() {
            return None;
        }
        self.outcomes.last().and_then(StageOutcome::output)
    }

    /// Turn a recorded failure into an error for `?` propagation.
    pub fn into_result(self) -> Result<Self, PipelineError> {
        if let Some((index, outcome)) = self.failed_stage() {
            return Err(PipelineError::StageFailed {
                index: index + 1,
                stage: outcome.name().to_string(),
                error: outcome.error().unwrap_or_default().to_string(),
                elapsed: outcome.duration(),
            });
        }
        if self.outcomes.len() != self.stage_count {
            return Err(PipelineError::Incomplete {
                attempted: self.outcomes.len(),
                expected: self.stage_count,
            });
        }
        Ok(self)
    }
}

impl Serialize for PipelineResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PipelineResult", 4)?;
        s.serialize_field("stages", &self.outcomes)?;
        s.serialize_field("total_duration_seconds", &self.total_duration_seconds())?;
        s.serialize_field("overall_success", &self.overall_success())?;
        s.serialize_field("state", &self.state())?;
        s.end()
    }
}
