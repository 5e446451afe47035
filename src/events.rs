use std::collections::HashMap;
use std::time::Duration;

use crate::pipeline::{PipelineState, StageState};

/// Lifecycle events fired by the pipeline orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// Run started - request available
    PipelineStart,
    /// Stage about to call its agent
    StageStart,
    /// Stage produced output
    StageSuccess,
    /// Stage failed - remaining stages are skipped
    StageFailure,
    /// Run finished, completed or aborted
    PipelineEnd,
}

impl Event {
    /// Get human-readable name for event
    pub fn name(&self) -> &'static str {
        match self {
            Event::PipelineStart => "PipelineStart",
            Event::StageStart => "StageStart",
            Event::StageSuccess => "StageSuccess",
            Event::StageFailure => "StageFailure",
            Event::PipelineEnd => "PipelineEnd",
        }
    }
}

/// Context data that flows through events
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    /// Seed request of the run
    pub request: Option<String>,
    /// 1-based position of the stage
    pub stage_index: Option<usize>,
    pub stage_count: Option<usize>,
    pub stage_name: Option<String>,
    pub description: Option<String>,
    pub model: Option<String>,
    pub stage_state: Option<StageState>,
    pub pipeline_state: Option<PipelineState>,
    /// Stage duration, or total duration for `PipelineEnd`
    pub duration: Option<Duration>,
    pub output: Option<String>,
    pub error: Option<String>,
}

impl EventContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.request = Some(request.into());
        self
    }

    /// Set the 1-based stage position and total count
    pub fn with_stage(mut self, index: usize, count: usize, name: impl Into<String>) -> Self {
        self.stage_index = Some(index);
        self.stage_count = Some(count);
        self.stage_name = Some(name.into());
        self
    }

    pub fn with_stage_count(mut self, count: usize) -> Self {
        self.stage_count = Some(count);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_stage_state(mut self, state: StageState) -> Self {
        self.stage_state = Some(state);
        self
    }

    pub fn with_pipeline_state(mut self, state: PipelineState) -> Self {
        self.pipeline_state = Some(state);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Handler for events - will be called when events fire
pub type EventHandler = Box<dyn Fn(Event, &EventContext) + Send + Sync>;

/// Manager for dispatching events
#[derive(Default)]
pub struct EventManager {
    handlers: HashMap<Event, Vec<EventHandler>>,
}

impl EventManager {
    /// Create a new event manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event
    pub fn on<F>(&mut self, event: Event, handler: F)
    where
        F: Fn(Event, &EventContext) + Send + Sync + 'static,
    {
        self.handlers
            .entry(event)
            .or_default()
            .push(Box::new(handler));
    }

    /// Fire an event and call all registered handlers
    pub fn fire(&self, event: Event, context: &EventContext) {
        if let Some(handlers) = self.handlers.get(&event) {
            for handler in handlers {
                handler(event, context);
            }
        }
    }

    pub fn has_handlers(&self, event: Event) -> bool {
        self.handlers.get(&event).is_some_and(|h| !h.is_empty())
    }

    /// Clear all handlers for an event
    pub fn clear(&mut self, event: Event) {
        self.handlers.remove(&event);
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut events: Vec<&str> = self.handlers.keys().map(Event::name).collect();
        events.sort_unstable();
        f.debug_struct("EventManager")
            .field("events", &events)
            .finish()
    }
}
