use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures raised by a `TextGenerationClient` implementation.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bedrock API error {status}{}: {message}", api_kind_suffix(.kind))]
    Api {
        status: u16,
        kind: Option<String>,
        message: String,
    },

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Free-form transport failure for clients that are not HTTP based.
    #[error("{0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn api_kind_suffix(kind: &Option<String>) -> String {
    kind.as_deref()
        .map(|k| format!(" ({k})"))
        .unwrap_or_default()
}

/// Failure of a single `Agent::run` call.
///
/// Transport and malformed-response failures from the client are folded into
/// this type at the agent boundary; nothing past the agent sees a
/// `ProviderError`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("{0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("timed out after {:.2}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("stage input is empty")]
    EmptyInput,
}

impl From<ProviderError> for AgentError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidResponse(msg) => AgentError::MalformedResponse(msg),
            other => AgentError::Transport(other.to_string()),
        }
    }
}

/// Problems with a pipeline definition or its configuration, detected
/// before any stage runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("stage name cannot be empty")]
    EmptyStageName,

    #[error("duplicate stage name '{0}'")]
    DuplicateStage(String),

    #[error("stage '{0}' has an empty prompt")]
    EmptyPrompt(String),

    #[error("no model configured for stage '{stage}' (set {env_var} or add `model` to the pipeline definition)")]
    MissingModel { stage: String, env_var: String },

    #[error("stage '{stage}' references '{reference}', which is not an earlier stage")]
    UnknownReference { stage: String, reference: String },

    #[error("stage '{stage}' has a malformed prompt template: {message}")]
    Template { stage: String, message: String },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// Raised by `PipelineResult::into_result` for callers that prefer to
/// propagate a stage failure with `?` instead of inspecting the result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("stage {index} ('{stage}') failed after {:.2}s: {error}", .elapsed.as_secs_f64())]
    StageFailed {
        index: usize,
        stage: String,
        error: String,
        elapsed: Duration,
    },

    #[error("pipeline stopped after {attempted} of {expected} stages")]
    Incomplete { attempted: usize, expected: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_kind_when_present() {
        let err = ProviderError::Api {
            status: 429,
            kind: Some("ThrottlingException".to_string()),
            message: "Too many requests".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Bedrock API error 429 (ThrottlingException): Too many requests"
        );

        let err = ProviderError::Api {
            status: 500,
            kind: None,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Bedrock API error 500: boom");
    }

    #[test]
    fn transport_message_passes_through_agent_boundary_verbatim() {
        let err: AgentError = ProviderError::Transport("quota exceeded".to_string()).into();
        assert_eq!(err, AgentError::Transport("quota exceeded".to_string()));
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn invalid_response_becomes_malformed() {
        let err: AgentError = ProviderError::InvalidResponse("no text".to_string()).into();
        assert!(matches!(err, AgentError::MalformedResponse(_)));
        assert_eq!(err.to_string(), "malformed response: no text");
    }

    #[test]
    fn missing_credentials_is_a_transport_failure() {
        let err: AgentError =
            ProviderError::MissingCredentials("AWS_BEARER_TOKEN_BEDROCK is not set".to_string())
                .into();
        match err {
            AgentError::Transport(msg) => assert!(msg.contains("AWS_BEARER_TOKEN_BEDROCK")),
            other => panic!("expected transport error, got: {other:?}"),
        }
    }

    #[test]
    fn stage_failed_display() {
        let err = PipelineError::StageFailed {
            index: 2,
            stage: "development".to_string(),
            error: "quota exceeded".to_string(),
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(
            err.to_string(),
            "stage 2 ('development') failed after 1.50s: quota exceeded"
        );
    }
}
