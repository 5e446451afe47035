use std::sync::Arc;

use crate::api::{ConverseRequest, InferenceConfig, SystemBlock};
use crate::errors::AgentError;
use crate::providers::TextGenerationClient;
use crate::types::ModelId;

/// A text-generation client bound to one model and an optional system
/// instruction.
///
/// Each `run` is a single-turn request; the agent keeps no history between
/// calls, so one instance can be reused across pipeline runs.
#[derive(Clone)]
pub struct Agent {
    client: Arc<dyn TextGenerationClient>,
    model: ModelId,
    system_prompt: Option<String>,
    inference: Option<InferenceConfig>,
}

impl Agent {
    pub fn new(client: Arc<dyn TextGenerationClient>, model: ModelId) -> Self {
        Self {
            client,
            model,
            system_prompt: None,
            inference: None,
        }
    }

    /// An empty instruction is treated as no instruction.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = if prompt.trim().is_empty() {
            None
        } else {
            Some(prompt)
        };
        self
    }

    pub fn with_inference(mut self, inference: Option<InferenceConfig>) -> Self {
        self.inference = inference;
        self
    }

    pub fn model(&self) -> &ModelId {
        &self.model
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn request_for(&self, input: &str) -> ConverseRequest {
        let mut req = ConverseRequest::new(self.model.clone(), input);
        if let Some(prompt) = &self.system_prompt {
            req.system.push(SystemBlock {
                text: prompt.clone(),
            });
        }
        req.inference_config = self.inference.clone();
        req
    }

    /// Send `input` and return the first text segment of the reply verbatim.
    pub async fn run(&self, input: &str) -> Result<String, AgentError> {
        if input.trim().is_empty() {
            return Err(AgentError::EmptyInput);
        }

        let req = self.request_for(input);
        log::debug!(
            "{} request to {} ({} chars)",
            self.client.name(),
            self.model,
            input.len()
        );

        let response = self.client.converse(&req).await?;

        match response.first_text() {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            Some(_) => Err(AgentError::MalformedResponse(format!(
                "{} returned empty text",
                self.model
            ))),
            None => Err(AgentError::MalformedResponse(format!(
                "{} returned no text content",
                self.model
            ))),
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("client", &self.client.name())
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("inference", &self.inference)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ConverseOutput, ConverseResponse};
    use crate::errors::ProviderError;
    use std::sync::Mutex;

    struct FixedClient {
        reply: Mutex<Option<Result<ConverseResponse, ProviderError>>>,
        seen: Mutex<Vec<ConverseRequest>>,
    }

    impl FixedClient {
        fn new(reply: Result<ConverseResponse, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl TextGenerationClient for FixedClient {
        async fn converse(&self, req: &ConverseRequest) -> Result<ConverseResponse, ProviderError> {
            self.seen.lock().unwrap().push(req.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(ProviderError::Transport("called twice".to_string())))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn returns_text_verbatim() {
        let client = FixedClient::new(Ok(ConverseResponse::from_text("  padded output\n")));
        let agent = Agent::new(client.clone(), ModelId::claude_3_haiku())
            .with_system_prompt("You are an expert Python developer.");

        let out = agent.run("write code").await.unwrap();
        assert_eq!(out, "  padded output\n");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model_id, ModelId::claude_3_haiku());
        assert_eq!(seen[0].user_text(), Some("write code"));
        assert_eq!(
            seen[0].system_text(),
            Some("You are an expert Python developer.")
        );
    }

    #[tokio::test]
    async fn no_system_block_without_prompt() {
        let client = FixedClient::new(Ok(ConverseResponse::from_text("ok")));
        let agent = Agent::new(client.clone(), ModelId::titan_text_express()).with_system_prompt("  ");

        assert_eq!(agent.system_prompt(), None);
        agent.run("document this").await.unwrap();
        assert!(client.seen.lock().unwrap()[0].system.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_carries_message() {
        let client = FixedClient::new(Err(ProviderError::Transport("quota exceeded".to_string())));
        let agent = Agent::new(client, ModelId::nova_lite());

        let err = agent.run("hello").await.unwrap_err();
        assert_eq!(err, AgentError::Transport("quota exceeded".to_string()));
    }

    #[tokio::test]
    async fn missing_text_is_malformed() {
        let client = FixedClient::new(Ok(ConverseResponse {
            output: ConverseOutput { message: None },
            stop_reason: None,
            usage: None,
        }));
        let agent = Agent::new(client, ModelId::nova_lite());

        let err = agent.run("hello").await.unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn empty_text_is_malformed() {
        let client = FixedClient::new(Ok(ConverseResponse::from_text("")));
        let agent = Agent::new(client, ModelId::nova_lite());

        let err = agent.run("hello").await.unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn empty_input_never_reaches_client() {
        let client = FixedClient::new(Ok(ConverseResponse::from_text("unused")));
        let agent = Agent::new(client.clone(), ModelId::nova_lite());

        assert_eq!(agent.run(" \n").await.unwrap_err(), AgentError::EmptyInput);
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn request_carries_inference_config() {
        let client = FixedClient::new(Ok(ConverseResponse::from_text("unused")));
        let agent = Agent::new(client, ModelId::nova_lite()).with_inference(Some(InferenceConfig {
            max_tokens: Some(256),
            temperature: Some(0.5),
        }));

        let req = agent.request_for("hi");
        assert_eq!(
            req.inference_config.and_then(|c| c.max_tokens),
            Some(256)
        );
    }
}
