//! Wire types for the Bedrock Converse API.
//!
//! Only the text subset of the schema is modelled. Unknown content block
//! kinds (images, tool use, reasoning) deserialize to blocks without text.

use serde::{Deserialize, Serialize};

use crate::types::ModelId;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// First content block carrying text, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| block.text.as_deref())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ContentBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SystemBlock {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A single-turn Converse request. The model id travels in the URL path,
/// so it is skipped when serializing the body.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    #[serde(skip)]
    pub model_id: ModelId,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub system: Vec<SystemBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_config: Option<InferenceConfig>,
}

impl ConverseRequest {
    pub fn new(model_id: ModelId, user_text: impl Into<String>) -> Self {
        Self {
            model_id,
            messages: vec![Message::user(user_text)],
            system: Vec::new(),
            inference_config: None,
        }
    }

    /// Text of the (single) user message.
    pub fn user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .and_then(Message::first_text)
    }

    pub fn system_text(&self) -> Option<&str> {
        self.system.first().map(|s| s.text.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    #[serde(default)]
    pub output: ConverseOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ConverseOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl ConverseResponse {
    /// Response whose single assistant message holds `text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            output: ConverseOutput {
                message: Some(Message::assistant(text)),
            },
            stop_reason: Some("end_turn".to_string()),
            usage: None,
        }
    }

    /// First text segment of the response message.
    pub fn first_text(&self) -> Option<&str> {
        self.output.message.as_ref().and_then(Message::first_text)
    }
}

/// One entry of the control-plane `ListFoundationModels` response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FoundationModel {
    pub model_id: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_modalities: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListFoundationModelsResponse {
    #[serde(default)]
    pub model_summaries: Vec<FoundationModel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_omits_model_and_empty_system() {
        let req = ConverseRequest::new(ModelId::titan_text_express(), "hello");
        let body = serde_json::to_value(&req).expect("serialize ConverseRequest");

        assert_eq!(
            body,
            json!({
                "messages": [{"role": "user", "content": [{"text": "hello"}]}]
            })
        );
    }

    #[test]
    fn request_body_includes_system_and_inference_config() {
        let mut req = ConverseRequest::new(ModelId::claude_3_haiku(), "write code");
        req.system.push(SystemBlock {
            text: "You are a Python developer.".to_string(),
        });
        req.inference_config = Some(InferenceConfig {
            max_tokens: Some(4000),
            temperature: Some(0.5),
        });

        let body = serde_json::to_value(&req).expect("serialize ConverseRequest");
        assert_eq!(body["system"][0]["text"], "You are a Python developer.");
        assert_eq!(body["inferenceConfig"]["maxTokens"], 4000);
        assert_eq!(body["inferenceConfig"]["temperature"], 0.5);
        assert!(body.get("modelId").is_none());
        assert_eq!(req.user_text(), Some("write code"));
        assert_eq!(req.system_text(), Some("You are a Python developer."));
    }

    #[test]
    fn response_first_text_skips_non_text_blocks() {
        let response: ConverseResponse = serde_json::from_value(json!({
            "output": {
                "message": {
                    "role": "assistant",
                    "content": [
                        {"reasoningContent": {"reasoningText": {"text": "thinking"}}},
                        {"text": "final answer"},
                        {"text": "trailing"}
                    ]
                }
            },
            "stopReason": "end_turn",
            "usage": {"inputTokens": 12, "outputTokens": 3, "totalTokens": 15}
        }))
        .expect("deserialize ConverseResponse");

        assert_eq!(response.first_text(), Some("final answer"));
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(15));
    }

    #[test]
    fn response_without_message_has_no_text() {
        let response: ConverseResponse =
            serde_json::from_value(json!({"output": {}})).expect("deserialize ConverseResponse");
        assert_eq!(response.first_text(), None);
    }
}
