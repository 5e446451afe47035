use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque model identifier understood by the inference backend
/// (e.g. `anthropic.claude-3-haiku-20240307-v1:0` or an inference profile ARN).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn claude_3_sonnet() -> Self {
        Self::new("anthropic.claude-3-sonnet-20240229-v1:0")
    }

    pub fn claude_3_haiku() -> Self {
        Self::new("anthropic.claude-3-haiku-20240307-v1:0")
    }

    pub fn nova_lite() -> Self {
        Self::new("amazon.nova-lite-v1:0")
    }

    pub fn titan_text_express() -> Self {
        Self::new("amazon.titan-text-express-v1")
    }

    /// Provider family prefix, i.e. the part before the first dot
    /// (`anthropic`, `amazon`, `meta`, ...).
    pub fn family(&self) -> &str {
        let id = self.0.rsplit('/').next().unwrap_or(&self.0);
        // Cross-region inference profiles carry a geo prefix: `us.anthropic.claude-...`
        let mut parts = id.split('.');
        match (parts.next(), parts.next()) {
            (Some(first), Some(second)) if first.len() == 2 || first == "apac" => second,
            (Some(first), _) => first,
            _ => id,
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_of_foundation_model() {
        assert_eq!(ModelId::claude_3_haiku().family(), "anthropic");
        assert_eq!(ModelId::titan_text_express().family(), "amazon");
    }

    #[test]
    fn family_skips_inference_profile_geo_prefix() {
        let id = ModelId::new("us.anthropic.claude-3-5-sonnet-20240620-v1:0");
        assert_eq!(id.family(), "anthropic");

        let arn = ModelId::new(
            "arn:aws:bedrock:us-east-1:123456789012:inference-profile/eu.meta.llama3-2-1b-instruct-v1:0",
        );
        assert_eq!(arn.family(), "meta");
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&ModelId::nova_lite()).unwrap();
        assert_eq!(json, "\"amazon.nova-lite-v1:0\"");
    }
}
