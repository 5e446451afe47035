use std::sync::Arc;

use reqwest::{RequestBuilder, Response, Url};
use serde_json::Value;

use crate::api::{ConverseRequest, ConverseResponse, FoundationModel, ListFoundationModelsResponse};
use crate::config::{Endpoint, PipelineConfig, Timeouts};
use crate::credentials::CredentialsProvider;
use crate::errors::ProviderError;
use crate::types::ModelId;

use super::{ProviderHttpClient, TextGenerationClient};

const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Bedrock Runtime `Converse` over HTTPS with bearer authentication.
pub struct BedrockConverseClient {
    http: ProviderHttpClient,
    base: Url,
    credentials: Arc<dyn CredentialsProvider>,
}

impl BedrockConverseClient {
    pub fn new(
        endpoint: &Endpoint,
        credentials: Arc<dyn CredentialsProvider>,
        timeouts: &Timeouts,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            http: ProviderHttpClient::new(timeouts)?,
            base: parse_base(&endpoint.base_url())?,
            credentials,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, ProviderError> {
        Self::new(
            &config.endpoint,
            Arc::clone(&config.credentials),
            &config.timeouts,
        )
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// The model id stays a single path segment, so inference-profile ARNs
    /// keep their `/` encoded.
    pub fn converse_url(&self, model: &ModelId) -> Result<Url, ProviderError> {
        join_segments(&self.base, &["model", model.as_str(), "converse"])
    }
}

#[async_trait::async_trait]
impl TextGenerationClient for BedrockConverseClient {
    async fn converse(&self, req: &ConverseRequest) -> Result<ConverseResponse, ProviderError> {
        let url = self.converse_url(&req.model_id)?;
        log::debug!("POST {url}");

        let builder = self
            .http
            .client()
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(req);
        let res = authorize(builder, self.credentials.as_ref())?.send().await?;
        let body = success_body(res).await?;

        let response: ConverseResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::InvalidResponse(format!("could not decode Converse response: {e}"))
        })?;

        if let Some(usage) = response.usage {
            log::debug!(
                "{} usage: {} input / {} output tokens",
                req.model_id,
                usage.input_tokens,
                usage.output_tokens
            );
        }

        Ok(response)
    }

    fn name(&self) -> &str {
        "bedrock"
    }

    fn validate_config(&self) -> Result<(), ProviderError> {
        if !matches!(self.base.scheme(), "http" | "https") {
            return Err(ProviderError::Config(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.base
            )));
        }
        Ok(())
    }
}

/// Bedrock control plane, used to list the foundation models a region offers.
pub struct BedrockModelCatalog {
    http: ProviderHttpClient,
    base: Url,
    credentials: Arc<dyn CredentialsProvider>,
}

impl BedrockModelCatalog {
    pub fn new(
        endpoint: &Endpoint,
        credentials: Arc<dyn CredentialsProvider>,
        timeouts: &Timeouts,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            http: ProviderHttpClient::new(timeouts)?,
            base: parse_base(&endpoint.control_plane_url())?,
            credentials,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, ProviderError> {
        Self::new(
            &config.endpoint,
            Arc::clone(&config.credentials),
            &config.timeouts,
        )
    }

    pub fn list_url(&self) -> Result<Url, ProviderError> {
        join_segments(&self.base, &["foundation-models"])
    }

    pub async fn list_foundation_models(&self) -> Result<Vec<FoundationModel>, ProviderError> {
        let url = self.list_url()?;
        log::debug!("GET {url}");

        let builder = self
            .http
            .client()
            .get(url)
            .header("Accept", "application/json");
        let res = authorize(builder, self.credentials.as_ref())?.send().await?;
        let body = success_body(res).await?;

        let list: ListFoundationModelsResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::InvalidResponse(format!("could not decode model list: {e}"))
        })?;
        Ok(list.model_summaries)
    }
}

fn parse_base(raw: &str) -> Result<Url, ProviderError> {
    Url::parse(raw).map_err(|e| ProviderError::Config(format!("invalid endpoint '{raw}': {e}")))
}

/// `base` with each of `segments` appended as one percent-encoded segment.
fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, ProviderError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ProviderError::Config(format!("endpoint '{base}' cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn authorize(
    builder: RequestBuilder,
    credentials: &dyn CredentialsProvider,
) -> Result<RequestBuilder, ProviderError> {
    Ok(match credentials.bearer_token()? {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    })
}

/// Body of a 2xx response; anything else becomes `ProviderError::Api`.
async fn success_body(res: Response) -> Result<String, ProviderError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.text().await?);
    }

    let kind = res
        .headers()
        .get(ERROR_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_error_type);
    let err_text = res.text().await?;
    Err(ProviderError::Api {
        status: status.as_u16(),
        kind,
        message: error_message(&err_text),
    })
}

/// `ThrottlingException:http://internal.amazon.com/coral/...` -> `ThrottlingException`
fn parse_error_type(raw: &str) -> Option<String> {
    let kind = raw.split(':').next().unwrap_or(raw).trim();
    if kind.is_empty() {
        None
    } else {
        Some(kind.to_string())
    }
}

/// Pull the human-readable message out of an error body, falling back to
/// the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("Message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
