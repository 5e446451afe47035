use std::sync::Arc;

pub mod bedrock;

use crate::api::{ConverseRequest, ConverseResponse};
use crate::config::{PipelineConfig, Timeouts};
use crate::errors::ProviderError;
use reqwest::Client;

pub(crate) struct ProviderHttpClient {
    client: Client,
}

impl ProviderHttpClient {
    pub fn new(timeouts: &Timeouts) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .build()?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// The remote text-generation capability an `Agent` delegates to.
///
/// One call is one single-turn request. Implementations report every
/// failure (network, auth, quota, unavailable model, undecodable body)
/// as a `ProviderError`; they never retry.
#[async_trait::async_trait]
pub trait TextGenerationClient: Send + Sync {
    /// Send a single-turn request and return the raw response.
    async fn converse(&self, req: &ConverseRequest) -> Result<ConverseResponse, ProviderError>;

    /// Get the name of this client
    fn name(&self) -> &str;

    /// Validate that this client is properly configured
    fn validate_config(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Build the inference client described by `config`.
pub fn create_client(
    config: &PipelineConfig,
) -> Result<Arc<dyn TextGenerationClient>, ProviderError> {
    let client = bedrock::BedrockConverseClient::from_config(config)?;
    client.validate_config()?;
    log::debug!(
        "created {} client for {} (credentials: {})",
        client.name(),
        client.base_url(),
        config.credentials.describe()
    );
    Ok(Arc::new(client))
}
