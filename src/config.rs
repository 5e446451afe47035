use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::api::InferenceConfig;
use crate::config_file::ConfigFile;
use crate::credentials::{BEDROCK_TOKEN_ENV, CredentialsProvider, EnvCredentials, NoCredentials};
use crate::errors::ConfigError;
use crate::types::ModelId;

pub const REGION_ENV: &str = "AWS_DEFAULT_REGION";
pub const ENDPOINT_ENV: &str = "BEDROCK_ENDPOINT_URL";
pub const MAX_TOKENS_ENV: &str = "AGENTCHAIN_MAX_TOKENS";
pub const TEMPERATURE_ENV: &str = "AGENTCHAIN_TEMPERATURE";
pub const REQUEST_TIMEOUT_ENV: &str = "AGENTCHAIN_REQUEST_TIMEOUT_SECS";
pub const CONNECT_TIMEOUT_ENV: &str = "AGENTCHAIN_CONNECT_TIMEOUT_SECS";
pub const STAGE_TIMEOUT_ENV: &str = "AGENTCHAIN_STAGE_TIMEOUT_SECS";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Where inference requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Public Bedrock Runtime endpoint of an AWS region
    Region(String),
    /// Explicit base URL (VPC endpoint, gateway, local proxy)
    Url(String),
}

impl Endpoint {
    pub fn base_url(&self) -> String {
        match self {
            Endpoint::Region(region) => format!("https://bedrock-runtime.{region}.amazonaws.com"),
            Endpoint::Url(url) => url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL of the Bedrock control plane (model catalog). An explicit
    /// URL serves both planes.
    pub fn control_plane_url(&self) -> String {
        match self {
            Endpoint::Region(region) => format!("https://bedrock.{region}.amazonaws.com"),
            Endpoint::Url(_) => self.base_url(),
        }
    }

    pub fn region(&self) -> Option<&str> {
        match self {
            Endpoint::Region(region) => Some(region),
            Endpoint::Url(_) => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Region(region) => write!(f, "region {region}"),
            Endpoint::Url(url) => write!(f, "{url}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Duration,
    pub connect: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            temperature: Some(DEFAULT_TEMPERATURE),
        }
    }
}

impl InferenceSettings {
    pub fn to_config(&self) -> Option<InferenceConfig> {
        if self.max_tokens.is_none() && self.temperature.is_none() {
            return None;
        }
        Some(InferenceConfig {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        })
    }
}

/// Resolved model id per stage name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageModels(BTreeMap<String, ModelId>);

impl StageModels {
    pub fn get(&self, stage: &str) -> Option<&ModelId> {
        self.0.get(stage)
    }

    pub fn insert(&mut self, stage: impl Into<String>, model: ModelId) {
        self.0.insert(stage.into(), model);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelId)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Default environment variable for a stage's model: `development` ->
/// `DEVELOPMENT_MODEL`, `unit tests` -> `UNIT_TESTS_MODEL`.
pub fn model_env_var(stage: &str) -> String {
    let mut var: String = stage
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    var.push_str("_MODEL");
    var
}

/// A stage whose model id has to be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSlot {
    pub stage: String,
    pub env_var: String,
    pub default: Option<ModelId>,
}

/// Missing optional configuration. Logged; never fails the run.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    DotenvUnavailable(String),
    RegionDefaulted {
        var: &'static str,
        region: String,
    },
    StageModelDefaulted {
        stage: String,
        env_var: String,
        model: ModelId,
    },
    /// `unauthenticated` is set when requests go out without an auth header;
    /// otherwise every call fails until `var` is set.
    CredentialsMissing {
        var: &'static str,
        unauthenticated: bool,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::DotenvUnavailable(reason) => {
                write!(f, "could not load .env file: {reason}")
            }
            ConfigWarning::RegionDefaulted { var, region } => {
                write!(f, "{var} is not set; using region {region}")
            }
            ConfigWarning::StageModelDefaulted {
                stage,
                env_var,
                model,
            } => write!(f, "{env_var} is not set; stage '{stage}' uses {model}"),
            ConfigWarning::CredentialsMissing {
                var,
                unauthenticated: true,
            } => write!(f, "{var} is not set; requests will be sent without credentials"),
            ConfigWarning::CredentialsMissing {
                var,
                unauthenticated: false,
            } => write!(f, "{var} is not set; Bedrock calls will fail until it is"),
        }
    }
}

impl ConfigWarning {
    pub fn log(&self) {
        match self {
            // Falling back to a definition default is the normal case.
            ConfigWarning::StageModelDefaulted { .. } => log::info!("{self}"),
            _ => log::warn!("{self}"),
        }
    }
}

/// The explicit runtime configuration, built once and handed to client
/// construction and stage building.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub endpoint: Endpoint,
    pub stage_models: StageModels,
    pub credentials: Arc<dyn CredentialsProvider>,
    pub timeouts: Timeouts,
    pub inference: InferenceSettings,
    pub stage_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: PipelineConfig,
    pub warnings: Vec<ConfigWarning>,
}

impl PipelineConfig {
    pub fn new(endpoint: Endpoint, credentials: Arc<dyn CredentialsProvider>) -> Self {
        Self {
            endpoint,
            stage_models: StageModels::default(),
            credentials,
            timeouts: Timeouts::default(),
            inference: InferenceSettings::default(),
            stage_timeout: None,
        }
    }

    pub fn with_stage_model(mut self, stage: impl Into<String>, model: ModelId) -> Self {
        self.stage_models.insert(stage, model);
        self
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    pub fn model_for(&self, stage: &str) -> Option<&ModelId> {
        self.stage_models.get(stage)
    }

    /// Resolve from the process environment and `file`.
    pub fn load(file: &ConfigFile, slots: &[ModelSlot]) -> Result<ResolvedConfig, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok(), file, slots)
    }

    /// Resolve with an explicit variable lookup.
    ///
    /// Precedence per setting: variable, then `file`, then the slot or
    /// built-in default. Blank variables count as unset.
    pub fn resolve<F>(
        lookup: F,
        file: &ConfigFile,
        slots: &[ModelSlot],
    ) -> Result<ResolvedConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut warnings = Vec::new();

        let endpoint = if let Some(url) = var(ENDPOINT_ENV).or_else(|| file.endpoint_url.clone()) {
            Endpoint::Url(url)
        } else if let Some(region) = var(REGION_ENV).or_else(|| file.region.clone()) {
            Endpoint::Region(region)
        } else {
            warnings.push(ConfigWarning::RegionDefaulted {
                var: REGION_ENV,
                region: DEFAULT_REGION.to_string(),
            });
            Endpoint::Region(DEFAULT_REGION.to_string())
        };

        let credentials: Arc<dyn CredentialsProvider> = if var(BEDROCK_TOKEN_ENV).is_some() {
            Arc::new(EnvCredentials::default())
        } else {
            warnings.push(ConfigWarning::CredentialsMissing {
                var: BEDROCK_TOKEN_ENV,
                unauthenticated: matches!(endpoint, Endpoint::Url(_)),
            });
            match endpoint {
                Endpoint::Url(_) => Arc::new(NoCredentials),
                // Keep the env provider so the failure names the variable.
                Endpoint::Region(_) => Arc::new(EnvCredentials::default()),
            }
        };

        let mut stage_models = StageModels::default();
        for slot in slots {
            let model = if let Some(model) = var(slot.env_var.as_str()) {
                ModelId::new(model)
            } else if let Some(model) = file.model_for(&slot.stage) {
                ModelId::new(model)
            } else if let Some(model) = &slot.default {
                warnings.push(ConfigWarning::StageModelDefaulted {
                    stage: slot.stage.clone(),
                    env_var: slot.env_var.clone(),
                    model: model.clone(),
                });
                model.clone()
            } else {
                return Err(ConfigError::MissingModel {
                    stage: slot.stage.clone(),
                    env_var: slot.env_var.clone(),
                });
            };
            stage_models.insert(slot.stage.clone(), model);
        }

        let max_tokens = parse_var::<u32>(&var, MAX_TOKENS_ENV)?
            .or(file.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(invalid(MAX_TOKENS_ENV, max_tokens));
        }

        let temperature = parse_var::<f32>(&var, TEMPERATURE_ENV)?
            .or(file.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=1.0).contains(&temperature) {
            return Err(invalid(TEMPERATURE_ENV, temperature));
        }

        let request_secs = parse_var::<u64>(&var, REQUEST_TIMEOUT_ENV)?
            .or(file.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        let connect_secs = parse_var::<u64>(&var, CONNECT_TIMEOUT_ENV)?
            .or(file.connect_timeout_secs)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        if request_secs == 0 {
            return Err(invalid(REQUEST_TIMEOUT_ENV, request_secs));
        }
        if connect_secs == 0 {
            return Err(invalid(CONNECT_TIMEOUT_ENV, connect_secs));
        }

        let stage_timeout = match parse_var::<u64>(&var, STAGE_TIMEOUT_ENV)?.or(file.stage_timeout_secs) {
            Some(0) => return Err(invalid(STAGE_TIMEOUT_ENV, 0)),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        let config = PipelineConfig {
            endpoint,
            stage_models,
            credentials,
            timeouts: Timeouts {
                request: Duration::from_secs(request_secs),
                connect: Duration::from_secs(connect_secs),
            },
            inference: InferenceSettings {
                max_tokens: Some(max_tokens),
                temperature: Some(temperature),
            },
            stage_timeout,
        };

        Ok(ResolvedConfig { config, warnings })
    }
}

fn parse_var<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match var(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}

fn invalid(key: &str, value: impl fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
