use std::fmt;

use crate::errors::ProviderError;

/// Environment variable holding a Bedrock API key.
pub const BEDROCK_TOKEN_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// Source of the bearer credential attached to each inference request.
///
/// Implementations are consulted on every call, so rotating a token in the
/// environment takes effect without rebuilding the client.
pub trait CredentialsProvider: Send + Sync + fmt::Debug {
    /// `Ok(None)` means the request is sent without an `Authorization` header.
    fn bearer_token(&self) -> Result<Option<String>, ProviderError>;

    /// Short human-readable description for the configuration banner.
    fn describe(&self) -> String;
}

/// Reads the token from an environment variable at call time.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(BEDROCK_TOKEN_ENV)
    }
}

impl CredentialsProvider for EnvCredentials {
    fn bearer_token(&self) -> Result<Option<String>, ProviderError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
            _ => Err(ProviderError::MissingCredentials(format!(
                "{} is not set",
                self.var
            ))),
        }
    }

    fn describe(&self) -> String {
        format!("env:{}", self.var)
    }
}

/// A fixed token supplied by the caller.
#[derive(Clone)]
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl CredentialsProvider for StaticCredentials {
    fn bearer_token(&self) -> Result<Option<String>, ProviderError> {
        if self.token.is_empty() {
            return Err(ProviderError::MissingCredentials(
                "static token is empty".to_string(),
            ));
        }
        Ok(Some(self.token.clone()))
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// No authentication, for local gateways and proxies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialsProvider for NoCredentials {
    fn bearer_token(&self) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}
