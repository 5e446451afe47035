use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

pub const CONFIG_FILE_PATH: &str = ".agentchain/config.json";

/// Optional settings read from `.agentchain/config.json`.
///
/// Every field is optional; environment variables take precedence over
/// anything set here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// AWS region used to derive the Bedrock Runtime endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Full endpoint URL (overrides `region`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,

    /// Model id per stage name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,

    /// Deadline for a single stage, including its inference call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Load `.agentchain/config.json` relative to the working directory.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: PathBuf::from(path),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from(path),
            message: e.to_string(),
        })
    }

    pub fn model_for(&self, stage: &str) -> Option<&str> {
        self.models.get(stage).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = ConfigFile::load_from(&tmp.path().join("config.json")).unwrap();
        assert_eq!(cfg, ConfigFile::default());
    }

    #[test]
    fn parses_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
  "region": "eu-west-1",
  "models": { "testing": "amazon.nova-pro-v1:0" },
  "stage_timeout_secs": 90
}"#,
        )
        .unwrap();

        let cfg = ConfigFile::load_from(&path).unwrap();
        assert_eq!(cfg.region.as_deref(), Some("eu-west-1"));
        assert_eq!(cfg.model_for("testing"), Some("amazon.nova-pro-v1:0"));
        assert_eq!(cfg.model_for("architecture"), None);
        assert_eq!(cfg.stage_timeout_secs, Some(90));
        assert_eq!(cfg.max_tokens, None);
    }

    #[test]
    fn malformed_file_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        match ConfigFile::load_from(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got: {other:?}"),
        }
    }
}
