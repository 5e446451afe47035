use std::sync::{Mutex, OnceLock};

use tempfile::TempDir;

use agentchain::config::{ConfigWarning, Endpoint, PipelineConfig};
use agentchain::config_file::ConfigFile;
use agentchain::{ModelId, PipelineDefinition};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const VARS: [&str; 8] = [
    "AWS_DEFAULT_REGION",
    "BEDROCK_ENDPOINT_URL",
    "AWS_BEARER_TOKEN_BEDROCK",
    "ARCHITECTURE_MODEL",
    "DEVELOPMENT_MODEL",
    "TESTING_MODEL",
    "DOCUMENTATION_MODEL",
    "AGENTCHAIN_STAGE_TIMEOUT_SECS",
];

struct EnvGuard {
    _lock: std::sync::MutexGuard<'static, ()>,
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    fn clear() -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let saved = VARS.iter().map(|v| (*v, std::env::var(v).ok())).collect();

        // SAFETY: env mutation is guarded by ENV_LOCK, ensuring exclusive access.
        unsafe {
            for var in VARS {
                std::env::remove_var(var);
            }
        }

        Self { _lock: lock, saved }
    }

    fn set(&self, var: &str, value: &str) {
        // SAFETY: env mutation is guarded by ENV_LOCK, ensuring exclusive access.
        unsafe {
            std::env::set_var(var, value);
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: env mutation is guarded by ENV_LOCK, ensuring exclusive access.
        unsafe {
            for (var, value) in &self.saved {
                match value {
                    Some(v) => std::env::set_var(var, v),
                    None => std::env::remove_var(var),
                }
            }
        }
    }
}

fn write_config(dir: &TempDir, json: &str) -> ConfigFile {
    let path = dir.path().join(".agentchain").join("config.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, json).unwrap();
    ConfigFile::load_from(&path).unwrap()
}

#[test]
fn built_in_defaults_apply_with_empty_environment() {
    let _env = EnvGuard::clear();
    let definition = PipelineDefinition::game_development();

    let resolved = PipelineConfig::load(&ConfigFile::default(), &definition.model_slots()).unwrap();
    let config = resolved.config;

    assert_eq!(config.endpoint, Endpoint::Region("us-east-1".to_string()));
    assert_eq!(config.model_for("architecture"), Some(&ModelId::claude_3_sonnet()));
    assert_eq!(config.model_for("development"), Some(&ModelId::claude_3_haiku()));
    assert_eq!(config.model_for("testing"), Some(&ModelId::nova_lite()));
    assert_eq!(config.model_for("documentation"), Some(&ModelId::titan_text_express()));

    let defaulted = resolved
        .warnings
        .iter()
        .filter(|w| matches!(w, ConfigWarning::StageModelDefaulted { .. }))
        .count();
    assert_eq!(defaulted, 4);
    assert!(resolved
        .warnings
        .iter()
        .any(|w| matches!(w, ConfigWarning::CredentialsMissing { .. })));
}

#[test]
fn environment_overrides_config_file() {
    let env = EnvGuard::clear();
    let tmp = TempDir::new().unwrap();
    let file = write_config(
        &tmp,
        r#"{
  "region": "eu-west-1",
  "models": {
    "architecture": "file-architecture",
    "testing": "file-testing"
  },
  "stage_timeout_secs": 30
}"#,
    );

    env.set("ARCHITECTURE_MODEL", "env-architecture");
    env.set("AWS_BEARER_TOKEN_BEDROCK", "ABSKexampleexampleexample");
    env.set("AGENTCHAIN_STAGE_TIMEOUT_SECS", "90");

    let definition = PipelineDefinition::game_development();
    let resolved = PipelineConfig::load(&file, &definition.model_slots()).unwrap();
    let config = resolved.config;

    assert_eq!(config.endpoint, Endpoint::Region("eu-west-1".to_string()));
    assert_eq!(config.model_for("architecture").unwrap().as_str(), "env-architecture");
    assert_eq!(config.model_for("testing").unwrap().as_str(), "file-testing");
    assert_eq!(config.model_for("development"), Some(&ModelId::claude_3_haiku()));
    assert_eq!(config.stage_timeout, Some(std::time::Duration::from_secs(90)));
    assert_eq!(
        config.credentials.bearer_token().unwrap().as_deref(),
        Some("ABSKexampleexampleexample")
    );
    assert!(!resolved
        .warnings
        .iter()
        .any(|w| matches!(w, ConfigWarning::RegionDefaulted { .. } | ConfigWarning::CredentialsMissing { .. })));
}

#[test]
fn endpoint_url_from_environment_wins() {
    let env = EnvGuard::clear();
    env.set("BEDROCK_ENDPOINT_URL", "http://127.0.0.1:9000/");
    env.set("AWS_DEFAULT_REGION", "us-west-2");

    let resolved = PipelineConfig::load(&ConfigFile::default(), &[]).unwrap();

    assert_eq!(resolved.config.endpoint.base_url(), "http://127.0.0.1:9000");
    assert_eq!(resolved.config.endpoint.region(), None);
    assert_eq!(resolved.config.credentials.bearer_token().unwrap(), None);
}
