//! Configuration for the code generation agent

pub mod endpoint;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use endpoint::LlmEndpoint;

/// Default number of history entries kept (five exchanges)
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Settings for one model call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier sent to the service
    pub model: String,
    /// Upper bound on completion tokens
    pub max_tokens: u32,
    /// Sampling temperature; reasoning models reject it, so it is optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ModelConfig {
    fn generation() -> Self {
        Self {
            model: "o4-mini".to_string(),
            max_tokens: 16_000,
            temperature: None,
        }
    }

    fn repair() -> Self {
        Self {
            model: "gpt-5".to_string(),
            max_tokens: 16_000,
            temperature: None,
        }
    }
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_request_timeout_secs() -> u64 {
    180
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model used to draft the strategy code
    pub generation: ModelConfig,
    /// Model used by the guardrail repair stage
    pub repair: ModelConfig,
    /// Conversation entries kept for conversational runs
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Per-request HTTP timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Send a JSON schema `response_format` with both calls
    #[serde(default)]
    pub structured_output: bool,
    /// Directory holding reference docs; the bundled Kadena set when unset
    #[serde(default)]
    pub reference_dir: Option<PathBuf>,
    /// Path to audit log file
    #[serde(default)]
    pub audit_log_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation: ModelConfig::generation(),
            repair: ModelConfig::repair(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            request_timeout_secs: default_request_timeout_secs(),
            structured_output: false,
            reference_dir: None,
            audit_log_path: Some("audit.jsonl".to_string()),
        }
    }
}

impl Config {
    /// Load from a JSON file, or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (stage, model) in [("generation", &self.generation), ("repair", &self.repair)] {
            if model.model.trim().is_empty() {
                return Err(Error::Config(format!("{} model name is empty", stage)));
            }
            if model.max_tokens == 0 {
                return Err(Error::Config(format!("{} max_tokens must be positive", stage)));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Apply model overrides carried by the endpoint
    pub fn apply_endpoint_overrides(&mut self, endpoint: &LlmEndpoint) {
        if let Some(model) = &endpoint.generation_model {
            self.generation.model = model.clone();
        }
        if let Some(model) = &endpoint.repair_model {
            self.repair.model = model.clone();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use url::Url;

    #[test]
    fn config_deserialize_defaults() {
        let value = serde_json::json!({
            "generation": { "model": "o4-mini", "max_tokens": 8000 },
            "repair": { "model": "gpt-5", "max_tokens": 8000, "temperature": 0.2 }
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(parsed.request_timeout_secs, 180);
        assert!(!parsed.structured_output);
        assert!(parsed.audit_log_path.is_none());
        assert_eq!(parsed.generation.temperature, None);
        assert_eq!(parsed.repair.temperature, Some(0.2));
    }

    #[test]
    fn config_default_models() {
        let config = Config::default();
        assert_eq!(config.generation.model, "o4-mini");
        assert_eq!(config.repair.model, "gpt-5");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "generation": {{ "model": "gpt-4.1", "max_tokens": 4000 }},
                "repair": {{ "model": "gpt-5", "max_tokens": 4000 }},
                "history_capacity": 4,
                "structured_output": true
            }}"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.generation.model, "gpt-4.1");
        assert_eq!(config.history_capacity, 4);
        assert!(config.structured_output);
    }

    #[test]
    fn config_load_rejects_bad_values() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "generation": {{ "model": "", "max_tokens": 4000 }},
                "repair": {{ "model": "gpt-5", "max_tokens": 4000 }}
            }}"#
        )
        .unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn config_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/agent-coder.json"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn config_endpoint_overrides() {
        let mut config = Config::default();
        let endpoint = LlmEndpoint {
            base_url: Url::parse("https://api.openai.com/v1").unwrap(),
            api_key: SecretString::from("sk-test".to_string()),
            generation_model: None,
            repair_model: Some("gpt-5-mini".to_string()),
        };

        config.apply_endpoint_overrides(&endpoint);
        assert_eq!(config.generation.model, "o4-mini");
        assert_eq!(config.repair.model, "gpt-5-mini");
    }
}
