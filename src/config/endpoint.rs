//! Chat-completions endpoint configuration
//!
//! Resolved from the environment in priority order:
//! 1. `OPENAI_API_KEY` - required
//! 2. `OPENAI_BASE_URL` - optional, any OpenAI-compatible service
//! 3. `CODEGEN_MODEL` / `GUARDRAIL_MODEL` - optional per-stage model overrides
//!
//! # Examples
//!
//! ```bash
//! export OPENAI_API_KEY="sk-..."
//! export OPENAI_BASE_URL="https://openrouter.ai/api/v1"
//! export GUARDRAIL_MODEL="gpt-5-mini"
//! ```

use crate::{Error, Result};
use secrecy::SecretString;
use url::Url;

/// Default base URL for the chat-completions service
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable names
pub mod env_vars {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
    pub const CODEGEN_MODEL: &str = "CODEGEN_MODEL";
    pub const GUARDRAIL_MODEL: &str = "GUARDRAIL_MODEL";
}

/// Where and how to reach the model service
#[derive(Debug, Clone)]
pub struct LlmEndpoint {
    pub base_url: Url,
    pub api_key: SecretString,
    /// Overrides the configured generation model
    pub generation_model: Option<String>,
    /// Overrides the configured repair model
    pub repair_model: Option<String>,
}

impl LlmEndpoint {
    /// Create endpoint config from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the endpoint through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = non_empty(env_vars::OPENAI_API_KEY).ok_or_else(|| {
            Error::Config(format!("{} is not set", env_vars::OPENAI_API_KEY))
        })?;

        let base_url = match non_empty(env_vars::OPENAI_BASE_URL) {
            Some(raw) => {
                tracing::debug!("Using OPENAI_BASE_URL for the model service");
                Url::parse(raw.trim()).map_err(|e| {
                    Error::Config(format!("invalid {}: {}", env_vars::OPENAI_BASE_URL, e))
                })?
            }
            None => Url::parse(DEFAULT_BASE_URL)
                .map_err(|e| Error::Config(format!("invalid default base URL: {}", e)))?,
        };

        let generation_model = non_empty(env_vars::CODEGEN_MODEL);
        if let Some(model) = &generation_model {
            tracing::info!(model = %model, "Generation model overridden from CODEGEN_MODEL");
        }
        let repair_model = non_empty(env_vars::GUARDRAIL_MODEL);
        if let Some(model) = &repair_model {
            tracing::info!(model = %model, "Repair model overridden from GUARDRAIL_MODEL");
        }

        Ok(Self {
            base_url,
            api_key: SecretString::from(api_key),
            generation_model,
            repair_model,
        })
    }

    /// Full URL of the chat-completions route
    pub fn chat_completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_api_key_is_required() {
        let err = LlmEndpoint::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = LlmEndpoint::from_lookup(lookup(&[(env_vars::OPENAI_API_KEY, "  ")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_defaults_to_openai() {
        let endpoint =
            LlmEndpoint::from_lookup(lookup(&[(env_vars::OPENAI_API_KEY, "sk-test")])).unwrap();

        assert_eq!(endpoint.api_key.expose_secret(), "sk-test");
        assert_eq!(
            endpoint.chat_completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert!(endpoint.generation_model.is_none());
        assert!(endpoint.repair_model.is_none());
    }

    #[test]
    fn test_custom_base_url_and_models() {
        let endpoint = LlmEndpoint::from_lookup(lookup(&[
            (env_vars::OPENAI_API_KEY, "sk-test"),
            (env_vars::OPENAI_BASE_URL, "https://openrouter.ai/api/v1/"),
            (env_vars::CODEGEN_MODEL, "gpt-4.1"),
            (env_vars::GUARDRAIL_MODEL, "gpt-5-mini"),
        ]))
        .unwrap();

        assert_eq!(
            endpoint.chat_completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(endpoint.generation_model.as_deref(), Some("gpt-4.1"));
        assert_eq!(endpoint.repair_model.as_deref(), Some("gpt-5-mini"));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = LlmEndpoint::from_lookup(lookup(&[
            (env_vars::OPENAI_API_KEY, "sk-test"),
            (env_vars::OPENAI_BASE_URL, "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let endpoint =
            LlmEndpoint::from_lookup(lookup(&[(env_vars::OPENAI_API_KEY, "sk-secret")])).unwrap();
        assert!(!format!("{:?}", endpoint).contains("sk-secret"));
    }
}
