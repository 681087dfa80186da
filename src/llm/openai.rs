//! OpenAI-compatible chat-completions client

use super::TextGenerator;
use crate::config::{LlmEndpoint, ModelConfig};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use schemars::JsonSchema;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Maximum length for error content in error messages
const MAX_ERROR_CONTENT_LEN: usize = 200;

/// Sanitize a service response body before it ends up in an error message
fn sanitize_api_response(content: &str) -> String {
    const SECRET_PATTERNS: &[&str] = &[
        "api_key",
        "apikey",
        "secret",
        "password",
        "credential",
        "bearer",
        "sk-",
    ];

    let truncated = truncate_str(content, MAX_ERROR_CONTENT_LEN);

    let lower = truncated.to_lowercase();
    if SECRET_PATTERNS.iter().any(|pattern| lower.contains(pattern)) {
        return "(response details redacted - may contain sensitive data)".to_string();
    }

    truncated.to_string()
}

fn truncate_str(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// JSON schema sent as a structured-output `response_format`
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSchema {
    name: String,
    strict: bool,
    schema: serde_json::Value,
}

impl ResponseSchema {
    /// Derive the schema for `T` with schemars
    pub fn for_type<T: JsonSchema>(name: impl Into<String>) -> Result<Self> {
        let schema = schemars::schema_for!(T);
        Ok(Self {
            name: name.into(),
            strict: false,
            schema: serde_json::to_value(&schema)?,
        })
    }
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: &'a ResponseSchema,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat-completions client bound to one model
pub struct OpenAiChatClient {
    http: Client,
    url: String,
    endpoint: LlmEndpoint,
    model: ModelConfig,
    response_schema: Option<ResponseSchema>,
}

impl OpenAiChatClient {
    pub fn new(endpoint: LlmEndpoint, model: ModelConfig, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let url = endpoint.chat_completions_url();

        Ok(Self {
            http,
            url,
            endpoint,
            model,
            response_schema: None,
        })
    }

    /// Ask the service to constrain output to `schema`
    pub fn with_response_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    fn build_request<'a>(&'a self, system: &'a str, user: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_completion_tokens: self.model.max_tokens,
            temperature: self.model.temperature,
            response_format: self.response_schema.as_ref().map(|schema| ResponseFormat {
                format_type: "json_schema",
                json_schema: schema,
            }),
        }
    }
}

/// Pull the first choice's text out of a completion body
fn completion_text(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(Error::EmptyCompletion)
}

#[async_trait]
impl TextGenerator for OpenAiChatClient {
    async fn invoke(&self, system: &str, user: &str) -> Result<String> {
        let request = self.build_request(system, user);
        let start = Instant::now();

        tracing::debug!(
            model = %self.model.model,
            system_len = system.len(),
            user_len = user.len(),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(self.endpoint.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            tracing::error!(
                model = %self.model.model,
                status = status.as_u16(),
                duration_ms,
                "Chat completion request failed"
            );
            return Err(Error::Service {
                status: status.as_u16(),
                body: sanitize_api_response(&body),
            });
        }

        let content = completion_text(&body)?;
        tracing::debug!(
            model = %self.model.model,
            duration_ms,
            response_len = content.len(),
            "Chat completion received"
        );
        Ok(content)
    }

    fn model(&self) -> &str {
        &self.model.model
    }
}
