//! OpenAI-compatible chat completion provider.
//!
//! Talks to `POST {base_url}/chat/completions`. Any server that speaks the
//! same wire format (Azure deployments, local gateways) works by changing
//! `base_url`.
//!
//! ## Security
//!
//! The API key is held in an [`ApiCredential`] and only exposed when the
//! `Authorization` header is set. Provider error bodies are redacted before
//! they are logged or embedded in an error.

use super::{
    factory::ProviderFactory,
    secrets::{ApiCredential, CredentialLookup, CredentialSource},
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ResponseFormat, Usage,
};
use async_trait::async_trait;
use formcheck_core::log_snippet;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable name for the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat completion provider.
pub struct OpenAiProvider {
    credential: ApiCredential,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a provider from an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_credential(ApiCredential::new(api_key, CredentialSource::Programmatic))
    }

    /// Create a provider from an already-loaded credential.
    pub fn with_credential(credential: ApiCredential) -> Self {
        Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from environment variable.
    pub fn from_env() -> Result<Self, ProviderError> {
        let credential = CredentialLookup::env(OPENAI_API_KEY_ENV).resolve()?;
        Ok(Self::with_credential(credential))
    }

    /// Create from JSON options.
    ///
    /// Credential resolution follows [`CredentialLookup::from_options`];
    /// `base_url` overrides the endpoint.
    pub fn from_config(options: &JsonValue) -> Result<Self, ProviderError> {
        let credential = CredentialLookup::from_options(options, OPENAI_API_KEY_ENV).resolve()?;

        let base_url = options["base_url"].as_str().unwrap_or(DEFAULT_BASE_URL);

        Ok(Self::with_credential(credential).with_base_url(base_url))
    }

    /// Set custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Chat completion request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    response_format: JsonValue,
}

fn response_format_body(format: &ResponseFormat) -> JsonValue {
    match format {
        ResponseFormat::JsonObject => serde_json::json!({ "type": "json_object" }),
        ResponseFormat::JsonSchema { name, schema } => serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": name,
                "strict": true,
                "schema": schema,
            }
        }),
    }
}

/// Chat completion response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Pull a readable message out of an error body, redacted.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => log_snippet(&parsed.error.message),
        Err(_) => log_snippet(body),
    }
}

fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        if self.credential.is_blank() {
            return Err(ProviderError::NotConfigured(format!(
                "OpenAI API key from {:?} source is empty",
                self.credential.source()
            )));
        }

        let request = ChatRequest {
            model: &config.model,
            messages: &messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            response_format: response_format_body(&config.response_format),
        };

        // Only expose the credential here, at the point of use
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.credential.expose())
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::TimedOut(config.timeout)
                } else {
                    ProviderError::Transport(log_snippet(&e.to_string()))
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::TimedOut(config.timeout)
            } else {
                ProviderError::Transport(log_snippet(&e.to_string()))
            }
        })?;
        let malformed = |reason: String| ProviderError::MalformedReply {
            reason,
            raw: log_snippet(&text),
        };

        let body: ChatResponse =
            serde_json::from_str(&text).map_err(|e| malformed(e.to_string()))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| malformed("completion has no choices".to_string()))?;

        if let Some(refusal) = choice.message.refusal.filter(|r| !r.is_empty()) {
            return Err(malformed(format!("model refused: {}", log_snippet(&refusal))));
        }

        let content = choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| malformed("completion has no content".to_string()))?;

        let usage = body
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            usage,
            model: body.model,
            finish_reason: choice.finish_reason,
        })
    }

    async fn health_check(&self) -> bool {
        !self.credential.is_blank()
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Factory for creating OpenAI providers from configuration.
///
/// ## Configuration Format
/// ```json
/// {
///   "api_key": "sk-...",                    // Optional
///   "api_key_file": "/run/secrets/openai",  // Optional
///   "api_key_env": "OPENAI_API_KEY",        // Optional, env var to read
///   "base_url": "https://api.openai.com/v1" // Optional
/// }
/// ```
pub struct OpenAiProviderFactory;

impl ProviderFactory for OpenAiProviderFactory {
    fn kind(&self) -> &'static str {
        "openai"
    }

    fn build(&self, options: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.check(options)?;
        Ok(Arc::new(OpenAiProvider::from_config(options)?))
    }

    fn check(&self, options: &JsonValue) -> Result<(), ProviderError> {
        if let Some(url) = options["base_url"].as_str() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ProviderError::NotConfigured(format!(
                    "base_url '{}' is not an http(s) URL",
                    url
                )));
            }
        }

        let lookup = CredentialLookup::from_options(options, OPENAI_API_KEY_ENV);
        if !lookup.is_satisfiable() {
            return Err(ProviderError::NotConfigured(format!(
                "OpenAI API key missing: set 'api_key' or 'api_key_file', or export {}",
                lookup.env_var()
            )));
        }

        Ok(())
    }

    fn describe(&self) -> &'static str {
        "OpenAI-compatible chat completions with JSON-constrained output"
    }
}
