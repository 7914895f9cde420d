//! LLM provider abstractions for formcheck-runtime.
//!
//! This module defines the trait the validation service calls and the
//! OpenAI-compatible chat provider.
//!
//! ## Security
//!
//! All providers use the [`secrets`] module for credential handling.
//! Credentials are resolved through [`CredentialLookup`] when a provider
//! is built and held as an [`ApiCredential`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

mod factory;
pub mod secrets;

#[cfg(feature = "openai")]
mod openai;

pub use factory::{ProviderFactory, ProviderRegistry};
pub use secrets::{ApiCredential, CredentialLookup, CredentialSource};

#[cfg(feature = "openai")]
pub use openai::{OpenAiProvider, OpenAiProviderFactory, OPENAI_API_KEY_ENV};

/// Why a provider call produced no usable completion.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request did not complete: {0}")]
    Transport(String),

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("provider answered {status}: {message}")]
    Status { status: u16, message: String },

    /// The call succeeded but carried no usable reply. `raw` is the
    /// redacted response body.
    #[error("unusable completion: {reason}")]
    MalformedReply { reason: String, raw: String },

    #[error("credential rejected by provider")]
    Unauthorized,

    #[error("no completion within {0:?}")]
    TimedOut(Duration),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Credential or setup is wrong, as opposed to the provider being
    /// unavailable. These are not masked by the safe-default verdict.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ProviderError::Unauthorized | ProviderError::NotConfigured(_))
    }
}

/// Structured-output mode requested from the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// Any JSON object; the reply parser checks the shape
    JsonObject,

    /// JSON constrained to a schema
    JsonSchema { name: String, schema: JsonValue },
}

impl ResponseFormat {
    pub fn verdict_schema() -> Self {
        ResponseFormat::JsonSchema {
            name: "validation_verdict".to_string(),
            schema: formcheck_core::verdict_schema(),
        }
    }
}

/// Per-call completion parameters.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub model: String,
    pub max_tokens: u32,
    /// Always 0 once it reaches a provider through the service
    pub temperature: f32,
    /// Bound on the whole provider call
    pub timeout: Duration,
    pub response_format: ResponseFormat,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 200,
            temperature: 0.0,
            timeout: Duration::from_secs(8),
            response_format: ResponseFormat::verdict_schema(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The text the model produced plus bookkeeping for logs.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: Usage,
    pub model: String,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// A model backend.
///
/// The validation service is the only caller. Implementations make exactly
/// one outbound request per `complete` and never retry; dropping the
/// returned future abandons the request.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Whether the provider looks usable. Makes no network call.
    async fn health_check(&self) -> bool;

    /// Short name for logs and the health endpoint.
    fn name(&self) -> &str;
}
