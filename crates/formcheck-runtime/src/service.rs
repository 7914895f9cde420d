//! The validation service.
//!
//! One provider call per request, bounded by a timeout, followed by strict
//! reply parsing. The service holds no per-request state and is cheap to
//! clone; every transport adapter shares one instance.
//!
//! # Failure contract
//! - Provider and parse failures recover into the safe-default verdict
//! - Configuration failures are returned to the adapter, which answers
//!   with a generic "Validation failed"
//! - No retries: a failed call is reported, not repeated

use std::sync::Arc;
use thiserror::Error;

use formcheck_core::{
    log_snippet, parse_reply, ModelPrompt, ValidationError, ValidationRequest, ValidationVerdict,
};

use crate::config::{ConfigError, RuntimeConfig};
use crate::providers::{
    ChatMessage, CompletionConfig, LlmProvider, ProviderError, ProviderRegistry,
};

/// Errors from assembling a service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Map a provider failure onto the validation error taxonomy.
///
/// A malformed completion means the call succeeded and the payload is
/// wrong, so it is a parse failure and keeps the body for the log.
fn classify(error: ProviderError) -> ValidationError {
    match error {
        ProviderError::MalformedReply { reason, raw } => ValidationError::Parse { reason, raw },
        error if error.is_configuration() => ValidationError::Configuration(error.to_string()),
        error => ValidationError::Provider(error.to_string()),
    }
}

/// LLM-backed field validation.
///
/// Safe to call concurrently, including for the same field. Dropping the
/// future returned by [`ValidationService::validate`] cancels the
/// outbound provider call.
#[derive(Clone)]
pub struct ValidationService {
    provider: Arc<dyn LlmProvider>,
    completion: Arc<CompletionConfig>,
}

impl std::fmt::Debug for ValidationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationService")
            .field("provider", &self.provider.name())
            .field("model", &self.completion.model)
            .field("timeout", &self.completion.timeout)
            .finish()
    }
}

impl ValidationService {
    /// Create a service around a provider.
    ///
    /// The temperature is forced to 0 whatever `completion` says.
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        let completion = CompletionConfig {
            temperature: 0.0,
            ..completion
        };
        Self {
            provider,
            completion: Arc::new(completion),
        }
    }

    /// Build the configured provider through the registry and wrap it.
    ///
    /// The credential is resolved here, once, not per request.
    pub fn from_config(
        config: &RuntimeConfig,
        registry: &ProviderRegistry,
    ) -> Result<Self, ServiceError> {
        config.validate()?;
        let provider = registry.build(&config.provider)?;
        Ok(Self::new(provider, config.completion_config()))
    }

    /// The prompt that would be sent for a request.
    pub fn prompt_for(&self, request: &ValidationRequest) -> ModelPrompt {
        ModelPrompt::build(request)
    }

    /// Validate, reporting every failure in the error taxonomy.
    #[tracing::instrument(
        name = "validate_field",
        skip_all,
        fields(field_type = %request.field_type, provider = self.provider.name())
    )]
    pub async fn try_validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationVerdict, ValidationError> {
        if !request.has_rules() {
            tracing::debug!("Validation requested without rules");
        }

        let prompt = self.prompt_for(request);
        let messages = vec![ChatMessage::user(prompt.into_string())];
        let timeout = self.completion.timeout;

        let response = match tokio::time::timeout(
            timeout,
            self.provider.complete(messages, &self.completion),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(classify(e)),
            Err(_) => return Err(classify(ProviderError::TimedOut(timeout))),
        };

        tracing::debug!(
            tokens = response.usage.total(),
            model = %response.model,
            "Provider replied"
        );

        match parse_reply(&response.content) {
            Ok(verdict) => Ok(verdict),
            Err(e) => Err(ValidationError::parse(e, response.content)),
        }
    }

    /// Validate with the normalized failure contract.
    ///
    /// Provider and parse failures become the safe-default verdict. Only
    /// configuration failures are returned as `Err`.
    pub async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationVerdict, ValidationError> {
        match self.try_validate(request).await {
            Ok(verdict) => Ok(verdict),
            Err(error) => {
                log_failure(&error, self.provider.name());
                error.recover()
            }
        }
    }

    /// Whether the provider reports itself usable.
    pub async fn health_check(&self) -> bool {
        self.provider.health_check().await
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn completion(&self) -> &CompletionConfig {
        &self.completion
    }
}

fn log_failure(error: &ValidationError, provider: &str) {
    match error {
        ValidationError::Configuration(detail) => {
            tracing::error!(provider, error = %log_snippet(detail), "Validation misconfigured");
        }
        ValidationError::Provider(detail) => {
            tracing::warn!(
                provider,
                error = %log_snippet(detail),
                "Provider call failed, returning safe-default verdict"
            );
        }
        ValidationError::Parse { reason, raw } => {
            tracing::warn!(
                provider,
                error = %reason,
                raw = %log_snippet(raw),
                "Unparseable model reply, returning safe-default verdict"
            );
        }
    }
}

/// Builder for ValidationService.
pub struct ValidationServiceBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    completion: CompletionConfig,
}

impl ValidationServiceBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            provider: None,
            completion: CompletionConfig::default(),
        }
    }

    /// Set the LLM provider.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the completion parameters.
    pub fn completion(mut self, completion: CompletionConfig) -> Self {
        self.completion = completion;
        self
    }

    /// Take completion parameters from a runtime config.
    pub fn config(mut self, config: &RuntimeConfig) -> Self {
        self.completion = config.completion_config();
        self
    }

    /// Build the service.
    pub fn build(self) -> Result<ValidationService, ServiceError> {
        let provider = self
            .provider
            .ok_or_else(|| ServiceError::ProviderNotConfigured("No provider set".to_string()))?;

        Ok(ValidationService::new(provider, self.completion))
    }
}

impl Default for ValidationServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
