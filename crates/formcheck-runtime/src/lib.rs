//! # formcheck-runtime
//!
//! LLM-backed validation of form field values.
//!
//! `formcheck-core` builds the prompt and judges the model's reply; this
//! crate makes the one network call in between and wraps it in a service
//! that never leaves a caller without a verdict.
//!
//! ## Layers
//!
//! - [`providers`]: the `LlmProvider` seam, the OpenAI-compatible provider
//!   and the factory registry that builds providers from config
//! - [`service`]: [`ValidationService`], timeout and failure normalization
//! - [`transport`]: the axum HTTP endpoint and the caller-side client
//! - [`config`]: YAML runtime configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use formcheck_runtime::{ProviderRegistry, RuntimeConfig, ValidationService};
//! use formcheck_core::ValidationRequest;
//!
//! let config = RuntimeConfig::from_yaml_file("formcheck.yaml")?;
//! let service = ValidationService::from_config(&config, &ProviderRegistry::builtin())?;
//!
//! let request = ValidationRequest::new("not-an-email", "email", "must be a valid email address");
//! let verdict = service.validate(&request).await?;
//! assert!(!verdict.is_valid);
//! ```
//!
//! ## Features
//!
//! - `openai` (default): OpenAI-compatible chat completions provider
//! - `server` (default): HTTP endpoint
//! - `client` (default): HTTP client for the endpoint

pub mod config;
pub mod providers;
pub mod service;
pub mod transport;

pub use config::{ConfigError, RuntimeConfig};
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderFactory, ProviderRegistry, ResponseFormat, Role, Usage,
};
pub use service::{ServiceError, ValidationService, ValidationServiceBuilder};

#[cfg(feature = "client")]
pub use transport::ValidationClient;
