//! Caller-side client for the HTTP validation endpoint.
//!
//! Mirrors what a form renderer does: send one request per opted-in field
//! and treat any failure at all as the safe-default verdict.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use formcheck_core::{log_snippet, FormField, ValidationRequest, ValidationVerdict};

use super::VALIDATE_PATH;

/// Client-side bound on a whole validation round trip.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct ValidationClient {
    endpoint: String,
    client: reqwest::Client,
    token: Option<SecretString>,
    timeout: Duration,
}

impl ValidationClient {
    /// Client for the service rooted at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), VALIDATE_PATH),
            client: reqwest::Client::new(),
            token: None,
            timeout: DEFAULT_CLIENT_TIMEOUT,
        }
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one validation request. Never fails.
    pub async fn validate(&self, request: &ValidationRequest) -> ValidationVerdict {
        let mut call = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(request);
        if let Some(token) = &self.token {
            call = call.bearer_auth(token.expose_secret());
        }

        let response = match call.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %log_snippet(&e.to_string()), "Validation endpoint unreachable");
                return ValidationVerdict::safe_default();
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Validation endpoint returned an error");
            return ValidationVerdict::safe_default();
        }

        match response.json::<ValidationVerdict>().await {
            Ok(verdict) => normalize(verdict),
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable verdict from validation endpoint");
                ValidationVerdict::safe_default()
            }
        }
    }

    /// Validate a form field's value.
    ///
    /// Returns `None` without any network call when the field does not
    /// opt in to validation.
    pub async fn validate_field(&self, field: &FormField, value: &str) -> Option<ValidationVerdict> {
        let request = field.validation_request(value)?;
        Some(self.validate(&request).await)
    }
}

/// Rebuild a decoded verdict so rejections always carry a message.
fn normalize(verdict: ValidationVerdict) -> ValidationVerdict {
    if verdict.is_valid {
        ValidationVerdict::valid()
    } else if verdict.is_safe_default() {
        verdict
    } else {
        ValidationVerdict::invalid(verdict.message.unwrap_or_default())
    }
}

impl std::fmt::Debug for ValidationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationClient")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
