//! Provider credential lookup.
//!
//! The credential is resolved once, when the provider is built, and then
//! lives inside an [`ApiCredential`] that never prints its value. Request
//! handling never reads the environment or the filesystem.
//!
//! Lookup order for provider options:
//!
//! 1. `api_key`: inline value
//! 2. `api_key_file`: path to a mounted secret, whitespace trimmed
//! 3. the environment variable named by `api_key_env`, else the provider default

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::Path;

use super::ProviderError;

pub const API_KEY_OPTION: &str = "api_key";
pub const API_KEY_FILE_OPTION: &str = "api_key_file";
pub const API_KEY_ENV_OPTION: &str = "api_key_env";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Inline,
    File,
    Environment,
    Programmatic,
}

/// A provider API key. Zeroed on drop; Debug shows only the source.
pub struct ApiCredential {
    secret: SecretString,
    source: CredentialSource,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            secret: SecretString::from(value.into()),
            source,
        }
    }

    /// The raw key, for the Authorization header and nothing else.
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    /// True for an empty or whitespace-only key.
    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("source", &self.source)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Where to look for a credential.
#[derive(Debug, Clone, Copy)]
pub struct CredentialLookup<'a> {
    inline: Option<&'a str>,
    file: Option<&'a str>,
    env_var: &'a str,
}

impl<'a> CredentialLookup<'a> {
    /// Environment variable only.
    pub fn env(env_var: &'a str) -> Self {
        Self {
            inline: None,
            file: None,
            env_var,
        }
    }

    pub fn from_options(options: &'a JsonValue, default_env: &'a str) -> Self {
        Self {
            inline: options[API_KEY_OPTION].as_str(),
            file: options[API_KEY_FILE_OPTION].as_str(),
            env_var: options[API_KEY_ENV_OPTION].as_str().unwrap_or(default_env),
        }
    }

    /// The environment variable consulted last.
    pub fn env_var(&self) -> &str {
        self.env_var
    }

    pub fn resolve(&self) -> Result<ApiCredential, ProviderError> {
        if let Some(value) = self.inline {
            return Ok(ApiCredential::new(value, CredentialSource::Inline));
        }

        if let Some(path) = self.file {
            // Only the io error kind is reported, never file contents.
            let contents = std::fs::read_to_string(path).map_err(|e| {
                ProviderError::NotConfigured(format!(
                    "credential file '{}' unreadable: {}",
                    path,
                    e.kind()
                ))
            })?;
            return Ok(ApiCredential::new(contents.trim(), CredentialSource::File));
        }

        match std::env::var(self.env_var) {
            Ok(value) => Ok(ApiCredential::new(value, CredentialSource::Environment)),
            Err(_) => Err(ProviderError::NotConfigured(format!(
                "no credential: set '{}' or '{}' in provider options, or export {}",
                API_KEY_OPTION, API_KEY_FILE_OPTION, self.env_var
            ))),
        }
    }

    /// Whether [`resolve`](Self::resolve) would find something, without reading it.
    pub fn is_satisfiable(&self) -> bool {
        if self.inline.is_some() {
            return true;
        }
        match self.file {
            Some(path) => Path::new(path).is_file(),
            None => std::env::var_os(self.env_var).is_some(),
        }
    }
}
