//! Runtime configuration.
//!
//! Loaded from YAML or built from defaults; the CLI layers flags on top.
//!
//! ```yaml
//! provider:
//!   type: openai
//!   options:
//!     api_key_env: OPENAI_API_KEY
//! completion:
//!   model: gpt-4o-mini
//!   max_tokens: 200
//!   timeout: 8s
//!   response_format: json_schema
//! server:
//!   bind: 0.0.0.0:3000
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::providers::{CompletionConfig, ResponseFormat};

/// Longest provider timeout accepted. Callers are typing; anything longer
/// is indistinguishable from a hang.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub provider: ProviderSettings,
    pub completion: CompletionSettings,
    pub server: ServerSettings,
}

/// Which provider to build and its options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Registered provider type
    #[serde(rename = "type")]
    pub kind: String,

    /// Provider-specific options handed to the factory
    pub options: JsonValue,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: "openai".to_string(),
            options: serde_json::json!({}),
        }
    }
}

/// Structured-output mode, as written in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormatKind {
    JsonSchema,
    JsonObject,
}

/// Model invocation settings.
///
/// Temperature is not configurable: verdicts are always requested at 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub model: String,

    pub max_tokens: u32,

    /// Provider call timeout (e.g. "8s", "1500ms")
    #[serde(with = "duration_str")]
    pub timeout: Duration,

    pub response_format: ResponseFormatKind,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        let defaults = CompletionConfig::default();
        Self {
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            timeout: defaults.timeout,
            response_format: ResponseFormatKind::JsonSchema,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

impl RuntimeConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.kind.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.type is empty".to_string()));
        }

        if !self.provider.options.is_object() {
            return Err(ConfigError::Invalid(
                "provider.options must be a mapping".to_string(),
            ));
        }

        if self.completion.model.trim().is_empty() {
            return Err(ConfigError::Invalid("completion.model is empty".to_string()));
        }

        if self.completion.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "completion.max_tokens must be positive".to_string(),
            ));
        }

        if self.completion.timeout.is_zero() || self.completion.timeout > MAX_TIMEOUT {
            return Err(ConfigError::Invalid(format!(
                "completion.timeout must be between 1ms and {}",
                humantime::format_duration(MAX_TIMEOUT)
            )));
        }

        self.bind_addr()?;
        Ok(())
    }

    /// The completion request parameters, temperature pinned to 0.
    pub fn completion_config(&self) -> CompletionConfig {
        let response_format = match self.completion.response_format {
            ResponseFormatKind::JsonSchema => ResponseFormat::verdict_schema(),
            ResponseFormatKind::JsonObject => ResponseFormat::JsonObject,
        };

        CompletionConfig {
            model: self.completion.model.clone(),
            max_tokens: self.completion.max_tokens,
            temperature: 0.0,
            timeout: self.completion.timeout,
            response_format,
        }
    }

    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.bind.parse().map_err(|_| {
            ConfigError::Invalid(format!("server.bind '{}' is not an address", self.server.bind))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RuntimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider.kind, "openai");
        assert_eq!(config.completion.timeout, Duration::from_secs(8));
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
provider:
  type: openai
  options:
    base_url: http://localhost:8080/v1
    api_key_env: MY_KEY
completion:
  model: gpt-4o
  max_tokens: 150
  timeout: 1500ms
  response_format: json_object
server:
  bind: 127.0.0.1:8088
"#;
        let config = RuntimeConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.provider.options["api_key_env"], "MY_KEY");
        assert_eq!(config.completion.timeout, Duration::from_millis(1500));
        assert_eq!(config.completion.response_format, ResponseFormatKind::JsonObject);
        assert_eq!(config.bind_addr().unwrap().port(), 8088);

        let completion = config.completion_config();
        assert_eq!(completion.model, "gpt-4o");
        assert_eq!(completion.temperature, 0.0);
        assert_eq!(completion.response_format, ResponseFormat::JsonObject);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = RuntimeConfig::from_yaml("completion:\n  timeout: 3s\n").unwrap();
        assert_eq!(config.completion.timeout, Duration::from_secs(3));
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.server.bind, "0.0.0.0:3000");
    }

    #[test]
    fn test_temperature_cannot_be_configured() {
        let yaml = "completion:\n  temperature: 0.9\n";
        let config = RuntimeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.completion_config().temperature, 0.0);
    }

    #[test]
    fn test_invalid_timeout() {
        assert!(matches!(
            RuntimeConfig::from_yaml("completion:\n  timeout: 0s\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_yaml("completion:\n  timeout: 5m\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_yaml("completion:\n  timeout: soon\n"),
            Err(ConfigError::YamlError(_))
        ));
    }

    #[test]
    fn test_invalid_bind() {
        let result = RuntimeConfig::from_yaml("server:\n  bind: not-an-address\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_timeout_round_trips_as_text() {
        let yaml = serde_yaml::to_string(&RuntimeConfig::default()).unwrap();
        assert!(yaml.contains("8s"));
        assert!(RuntimeConfig::from_yaml(&yaml).is_ok());
    }

    proptest::proptest! {
        #[test]
        fn test_timeout_bounds(ms in 1u64..=120_000) {
            let mut config = RuntimeConfig::default();
            config.completion.timeout = Duration::from_millis(ms);
            proptest::prop_assert_eq!(config.validate().is_ok(), ms <= 60_000);
        }
    }
}
