//! Error taxonomy of a validation call.
//!
//! None of these ever reach an end user as an exception. Provider and
//! parse failures recover into the safe-default verdict; configuration
//! failures surface as a generic "Validation failed".

use thiserror::Error;

use crate::reply::ReplyError;
use crate::types::ValidationVerdict;

/// Generic message shown to callers when a call fails outright.
pub const GENERIC_FAILURE_MESSAGE: &str = "Validation failed";

/// Errors from a validation call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Credential or setup missing; fatal to the call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Upstream model call failed (network, timeout, non-2xx, rate limit)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Upstream succeeded but the payload is not a verdict
    #[error("Parse error: {reason}")]
    Parse { reason: String, raw: String },
}

impl ValidationError {
    /// Build a parse error from a reply failure and the offending payload.
    pub fn parse(error: ReplyError, raw: impl Into<String>) -> Self {
        ValidationError::Parse {
            reason: error.to_string(),
            raw: raw.into(),
        }
    }

    /// Whether the caller gets the safe-default verdict instead of an error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ValidationError::Configuration(_))
    }

    /// Recover into the safe-default verdict, or hand the error back.
    pub fn recover(self) -> Result<ValidationVerdict, ValidationError> {
        if self.is_recoverable() {
            Ok(ValidationVerdict::safe_default())
        } else {
            Err(self)
        }
    }

    /// Short machine-readable kind, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::Configuration(_) => "configuration",
            ValidationError::Provider(_) => "provider",
            ValidationError::Parse { .. } => "parse",
        }
    }

    /// The message a caller may see. Never carries detail.
    pub fn public_message(&self) -> &'static str {
        GENERIC_FAILURE_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_and_parse_recover_to_safe_default() {
        let provider = ValidationError::Provider("HTTP 503".to_string());
        assert_eq!(provider.recover(), Ok(ValidationVerdict::safe_default()));

        let parse = ValidationError::parse(ReplyError::Empty, "");
        assert_eq!(parse.recover(), Ok(ValidationVerdict::safe_default()));
    }

    #[test]
    fn test_configuration_does_not_recover() {
        let error = ValidationError::Configuration("API key not set".to_string());
        assert!(!error.is_recoverable());
        assert!(error.clone().recover().is_err());
        assert_eq!(error.public_message(), "Validation failed");
    }

    #[test]
    fn test_parse_keeps_raw_payload() {
        let error = ValidationError::parse(ReplyError::NotJson("eof".to_string()), "not json");
        match error {
            ValidationError::Parse { reason, raw } => {
                assert!(reason.contains("not JSON"));
                assert_eq!(raw, "not json");
            }
            _ => panic!("Expected Parse error"),
        }
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ValidationError::Configuration(String::new()).kind(), "configuration");
        assert_eq!(ValidationError::Provider(String::new()).kind(), "provider");
        assert_eq!(ValidationError::parse(ReplyError::Empty, "").kind(), "parse");
    }
}
