//! Strict parsing of the model's reply into a verdict.
//!
//! The reply must be a JSON object with exactly the keys `isValid`
//! (boolean) and `message` (string or null). Anything else is a [`ReplyError`];
//! a malformed reply is never guessed into a verdict.

use std::sync::OnceLock;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::types::ValidationVerdict;

/// JSON Schema of a model reply.
///
/// Also sent to providers that support schema-constrained output.
pub const VERDICT_SCHEMA_JSON: &str = r#"{
  "type": "object",
  "properties": {
    "isValid": { "type": "boolean" },
    "message": { "type": ["string", "null"] }
  },
  "required": ["isValid", "message"],
  "additionalProperties": false
}"#;

/// Compiled verdict schema (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from reply parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplyError {
    #[error("Reply is empty")]
    Empty,

    #[error("Reply is not JSON: {0}")]
    NotJson(String),

    #[error("Reply does not match the verdict schema: {0}")]
    SchemaMismatch(String),

    #[error("Verdict schema unavailable: {0}")]
    SchemaUnavailable(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerdict {
    is_valid: bool,
    message: Option<String>,
}

/// The verdict schema as a JSON value.
pub fn verdict_schema() -> JsonValue {
    serde_json::from_str(VERDICT_SCHEMA_JSON).unwrap_or(JsonValue::Null)
}

fn get_validator() -> Result<&'static jsonschema::Validator, ReplyError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: JsonValue = match serde_json::from_str(VERDICT_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(ReplyError::SchemaUnavailable(e.clone())),
    }
}

/// Parse the raw completion text into a verdict.
///
/// `isValid: true` drops the message. `isValid: false` with a blank or
/// null message, or one that reads as the safe default, gets the fixed
/// fallback explanation.
pub fn parse_reply(raw: &str) -> Result<ValidationVerdict, ReplyError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ReplyError::Empty);
    }

    let value: JsonValue =
        serde_json::from_str(trimmed).map_err(|e| ReplyError::NotJson(e.to_string()))?;

    let validator = get_validator()?;
    let errors: Vec<String> = validator
        .iter_errors(&value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();
    if !errors.is_empty() {
        return Err(ReplyError::SchemaMismatch(errors.join("; ")));
    }

    let raw_verdict: RawVerdict =
        serde_json::from_value(value).map_err(|e| ReplyError::SchemaMismatch(e.to_string()))?;

    tracing::debug!(is_valid = raw_verdict.is_valid, "Parsed model verdict");

    Ok(if raw_verdict.is_valid {
        ValidationVerdict::valid()
    } else {
        ValidationVerdict::invalid(raw_verdict.message.unwrap_or_default())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VerdictStatus, FALLBACK_REJECTION_MESSAGE, SAFE_DEFAULT_MESSAGE};
    use proptest::prelude::*;

    #[test]
    fn test_schema_compiles() {
        assert!(get_validator().is_ok());
        assert!(verdict_schema().is_object());
    }

    #[test]
    fn test_parse_rejection() {
        let verdict =
            parse_reply(r#"{"isValid": false, "message": "The value is not a valid email format."}"#)
                .unwrap();
        assert!(!verdict.is_valid);
        assert!(verdict.message.unwrap().contains("email"));
    }

    #[test]
    fn test_parse_acceptance_drops_message() {
        let verdict = parse_reply(r#"{"isValid": true, "message": ""}"#).unwrap();
        assert_eq!(verdict, ValidationVerdict::valid());

        let verdict = parse_reply(r#"{"isValid": true, "message": "Looks good"}"#).unwrap();
        assert!(verdict.message.is_none());
    }

    #[test]
    fn test_blank_rejection_gets_fallback_message() {
        let verdict = parse_reply(r#"{"isValid": false, "message": "  "}"#).unwrap();
        assert_eq!(verdict.message.as_deref(), Some(FALLBACK_REJECTION_MESSAGE));
    }

    #[test]
    fn test_null_message_accepted() {
        let verdict = parse_reply(r#"{"isValid": true, "message": null}"#).unwrap();
        assert_eq!(verdict, ValidationVerdict::valid());

        let verdict = parse_reply(r#"{"isValid": false, "message": null}"#).unwrap();
        assert_eq!(verdict.message.as_deref(), Some(FALLBACK_REJECTION_MESSAGE));
        assert_eq!(verdict.status(), VerdictStatus::Rejected);
    }

    #[test]
    fn test_model_rejection_never_reads_as_unconfirmed() {
        let raw = serde_json::json!({ "isValid": false, "message": SAFE_DEFAULT_MESSAGE }).to_string();
        let verdict = parse_reply(&raw).unwrap();

        assert!(!verdict.is_safe_default());
        assert_eq!(verdict.status(), VerdictStatus::Rejected);
        assert_eq!(verdict.message.as_deref(), Some(FALLBACK_REJECTION_MESSAGE));
    }

    #[test]
    fn test_surrounding_whitespace_allowed() {
        assert!(parse_reply("\n  {\"isValid\": true, \"message\": \"\"}\n").is_ok());
    }

    #[test]
    fn test_empty_reply() {
        assert_eq!(parse_reply("   "), Err(ReplyError::Empty));
    }

    #[test]
    fn test_non_json_reply() {
        let result = parse_reply("Yes, that looks like a valid email.");
        assert!(matches!(result, Err(ReplyError::NotJson(_))));
    }

    #[test]
    fn test_missing_is_valid() {
        let result = parse_reply(r#"{"message": "ok"}"#);
        assert!(matches!(result, Err(ReplyError::SchemaMismatch(_))));
    }

    #[test]
    fn test_missing_message() {
        let result = parse_reply(r#"{"isValid": true}"#);
        assert!(matches!(result, Err(ReplyError::SchemaMismatch(_))));
    }

    #[test]
    fn test_wrong_type() {
        let result = parse_reply(r#"{"isValid": "false", "message": "no"}"#);
        assert!(matches!(result, Err(ReplyError::SchemaMismatch(_))));
    }

    #[test]
    fn test_extra_keys_rejected() {
        let result = parse_reply(r#"{"isValid": true, "message": "", "confidence": 0.9}"#);
        assert!(matches!(result, Err(ReplyError::SchemaMismatch(_))));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(parse_reply("true"), Err(ReplyError::SchemaMismatch(_))));
        assert!(matches!(parse_reply("[]"), Err(ReplyError::SchemaMismatch(_))));
    }

    #[test]
    fn test_code_fenced_reply_rejected() {
        let raw = "```json\n{\"isValid\": true, \"message\": \"\"}\n```";
        assert!(matches!(parse_reply(raw), Err(ReplyError::NotJson(_))));
    }

    proptest! {
        #[test]
        fn parse_never_panics(raw in ".*") {
            let _ = parse_reply(&raw);
        }

        #[test]
        fn parsed_verdicts_have_contract_shape(is_valid in any::<bool>(), message in ".*") {
            let raw = serde_json::json!({ "isValid": is_valid, "message": message.clone() }).to_string();
            let verdict = parse_reply(&raw).unwrap();

            prop_assert_eq!(verdict.is_valid, is_valid);
            match &verdict.message {
                None => prop_assert!(verdict.is_valid),
                Some(text) => {
                    prop_assert!(!verdict.is_valid);
                    prop_assert!(!text.trim().is_empty());
                }
            }
            if !is_valid {
                prop_assert_eq!(verdict.status(), VerdictStatus::Rejected);
            }
        }
    }
}
