//! # formcheck-core
//!
//! The field-validation contract, independent of any transport or model
//! provider.
//!
//! A form filler's value, the field's declared type and the author's
//! free-text rule go in; an accept/reject verdict comes out. This crate
//! holds everything about that exchange that can be decided without a
//! network call:
//!
//! - [`ValidationRequest`] and [`ValidationVerdict`], with their wire format
//! - [`FormField`] gating: which fields are validated at all
//! - [`ModelPrompt`]: the judge instruction sent to the model
//! - [`parse_reply`]: strict parsing of the model's structured reply
//! - [`ValidationError`]: the error taxonomy and safe-default recovery
//!
//! ## Key Guarantees
//!
//! 1. **No network calls**: the provider lives in `formcheck-runtime`
//! 2. **Deterministic prompts**: same request, same prompt
//! 3. **Strict replies**: malformed model output is an error, never a verdict
//! 4. **Safe default**: unevaluated values read as unconfirmed, never passed
//!
//! ## Example
//!
//! ```rust
//! use formcheck_core::{parse_reply, FormField, ModelPrompt, VerdictStatus};
//!
//! let field = FormField::new("email", "email").with_validation("must be a valid email address");
//! let request = field.validation_request("not-an-email").expect("field opts in");
//! let prompt = ModelPrompt::build(&request);
//! assert!(prompt.as_str().contains("Field Type: email"));
//!
//! let verdict = parse_reply(r#"{"isValid": false, "message": "Missing @ sign"}"#).unwrap();
//! assert_eq!(verdict.status(), VerdictStatus::Rejected);
//! ```

pub mod error;
pub mod form;
pub mod prompt;
pub mod redact;
pub mod reply;
pub mod types;

// Re-export main types at crate root
pub use error::{ValidationError, GENERIC_FAILURE_MESSAGE};
pub use form::{FormField, FormPage};
pub use prompt::ModelPrompt;
pub use redact::{log_snippet, redact_secrets};
pub use reply::{parse_reply, verdict_schema, ReplyError, VERDICT_SCHEMA_JSON};
pub use types::{
    FieldType, ValidationRequest, ValidationVerdict, VerdictStatus, FALLBACK_REJECTION_MESSAGE,
    SAFE_DEFAULT_MESSAGE,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_flow() {
        let field = FormField::new("email", "email").with_validation("must be a valid email address");
        let request = field.validation_request("not-an-email").unwrap();

        let prompt = ModelPrompt::build(&request);
        assert!(prompt.as_str().contains("Input Value: not-an-email"));

        let verdict =
            parse_reply(r#"{"isValid": false, "message": "Not a valid email format"}"#).unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Rejected);
    }

    #[test]
    fn test_malformed_reply_recovers_to_unconfirmed() {
        let raw = "I think it's fine";
        let verdict = parse_reply(raw)
            .map_err(|e| ValidationError::parse(e, raw))
            .or_else(ValidationError::recover)
            .unwrap();

        assert_eq!(verdict, ValidationVerdict::safe_default());
        assert_eq!(verdict.status(), VerdictStatus::Unconfirmed);
    }
}
