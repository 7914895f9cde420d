//! Core types for field validation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Message carried by the verdict returned when validation could not be
/// evaluated (provider unreachable, timed out, or replied with garbage).
pub const SAFE_DEFAULT_MESSAGE: &str = "Validation service unavailable";

/// Message used when the model rejects a value without explaining why.
pub const FALLBACK_REJECTION_MESSAGE: &str = "Input does not satisfy the validation rule";

/// Tag describing the expected shape of a form input.
///
/// The set is open-ended: tags this crate does not know are kept verbatim
/// in [`FieldType::Other`] and handed to the model as free text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    Number,
    Select,
    Date,
    /// File upload; the validated value is the chosen filename.
    File,
    Other(String),
}

impl FieldType {
    /// The wire tag for this field type.
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::Date => "date",
            FieldType::File => "file",
            FieldType::Other(tag) => tag,
        }
    }

    /// Whether this is one of the built-in field types.
    pub fn is_known(&self) -> bool {
        !matches!(self, FieldType::Other(_))
    }
}

impl From<&str> for FieldType {
    fn from(tag: &str) -> Self {
        match tag {
            "text" => FieldType::Text,
            "textarea" => FieldType::Textarea,
            "email" => FieldType::Email,
            "number" => FieldType::Number,
            "select" => FieldType::Select,
            "date" => FieldType::Date,
            "file" => FieldType::File,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        match FieldType::from(tag.as_str()) {
            FieldType::Other(_) => FieldType::Other(tag),
            known => known,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(FieldType::from)
    }
}

/// A single field value to be judged against a free-text rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    /// Candidate input, or the filename for file-upload fields
    pub value: String,

    /// Declared type of the field
    pub field_type: FieldType,

    /// Author-supplied rule text (opaque natural language)
    #[serde(default)]
    pub validation_rules: String,
}

impl ValidationRequest {
    /// Create a new validation request.
    pub fn new(
        value: impl Into<String>,
        field_type: impl Into<FieldType>,
        validation_rules: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            field_type: field_type.into(),
            validation_rules: validation_rules.into(),
        }
    }

    /// Whether the request carries a rule worth sending to the model.
    ///
    /// Callers are expected to skip the service entirely when this is false.
    pub fn has_rules(&self) -> bool {
        !self.validation_rules.trim().is_empty()
    }
}

/// Accept/reject result of one validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationVerdict {
    pub is_valid: bool,

    /// Human-readable explanation, present on rejections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationVerdict {
    /// A verdict accepting the value.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    /// A verdict rejecting the value.
    ///
    /// A blank explanation is replaced with [`FALLBACK_REJECTION_MESSAGE`]
    /// so rejections always carry a message. So is one that reads as
    /// [`SAFE_DEFAULT_MESSAGE`], which only [`safe_default`](Self::safe_default)
    /// may carry.
    pub fn invalid(message: impl Into<String>) -> Self {
        let message = message.into();
        let trimmed = message.trim();
        let message = if trimmed.is_empty() || trimmed == SAFE_DEFAULT_MESSAGE {
            FALLBACK_REJECTION_MESSAGE.to_string()
        } else {
            message
        };
        Self {
            is_valid: false,
            message: Some(message),
        }
    }

    /// The verdict returned when validation could not be evaluated.
    ///
    /// It never reads as "passed": the value is unconfirmed.
    pub fn safe_default() -> Self {
        Self {
            is_valid: false,
            message: Some(SAFE_DEFAULT_MESSAGE.to_string()),
        }
    }

    /// Whether this is the safe-default verdict.
    pub fn is_safe_default(&self) -> bool {
        !self.is_valid && self.message.as_deref() == Some(SAFE_DEFAULT_MESSAGE)
    }

    /// How a form should render this verdict.
    pub fn status(&self) -> VerdictStatus {
        if self.is_valid {
            VerdictStatus::Passed
        } else if self.is_safe_default() {
            VerdictStatus::Unconfirmed
        } else {
            VerdictStatus::Rejected
        }
    }
}

/// Display state of a validated field.
///
/// `Unconfirmed` must be styled distinctly from both `Passed` and
/// `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Passed,
    Rejected,
    Unconfirmed,
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictStatus::Passed => write!(f, "passed"),
            VerdictStatus::Rejected => write!(f, "rejected"),
            VerdictStatus::Unconfirmed => write!(f, "unconfirmed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_known_tags() {
        assert_eq!(FieldType::from("email"), FieldType::Email);
        assert_eq!(FieldType::from("file"), FieldType::File);
        assert!(FieldType::from("textarea").is_known());
    }

    #[test]
    fn test_unknown_field_type_kept_verbatim() {
        let field_type = FieldType::from("phone-number");
        assert_eq!(field_type, FieldType::Other("phone-number".to_string()));
        assert!(!field_type.is_known());
        assert_eq!(field_type.to_string(), "phone-number");
    }

    #[test]
    fn test_request_wire_format() {
        let json = r#"{"value":"42","fieldType":"number","validationRules":"must be between 1 and 100"}"#;
        let request: ValidationRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.value, "42");
        assert_eq!(request.field_type, FieldType::Number);
        assert!(request.has_rules());

        let back = serde_json::to_value(&request).unwrap();
        assert_eq!(back["fieldType"], "number");
        assert_eq!(back["validationRules"], "must be between 1 and 100");
    }

    #[test]
    fn test_request_without_rules() {
        let request: ValidationRequest =
            serde_json::from_str(r#"{"value":"","fieldType":"text"}"#).unwrap();
        assert!(!request.has_rules());

        let blank = ValidationRequest::new("x", "text", "   ");
        assert!(!blank.has_rules());
    }

    #[test]
    fn test_valid_verdict_omits_message() {
        let json = serde_json::to_string(&ValidationVerdict::valid()).unwrap();
        assert_eq!(json, r#"{"isValid":true}"#);
    }

    #[test]
    fn test_invalid_verdict_always_has_message() {
        let verdict = ValidationVerdict::invalid("");
        assert_eq!(verdict.message.as_deref(), Some(FALLBACK_REJECTION_MESSAGE));

        let verdict = ValidationVerdict::invalid("Not an email address");
        assert_eq!(verdict.message.as_deref(), Some("Not an email address"));
    }

    #[test]
    fn test_verdict_status() {
        assert_eq!(ValidationVerdict::valid().status(), VerdictStatus::Passed);
        assert_eq!(
            ValidationVerdict::invalid("too long").status(),
            VerdictStatus::Rejected
        );
        assert_eq!(
            ValidationVerdict::safe_default().status(),
            VerdictStatus::Unconfirmed
        );
    }

    #[test]
    fn test_rejection_cannot_impersonate_safe_default() {
        let verdict = ValidationVerdict::invalid(" Validation service unavailable ");
        assert!(!verdict.is_safe_default());
        assert_eq!(verdict.status(), VerdictStatus::Rejected);
        assert_eq!(verdict.message.as_deref(), Some(FALLBACK_REJECTION_MESSAGE));
    }

    #[test]
    fn test_safe_default_wire_format() {
        let value = serde_json::to_value(ValidationVerdict::safe_default()).unwrap();
        assert_eq!(value["isValid"], false);
        assert_eq!(value["message"], "Validation service unavailable");
    }
}
