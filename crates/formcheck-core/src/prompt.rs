//! Prompt construction for the validation judge.
//!
//! The prompt is rebuilt for every request and never stored. It is a pure
//! function of the request so identical inputs always produce identical
//! prompts.

use std::fmt;

use crate::types::ValidationRequest;

/// Role line opening every prompt.
pub const JUDGE_ROLE: &str =
    "You are a form validation expert. Please validate the following input:";

/// Output instructions.
///
/// Names exactly the two keys the reply parser accepts.
pub const OUTPUT_INSTRUCTIONS: &str = r#"Respond with a JSON object containing exactly two keys:
1. "isValid" (boolean)
2. "message" (string) explaining why the input is invalid if applicable, otherwise an empty string"#;

/// Keeps the model from rejecting on criteria the author never stated.
pub const SCOPE_INSTRUCTION: &str = "Only consider the specific validation rules provided and the appropriate format for the field type. Do not invent additional requirements.";

/// Prompt handed to the model for one validation call.
#[derive(Clone, PartialEq, Eq)]
pub struct ModelPrompt(String);

impl ModelPrompt {
    /// Build the prompt for a request.
    pub fn build(request: &ValidationRequest) -> Self {
        let text = format!(
            "{role}\n\nField Type: {field_type}\nValidation Rules: {rules}\nInput Value: {value}\n\n{output}\n\n{scope}",
            role = JUDGE_ROLE,
            field_type = request.field_type,
            rules = request.validation_rules,
            value = request.value,
            output = OUTPUT_INSTRUCTIONS,
            scope = SCOPE_INSTRUCTION,
        );
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

// Prompts embed user input; keep them out of debug logs.
impl fmt::Debug for ModelPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelPrompt")
            .field("len", &self.0.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_prompt_contains_inputs() {
        let request =
            ValidationRequest::new("not-an-email", "email", "must be a valid email address");
        let prompt = ModelPrompt::build(&request);

        assert!(prompt.as_str().contains("Field Type: email"));
        assert!(prompt
            .as_str()
            .contains("Validation Rules: must be a valid email address"));
        assert!(prompt.as_str().contains("Input Value: not-an-email"));
    }

    #[test]
    fn test_prompt_has_scoping_instruction() {
        let prompt = ModelPrompt::build(&ValidationRequest::new("42", "number", "1-100"));
        assert!(prompt.as_str().contains("Only consider the specific validation rules"));
        assert!(prompt.as_str().contains("\"isValid\""));
        assert!(prompt.as_str().contains("\"message\""));
    }

    #[test]
    fn test_unknown_field_type_passed_verbatim() {
        let prompt = ModelPrompt::build(&ValidationRequest::new("x", "iban", "must be an IBAN"));
        assert!(prompt.as_str().contains("Field Type: iban"));
    }

    #[test]
    fn test_empty_value_still_prompted() {
        let prompt = ModelPrompt::build(&ValidationRequest::new("", "text", "must not be blank"));
        assert!(prompt.as_str().contains("Input Value: \n"));
    }

    #[test]
    fn test_debug_hides_content() {
        let prompt = ModelPrompt::build(&ValidationRequest::new("secret-value", "text", "rule"));
        let debug = format!("{:?}", prompt);
        assert!(!debug.contains("secret-value"));
    }

    proptest! {
        #[test]
        fn prompt_is_deterministic(value in ".*", rules in ".*", tag in "[a-z]{1,12}") {
            let request = ValidationRequest::new(value, tag.as_str(), rules);
            prop_assert_eq!(ModelPrompt::build(&request), ModelPrompt::build(&request));
        }

        #[test]
        fn prompt_always_embeds_request(value in "[^\r\n]*", rules in "[^\r\n]*") {
            let request = ValidationRequest::new(value.clone(), "text", rules.clone());
            let prompt = ModelPrompt::build(&request);
            let value_line = format!("Input Value: {}", value);
            let rules_line = format!("Validation Rules: {}", rules);
            prop_assert!(prompt.as_str().contains(&value_line));
            prop_assert!(prompt.as_str().contains(&rules_line));
            prop_assert!(prompt.as_str().contains(SCOPE_INSTRUCTION));
        }
    }
}
