//! Form field descriptors as the form builder stores them.
//!
//! Only the parts that decide whether a field is validated live here.
//! Authoring state and persistence belong to the form builder.

use serde::{Deserialize, Serialize};

use crate::types::{FieldType, ValidationRequest};

/// A single field on a form page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default)]
    pub required: bool,

    /// Author opted in to model-backed validation
    #[serde(default)]
    pub validation_enabled: bool,

    /// Free-text validation rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<String>,

    /// Accepted file formats (file fields only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,

    /// Maximum upload size in megabytes (file fields only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u32>,
}

impl FormField {
    /// Create a field with no validation.
    pub fn new(id: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        Self {
            id: id.into(),
            field_type: field_type.into(),
            label: String::new(),
            placeholder: None,
            required: false,
            validation_enabled: false,
            validation: None,
            accept: None,
            max_size: None,
        }
    }

    /// Enable validation with the given rule text.
    pub fn with_validation(mut self, rule: impl Into<String>) -> Self {
        self.validation_enabled = true;
        self.validation = Some(rule.into());
        self
    }

    /// The rule text, if this field opts in to validation.
    ///
    /// Returns `None` when validation is disabled or the rule is blank.
    pub fn validation_rule(&self) -> Option<&str> {
        if !self.validation_enabled {
            return None;
        }
        self.validation
            .as_deref()
            .filter(|rule| !rule.trim().is_empty())
    }

    /// Build the request for a new value of this field.
    ///
    /// `None` means the validation service must not be called.
    pub fn validation_request(&self, value: impl Into<String>) -> Option<ValidationRequest> {
        self.validation_rule()
            .map(|rule| ValidationRequest::new(value, self.field_type.clone(), rule))
    }
}

/// A page of a multi-page form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormPage {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub fields: Vec<FormField>,
}

impl FormPage {
    /// Fields on this page that opt in to validation.
    pub fn validated_fields(&self) -> impl Iterator<Item = &FormField> {
        self.fields
            .iter()
            .filter(|field| field.validation_rule().is_some())
    }

    /// Look up a field by id.
    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_validation_builds_no_request() {
        let mut field = FormField::new("f1", "email");
        field.validation = Some("must be a company address".to_string());

        assert!(field.validation_rule().is_none());
        assert!(field.validation_request("a@b.com").is_none());
    }

    #[test]
    fn test_blank_rule_builds_no_request() {
        let field = FormField::new("f1", "text").with_validation("  ");
        assert!(field.validation_request("anything").is_none());

        let mut missing = FormField::new("f2", "text");
        missing.validation_enabled = true;
        assert!(missing.validation_request("anything").is_none());
    }

    #[test]
    fn test_enabled_field_builds_request() {
        let field = FormField::new("upload", "file").with_validation("must be a PDF");
        let request = field.validation_request("resume.pdf").unwrap();

        assert_eq!(request.value, "resume.pdf");
        assert_eq!(request.field_type, FieldType::File);
        assert_eq!(request.validation_rules, "must be a PDF");
    }

    #[test]
    fn test_field_wire_format() {
        let json = r#"{
            "id": "age",
            "type": "number",
            "label": "Age",
            "required": true,
            "validationEnabled": true,
            "validation": "must be between 1 and 100"
        }"#;
        let field: FormField = serde_json::from_str(json).unwrap();

        assert_eq!(field.field_type, FieldType::Number);
        assert!(field.required);
        assert_eq!(field.validation_rule(), Some("must be between 1 and 100"));
    }

    #[test]
    fn test_page_validated_fields() {
        let page = FormPage {
            id: "p1".to_string(),
            title: "Contact".to_string(),
            fields: vec![
                FormField::new("name", "text"),
                FormField::new("email", "email").with_validation("must be a valid email address"),
                FormField::new("notes", "textarea").with_validation(""),
            ],
        };

        let ids: Vec<&str> = page.validated_fields().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["email"]);
        assert!(page.field("notes").is_some());
        assert!(page.field("missing").is_none());
    }
}
