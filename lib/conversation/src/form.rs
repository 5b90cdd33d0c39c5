//! Form prompts and typed submission values.

use crate::action::{FormKind, custom_id};
use crate::error::FlowError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable identifier of a text input within a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    /// Question text in the setup wizard and the question dashboard.
    QuestionText,
    /// A participant's answer to a report question.
    AnswerText,
}

/// Submitted form values keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(HashMap<FormField, String>);

impl FormValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: FormField, value: impl Into<String>) -> Self {
        self.0.insert(field, value.into());
        self
    }

    /// The trimmed value of a field; absent fields read as empty.
    #[must_use]
    pub fn text(&self, field: FormField) -> &str {
        self.0.get(&field).map_or("", |v| v.trim())
    }

    /// The trimmed value of a field that must not be empty.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the field is missing or blank.
    pub fn required(&self, field: FormField) -> Result<&str, FlowError> {
        let text = self.text(field);
        if text.is_empty() {
            return Err(FlowError::validation("Please enter some text before submitting."));
        }
        Ok(text)
    }
}

/// Visual size of a text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputStyle {
    Short,
    Paragraph,
}

/// One text input inside a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInput {
    pub field: FormField,
    pub label: String,
    pub style: InputStyle,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Prefilled value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u16>,
}

/// A modal form prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    #[serde(rename = "custom_id", with = "custom_id")]
    pub kind: FormKind,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

/// Truncates to at most `max` characters, ending with "..." when shortened.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_trimmed() {
        let values = FormValues::new().with(FormField::AnswerText, "  done  ");
        assert_eq!(values.text(FormField::AnswerText), "done");
        assert_eq!(values.text(FormField::QuestionText), "");
    }

    #[test]
    fn required_rejects_blank() {
        let values = FormValues::new().with(FormField::AnswerText, "   ");
        assert!(matches!(
            values.required(FormField::AnswerText),
            Err(FlowError::Validation { .. })
        ));
    }

    #[test]
    fn values_deserialize_from_field_map() {
        let values: FormValues =
            serde_json::from_str(r#"{"question_text":"What blocked you?"}"#).expect("decode");
        assert_eq!(values.text(FormField::QuestionText), "What blocked you?");
    }

    #[test]
    fn truncate_respects_limit() {
        assert_eq!(truncate("short", 45), "short");
        let long = "x".repeat(50);
        let cut = truncate(&long, 45);
        assert_eq!(cut.chars().count(), 45);
        assert!(cut.ends_with("..."));
    }
}
