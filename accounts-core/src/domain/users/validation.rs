//! Field-level validation errors shared by the manager and request payloads.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Key used for errors that do not belong to a single input field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const MIN_PASSWORD_CHARS: usize = 5;
pub const MAX_EMAIL_CHARS: usize = 255;
pub const MAX_NAME_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Users must have an email address.")]
    MissingEmail,

    #[error("Enter a valid email address.")]
    InvalidEmail,

    #[error("Ensure this field has at least {min} characters.")]
    PasswordTooShort { min: usize },

    #[error("Ensure this field has no more than {max} characters.")]
    TooLong { field: &'static str, max: usize },

    #[error("This field is required.")]
    Required { field: &'static str },

    #[error("This field may not be blank.")]
    Blank { field: &'static str },
}

impl ValidationError {
    /// Name of the input field the error is reported against.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingEmail | Self::InvalidEmail => "email",
            Self::PasswordTooShort { .. } => "password",
            Self::TooLong { field, .. }
            | Self::Required { field }
            | Self::Blank { field } => field,
        }
    }
}

/// Validation messages keyed by field name.
///
/// Serializes as a plain JSON object, e.g.
/// `{"password": ["Ensure this field has at least 5 characters."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single message not tied to any field.
    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(NON_FIELD_ERRORS, message);
        errors
    }

    pub fn push(&mut self, error: ValidationError) {
        self.add(error.field(), error.to_string());
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(value)` when no errors were collected.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<ValidationError> for FieldErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.push(error);
        errors
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_messages_per_field() {
        let mut errors = FieldErrors::new();
        errors.push(ValidationError::PasswordTooShort { min: 5 });
        errors.push(ValidationError::Required { field: "email" });

        assert!(errors.contains("password"));
        assert_eq!(errors.messages("email"), ["This field is required."]);
        assert!(errors.messages("name").is_empty());
    }

    #[test]
    fn serializes_as_plain_object() {
        let errors = FieldErrors::non_field("nope");
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value, serde_json::json!({ "non_field_errors": ["nope"] }));
    }

    #[test]
    fn into_result_passes_value_through_when_clean() {
        assert_eq!(FieldErrors::new().into_result(7), Ok(7));
        assert!(FieldErrors::non_field("x").into_result(7).is_err());
    }
}
