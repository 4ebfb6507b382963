//! Input validation for document requests.
//!
//! Errors carry a field name, a message and an optional hint so the template
//! editor can show them next to the offending input.

use std::fmt;

/// Trait for validating request objects.
pub trait Validator {
    fn validate(&self) -> Result<(), String>;
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    /// How to fix it
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn not_positive(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} must be a positive id", label))
            .with_suggestion(format!("Pick an existing {}", label.to_lowercase()))
    }

    pub fn missing(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} is required", label))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.message())
        }
    }
}

/// Adds an error when `value` is present and not a positive id.
pub fn validate_optional_id(value: Option<i64>, field: &str, label: &str, errors: &mut ValidationErrors) {
    if let Some(id) = value {
        if id <= 0 {
            errors.add(ValidationError::not_positive(field, label));
        }
    }
}

pub fn validate_id(value: i64, field: &str, label: &str, errors: &mut ValidationErrors) {
    validate_optional_id(Some(value), field, label, errors);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_all_errors() {
        let mut errors = ValidationErrors::new();
        validate_id(0, "template_id", "Template", &mut errors);
        validate_optional_id(Some(-4), "letterhead_company_id", "Company", &mut errors);
        validate_optional_id(None, "client_id", "Client", &mut errors);
        validate_optional_id(Some(7), "unit_id", "Unit", &mut errors);

        assert_eq!(errors.len(), 2);
        let message = errors.into_result().unwrap_err();
        assert!(message.contains("[template_id] Template must be a positive id"));
        assert!(message.contains("[letterhead_company_id]"));
    }

    #[test]
    fn test_empty_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
