//! Validation errors.

use std::fmt;
use thiserror::Error;

/// ValidationError is one way a value fails to match its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("{path}: field not declared in schema: {field}")]
    UnknownField { path: String, field: String },

    #[error("{path}: associative list item is missing key {key}")]
    MissingKey { path: String, key: String },

    #[error("{path}: duplicate entry {element}")]
    Duplicate { path: String, element: String },

    #[error("{path}: non-finite number {value}")]
    NonFinite { path: String, value: String },

    #[error("{message}")]
    Schema { message: String },
}

impl ValidationError {
    pub fn type_mismatch(
        path: impl ToString,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        ValidationError::TypeMismatch {
            path: path.to_string(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn unknown_field(path: impl ToString, field: impl Into<String>) -> Self {
        ValidationError::UnknownField {
            path: path.to_string(),
            field: field.into(),
        }
    }

    pub fn missing_key(path: impl ToString, key: impl Into<String>) -> Self {
        ValidationError::MissingKey {
            path: path.to_string(),
            key: key.into(),
        }
    }

    pub fn duplicate(path: impl ToString, element: impl ToString) -> Self {
        ValidationError::Duplicate {
            path: path.to_string(),
            element: element.to_string(),
        }
    }

    pub fn non_finite(path: impl ToString, value: f64) -> Self {
        ValidationError::NonFinite {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        ValidationError::Schema {
            message: message.into(),
        }
    }
}

/// ValidationErrors collects every problem found in one value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        ValidationErrors::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Ok if nothing was collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        ValidationErrors {
            errors: vec![error],
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
