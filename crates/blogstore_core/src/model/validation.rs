//! Field-level validation shared by model types.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation error raised before any SQL write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Required text field is empty after trimming.
    EmptyField(&'static str),
    /// Text field exceeds its maximum length in characters.
    FieldTooLong { field: &'static str, max_chars: usize },
    /// Email does not look like `local@domain.tld`.
    InvalidEmail,
    /// Id must be a positive store-assigned value.
    InvalidId { field: &'static str, value: i64 },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` must not be empty"),
            Self::FieldTooLong { field, max_chars } => {
                write!(f, "`{field}` must be at most {max_chars} characters")
            }
            Self::InvalidEmail => write!(f, "`email` is not a valid address"),
            Self::InvalidId { field, value } => {
                write!(f, "`{field}` must be a positive id, got {value}")
            }
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::EmptyField(field));
    }
    check_length(field, value, max_chars)
}

pub(crate) fn check_length(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ModelValidationError> {
    if value.chars().count() > max_chars {
        return Err(ModelValidationError::FieldTooLong { field, max_chars });
    }
    Ok(())
}

pub(crate) fn require_id(field: &'static str, value: i64) -> Result<(), ModelValidationError> {
    if value <= 0 {
        return Err(ModelValidationError::InvalidId { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_length, require_id, require_text, ModelValidationError};

    #[test]
    fn require_text_rejects_blank_values() {
        assert_eq!(
            require_text("name", "   ", 10),
            Err(ModelValidationError::EmptyField("name"))
        );
    }

    #[test]
    fn check_length_counts_chars_not_bytes() {
        assert!(check_length("name", "ééééé", 5).is_ok());
        assert!(check_length("name", "éééééé", 5).is_err());
    }

    #[test]
    fn require_id_rejects_zero_and_negative() {
        assert!(require_id("id", 0).is_err());
        assert!(require_id("id", -3).is_err());
        assert!(require_id("id", 1).is_ok());
    }
}
