//! Validation error types and text field helpers

use std::fmt;

/// Validation error for request fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is missing or blank
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Value doesn't match the required format
    InvalidFormat { field: &'static str, reason: String },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Number outside the accepted range
    OutOfRange { field: &'static str, min: i64, max: i64 },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field }
            | Self::TooLong { field, .. }
            | Self::InvalidFormat { field, .. }
            | Self::InvalidVariant { field, .. }
            | Self::OutOfRange { field, .. } => field,
        }
    }

    pub fn invalid_format(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::OutOfRange { field, min, max } => {
                write!(f, "{} must be between {} and {}", field, min, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Trimmed, non-empty text of at most `max` characters.
pub fn required_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    check_length(field, value, max)?;
    if value.chars().any(char::is_control) {
        return Err(ValidationError::invalid_format(field, "must not contain control characters"));
    }
    Ok(value.to_owned())
}

/// Optional free text: blank becomes `None`, newlines are allowed.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            check_length(field, value, max)?;
            Ok(Some(value.to_owned()))
        }
    }
}

/// Positive database identifier.
pub fn positive_id(field: &'static str, value: i64) -> Result<i64, ValidationError> {
    if value < 1 {
        return Err(ValidationError::OutOfRange {
            field,
            min: 1,
            max: i64::MAX,
        });
    }
    Ok(value)
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "word",
            max: 100,
        };
        assert_eq!(err.to_string(), "word exceeds maximum length of 100 characters");
        assert_eq!(err.field(), "word");
    }

    #[test]
    fn required_text_trims() {
        assert_eq!(required_text("name", "  Oxford  ", 10).unwrap(), "Oxford");
        assert_eq!(
            required_text("name", "   ", 10).unwrap_err(),
            ValidationError::Empty { field: "name" }
        );
        assert!(matches!(
            required_text("name", "abc\u{7}", 10),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        assert!(required_text("word", "你好你好", 4).is_ok());
        assert!(required_text("word", "你好你好你", 4).is_err());
    }

    #[test]
    fn optional_text_blank_is_none() {
        assert_eq!(optional_text("meaning", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("meaning", None, 10).unwrap(), None);
        assert_eq!(
            optional_text("meaning", Some("line one\nline two"), 40).unwrap(),
            Some("line one\nline two".to_owned())
        );
    }

    #[test]
    fn ids_must_be_positive() {
        assert!(positive_id("id", 1).is_ok());
        assert!(matches!(positive_id("id", 0), Err(ValidationError::OutOfRange { .. })));
    }
}
