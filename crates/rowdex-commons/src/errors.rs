//! Shared error types for rowdex.
//!
//! `ConvertError` is raised when a persisted field map cannot be turned back into an
//! entity (missing field, field of the wrong kind).
//!
//! ## Example Usage
//!
//! ```rust
//! use rowdex_commons::{ConvertError, FieldMap};
//!
//! let fields = FieldMap::new();
//! let err = fields.get_i32("DepartmentId").unwrap_err();
//! assert!(matches!(err, ConvertError::MissingField(_)));
//! ```

use thiserror::Error;

use crate::models::FieldKind;

/// Result type alias for field conversions.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors produced while mapping between entities and field maps.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Field '{field}' has kind {actual}, expected {expected}")]
    KindMismatch {
        field: String,
        expected: FieldKind,
        actual: FieldKind,
    },

    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ConvertError {
    /// Convenience constructor for a missing field.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Convenience constructor for an invalid value.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConvertError::missing("Name");
        assert_eq!(err.to_string(), "Missing field: Name");

        let err = ConvertError::KindMismatch {
            field: "Id".to_string(),
            expected: FieldKind::Guid,
            actual: FieldKind::String,
        };
        assert_eq!(err.to_string(), "Field 'Id' has kind String, expected Guid");
    }
}
