//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' exceeds {max} characters (got {actual})")]
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField {
            field: field.into(),
        }
    }

    /// Creates a too long validation error.
    pub fn too_long(field: impl Into<String>, max: usize, actual: usize) -> Self {
        ValidationError::TooLong {
            field: field.into(),
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

/// Machine-readable error codes exposed at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Client errors
    ValidationFailed,
    UnknownTool,
    NotFound,

    // Configuration errors
    TemplateError,

    // Upstream LLM errors
    LlmUnavailable,
    LlmProtocolError,
    LlmRejected,

    // Pipeline errors
    PostProcessingFailed,
    Cancelled,

    // Infrastructure errors
    StorageError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::UnknownTool => "UNKNOWN_TOOL",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::TemplateError => "TEMPLATE_ERROR",
            ErrorCode::LlmUnavailable => "LLM_UNAVAILABLE",
            ErrorCode::LlmProtocolError => "LLM_PROTOCOL_ERROR",
            ErrorCode::LlmRejected => "LLM_REJECTED",
            ErrorCode::PostProcessingFailed => "POST_PROCESSING_FAILED",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("input_text");
        assert_eq!(format!("{}", err), "Field 'input_text' cannot be empty");
    }

    #[test]
    fn validation_error_too_long_displays_correctly() {
        let err = ValidationError::too_long("input_text", 10, 12);
        assert_eq!(
            format!("{}", err),
            "Field 'input_text' exceeds 10 characters (got 12)"
        );
    }

    #[test]
    fn validation_error_reports_field() {
        assert_eq!(ValidationError::empty_field("user_id").field(), "user_id");
        assert_eq!(
            ValidationError::invalid_format("tool_id", "blank").field(),
            "tool_id"
        );
    }

    #[test]
    fn error_code_displays_screaming_snake_case() {
        assert_eq!(ErrorCode::UnknownTool.to_string(), "UNKNOWN_TOOL");
        assert_eq!(ErrorCode::LlmProtocolError.to_string(), "LLM_PROTOCOL_ERROR");
        assert_eq!(
            ErrorCode::PostProcessingFailed.to_string(),
            "POST_PROCESSING_FAILED"
        );
    }
}
