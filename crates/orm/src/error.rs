//! Error types for model operations
//!
//! Every failure a model raises is a `ModelError`. The four operation
//! failures carry an `ErrorCode` so callers can match on them even when a
//! model replaces the default error value with its own.

use std::collections::HashMap;
use std::fmt;

use crate::event_error::EventError;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Operation failures a model can raise on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `save` was called with nothing but the id field
    NothingToSave,
    /// `save_and_fetch` did not get a record back from `save`
    FailedToSave,
    /// `fetch_or_fail` found no matching row
    RecordNotFound,
    /// `delete` on a model with neither a delete strategy nor a deleted field
    DeleteNotImplemented,
}

impl ErrorCode {
    /// The tag used as the default error message
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NothingToSave => "NOTHING_TO_SAVE",
            ErrorCode::FailedToSave => "FAILED_TO_SAVE",
            ErrorCode::RecordNotFound => "RECORD_NOT_FOUND",
            ErrorCode::DeleteNotImplemented => "DELETE_NOT_IMPLEMENTED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for model operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// Default error for an operation failure, displayed as its tag
    #[error("{0}")]
    Operation(ErrorCode),

    /// Model-specific replacement for an operation failure
    #[error("{message}")]
    Custom { code: ErrorCode, message: String },

    /// Database connection or statement error
    #[error("Database error: {0}")]
    Database(String),

    /// Row could not be converted to or from the record type
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid model or connection configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transaction begin/commit/rollback failed or the handle was already consumed
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// An event observer failed
    #[error("Event error: {0}")]
    Event(String),
}

impl ModelError {
    /// Create a model-specific error for an operation failure
    pub fn custom(code: ErrorCode, message: impl Into<String>) -> Self {
        ModelError::Custom {
            code,
            message: message.into(),
        }
    }

    /// The operation failure this error stands for, if any
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ModelError::Operation(code) => Some(*code),
            ModelError::Custom { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Check whether this error stands for the given operation failure
    pub fn is(&self, code: ErrorCode) -> bool {
        self.code() == Some(code)
    }
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<EventError> for ModelError {
    fn from(err: EventError) -> Self {
        ModelError::Event(err.to_string())
    }
}

/// Per-model table of error values replacing the defaults
#[derive(Debug, Clone, Default)]
pub struct ErrorOverrides {
    errors: HashMap<ErrorCode, ModelError>,
}

impl ErrorOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the error raised for `code`
    pub fn insert(&mut self, code: ErrorCode, error: ModelError) {
        self.errors.insert(code, error);
    }

    /// The error to raise for `code`: the override when present, else the default
    pub fn resolve(&self, code: ErrorCode) -> ModelError {
        self.errors
            .get(&code)
            .cloned()
            .unwrap_or(ModelError::Operation(code))
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_error_displays_tag() {
        let error = ModelError::Operation(ErrorCode::NothingToSave);
        assert_eq!(error.to_string(), "NOTHING_TO_SAVE");
        assert_eq!(
            ModelError::Operation(ErrorCode::DeleteNotImplemented).to_string(),
            "DELETE_NOT_IMPLEMENTED"
        );
    }

    #[test]
    fn test_overrides_resolve_to_custom_error() {
        let mut overrides = ErrorOverrides::new();
        overrides.insert(
            ErrorCode::RecordNotFound,
            ModelError::custom(ErrorCode::RecordNotFound, "user not found"),
        );

        let error = overrides.resolve(ErrorCode::RecordNotFound);
        assert_eq!(error.to_string(), "user not found");
        assert!(error.is(ErrorCode::RecordNotFound));

        let fallback = overrides.resolve(ErrorCode::FailedToSave);
        assert!(matches!(fallback, ModelError::Operation(ErrorCode::FailedToSave)));
    }

    #[test]
    fn test_code_is_none_for_storage_errors() {
        let error = ModelError::Database("connection reset".to_string());
        assert_eq!(error.code(), None);
        assert!(!error.is(ErrorCode::RecordNotFound));
    }

    #[test]
    fn test_conversion_from_serde_error() {
        let serde_error = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        let error: ModelError = serde_error.into();
        assert!(matches!(error, ModelError::Serialization(_)));
    }
}
