//! Error types for Dialer Core.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for Dialer operations
pub type DialerResult<T> = Result<T, DialerError>;

/// Main error type for Dialer operations
#[derive(Error, Debug)]
pub enum DialerError {
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DialerError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DialerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True when the key/value backend failed during a mutation.
    pub fn is_write_fault(&self) -> bool {
        matches!(self, DialerError::Persistence(_))
    }
}

/// Errors raised by a [`KeyValuePersistence`](crate::persistence::KeyValuePersistence) backend.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Backend cannot be reached (not mounted, not initialised)
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Backend refused the operation
    #[error("storage access denied: {0}")]
    Denied(String),

    /// Backend is out of space
    #[error("storage full: {0}")]
    Full(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialer_error_validation() {
        let err = DialerError::validation("field", "message");
        assert!(matches!(err, DialerError::Validation { .. }));
        assert!(!err.is_write_fault());
    }

    #[test]
    fn test_persistence_error_converts() {
        let err: DialerError = PersistenceError::Full("quota exceeded".to_string()).into();
        assert!(err.is_write_fault());
        assert_eq!(
            err.to_string(),
            "Persistence error: storage full: quota exceeded"
        );
    }
}
