//! Error Types
//!
//! Typed failures for the backend seam, schema decoding and form validation.
//! The data-access layer flattens all of them into the `error` string of an
//! `ApiResponse`.

use thiserror::Error;

/// Common result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Failures reported by a `Backend` implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned {code}: {message}")]
    Status { code: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Map an HTTP status and message the way PostgREST reports them
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            401 | 403 => BackendError::PermissionDenied(message),
            404 | 406 => BackendError::NotFound(message),
            _ => BackendError::Status { code, message },
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// A backend row that does not match its record schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("malformed {table} row: {message}")]
    Malformed { table: &'static str, message: String },
    #[error("invalid {table}.{field}: {message}")]
    Invalid {
        table: &'static str,
        field: &'static str,
        message: String,
    },
}

/// A single user-input field that failed local validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Anything a data-access call can fail with before it is flattened
/// into an `ApiResponse` error string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            BackendError::from_status(403, "rls"),
            BackendError::PermissionDenied(_)
        ));
        assert!(matches!(
            BackendError::from_status(406, "no rows"),
            BackendError::NotFound(_)
        ));
        assert_eq!(
            BackendError::from_status(500, "boom").to_string(),
            "backend returned 500: boom"
        );
    }
}
