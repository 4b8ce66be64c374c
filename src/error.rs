//! Error types for the client core
//!
//! Errors are grouped by where they come from: the HTTP boundary, input
//! validation, or a reference the UI asked for that is not loaded. None of
//! them are fatal; the renderer turns each one into a toast.

use thiserror::Error;

/// Failure talking to the backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Input rejected before any request is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("tag name '{0}' must not contain a comma")]
    CommaInTagName(String),
    #[error("{field} is too long ({len} > {max} characters)")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Short message suitable for a toast
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(ApiError::Transport(_)) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            AppError::Api(ApiError::Status { status, .. }) if *status >= 500 => {
                format!("The server had a problem ({}). Try again shortly.", status)
            }
            AppError::Api(err) => format!("Request failed: {}", err),
            AppError::Validation(err) => err.to_string(),
            AppError::NotFound { kind, id } => format!("{} '{}' no longer exists", kind, id),
            AppError::Config(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_transport_details() {
        let err = AppError::from(ApiError::Transport("dns failure".to_string()));
        assert!(!err.user_message().contains("dns"));
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = AppError::from(ValidationError::CommaInTagName("a,b".to_string()));
        assert_eq!(err.user_message(), "tag name 'a,b' must not contain a comma");
    }

    #[test]
    fn test_server_errors_are_flagged() {
        let err = AppError::from(ApiError::Status {
            status: 503,
            body: String::new(),
        });
        assert!(err.user_message().contains("503"));
    }
}
