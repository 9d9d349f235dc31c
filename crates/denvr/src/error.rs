//! Error types for Denvr API operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while talking to the Denvr API.
#[derive(Error, Debug)]
pub enum DenvrError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status}{}", .message.as_deref().map(|m| format!(" - {m}")).unwrap_or_default())]
    Api {
        status: StatusCode,
        message: Option<String>,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Authentication failed or credentials are unusable.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// An operation was called with arguments it cannot use.
    #[error("Invalid arguments for {operation}: {reason}")]
    InvalidArguments {
        operation: &'static str,
        reason: String,
    },

    /// The API answered successfully but the payload is missing data we rely on.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl DenvrError {
    /// HTTP status of an API error, if this is one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = DenvrError::Api {
            status: StatusCode::NOT_FOUND,
            message: Some("The application 'my-missing-app' could not be found.".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "API error: 404 Not Found - The application 'my-missing-app' could not be found."
        );

        let err = DenvrError::Api {
            status: StatusCode::BAD_GATEWAY,
            message: None,
        };
        assert_eq!(err.to_string(), "API error: 502 Bad Gateway");
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    }
}
