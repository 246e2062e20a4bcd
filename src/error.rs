//! # Harness Error Types
//!
//! Unified error handling for the task client, poller and configuration layers.
//! Errors never cross invocation boundaries: the poller and the concurrency
//! driver turn them into [`Outcome`](crate::models::Outcome) values.

use thiserror::Error;

/// Harness operation result type
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error taxonomy for talking to the remote task service
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-2xx answer to a task submission. Fatal for that invocation.
    #[error("Task creation rejected: {status} - {message}")]
    Creation { status: u16, message: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// 401/403 from the service. Never retried.
    #[error("Authentication failed: {status} - {message}")]
    Auth { status: u16, message: String },

    #[error("Unknown task status: {0}")]
    UnknownStatus(String),

    #[error("Invalid response: {field} - {reason}")]
    InvalidResponse { field: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HarnessError {
    /// Create an API error from an HTTP status, routing auth failures to [`HarnessError::Auth`]
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => Self::Auth {
                status,
                message: message.into(),
            },
            _ => Self::Api {
                status,
                message: message.into(),
            },
        }
    }

    /// Create a creation error, routing auth failures to [`HarnessError::Auth`]
    pub fn creation_error(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => Self::api_error(status, message),
            _ => Self::Creation {
                status,
                message: message.into(),
            },
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_response(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status carried by the error, if the service answered at all
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Creation { status, .. }
            | Self::Api { status, .. }
            | Self::Auth { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Check if a failed status check is worth another attempt within the poll budget
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(e) => !e
                .status()
                .is_some_and(|s| s.as_u16() == 401 || s.as_u16() == 403),
            Self::Api { .. } | Self::Serialization(_) | Self::InvalidResponse { .. } => true,
            // The service is reachable but speaks a vocabulary we do not know
            Self::UnknownStatus(_) => false,
            Self::Auth { .. } | Self::Creation { .. } | Self::Config(_) | Self::Internal(_) => false,
        }
    }
}

impl From<config::ConfigError> for HarnessError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
