//! Client error types.

use thiserror::Error;

/// Client-wide result type.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced to callers of the API client.
///
/// Every failed call resolves to exactly one of these. Side effects tied to a
/// failure (toast, session wipe, redirect) have already happened by the time
/// the caller sees the error.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 that was not recovered by a credential refresh.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The refresh credential was missing or rejected - re-login required.
    #[error("Credential refresh failed: {reason}")]
    RefreshFailed { reason: String },

    /// The server reported that the caller lacks rights for the action.
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Any 5xx response.
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// 404 response.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Any other non-success response.
    #[error("Request failed ({status}): {message}")]
    Other { status: u16, message: String },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// JSON encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Session persistence I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    pub fn refresh_failed(reason: impl Into<String>) -> Self {
        Self::RefreshFailed {
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// HTTP status carried by this error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::ServerError { status, .. } | Self::Other { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error ended the session and requires a new login.
    pub fn requires_relogin(&self) -> bool {
        matches!(
            self,
            Self::RefreshFailed { .. } | Self::PermissionDenied { .. }
        )
    }

    /// Check if this error is transient and may be retried by the caller.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::ServerError { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
