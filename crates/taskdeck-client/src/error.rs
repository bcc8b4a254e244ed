//! Error types for the HTTP client, credential storage, and configuration.

use std::io;
use std::path::PathBuf;

use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Coarse classification of request failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received.
    Transport,
    /// The server answered with a 4xx status.
    Client,
    /// The server answered with a 5xx status.
    Server,
    /// The caller aborted the request.
    Cancelled,
    /// The failure happened on this side of the wire (encoding, storage, ...).
    Local,
}

/// Primary error type for API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or transport failure before a response arrived.
    #[error("request to {path} failed")]
    Transport {
        /// Request path relative to the base URL.
        path: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("{method} {path} returned {status}")]
    Status {
        /// Request method.
        method: Method,
        /// Request path relative to the base URL.
        path: String,
        /// Response status.
        status: StatusCode,
        /// Response body, lossily decoded.
        body: String,
    },
    /// The caller's cancellation signal fired while the request was in flight.
    #[error("request to {path} was cancelled")]
    Cancelled {
        /// Request path relative to the base URL.
        path: String,
    },
    /// Regenerating the access token failed; the session was invalidated.
    #[error("access token refresh failed")]
    TokenRefresh {
        /// Failure reported by the regeneration call.
        source: Box<ApiError>,
    },
    /// Another request invalidated the session while this one waited on a refresh.
    #[error("session expired")]
    SessionExpired,
    /// The response body did not match the expected shape.
    #[error("failed to decode response from {path}")]
    Decode {
        /// Request path relative to the base URL.
        path: String,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// The request body could not be serialised.
    #[error("failed to encode request body")]
    Encode {
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// Reading or writing credential storage failed.
    #[error("credential storage failed")]
    Storage(#[from] StorageError),
    /// The request could not be assembled.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Human-readable reason.
        reason: String,
    },
}

impl ApiError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Status { status, .. } if status.is_server_error() => ErrorKind::Server,
            Self::Status { .. } | Self::SessionExpired => ErrorKind::Client,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::TokenRefresh { source } => source.kind(),
            Self::Decode { .. }
            | Self::Encode { .. }
            | Self::Storage(_)
            | Self::InvalidRequest { .. } => ErrorKind::Local,
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::TokenRefresh { source } => source.status(),
            _ => None,
        }
    }

    /// Whether the server rejected the credentials (401 or 403).
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Status {
                status: StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN,
                ..
            }
        )
    }

    /// Whether the caller cancelled the request.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Convenience alias for API results.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors raised by credential storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage io failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// File involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// Stored file could not be parsed or written as JSON.
    #[error("storage file is not valid JSON")]
    Format {
        /// File involved in the failure.
        path: PathBuf,
        /// Source serde error.
        source: serde_json::Error,
    },
}

/// Convenience alias for storage results.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised while reading client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable was not set.
    #[error("missing configuration variable")]
    Missing {
        /// Variable name.
        variable: &'static str,
    },
    /// A variable held an unusable value.
    #[error("invalid configuration variable")]
    Invalid {
        /// Variable name.
        variable: &'static str,
        /// Offending value.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    HttpClient {
        /// Source reqwest error.
        source: reqwest::Error,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
