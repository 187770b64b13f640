//! Error types for channel-clone
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Job, Client, Config, Storage)
//! - HTTP status code mapping for the control API
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for channel-clone operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for channel-clone
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "page_size")
        key: Option<String>,
    },

    /// Per-user storage is unreadable or holds malformed data
    #[error("storage error: {0}")]
    Storage(String),

    /// Messaging platform error
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Job lifecycle error
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Notification sink rejected a message
    #[error("notification error: {0}")]
    Notification(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Job lifecycle errors
#[derive(Debug, Error)]
pub enum JobError {
    /// The user already owns a non-terminal job
    #[error("a clone job is already running for user {user_id}")]
    AlreadyRunning {
        /// The user whose job is active
        user_id: i64,
    },

    /// Resume requested but the sent log is absent or empty
    #[error("nothing to resume for user {user_id}")]
    NothingToResume {
        /// The user that asked to resume
        user_id: i64,
    },

    /// Credentials (api_id, api_hash, phone) are not configured
    #[error("missing credentials for user {user_id}")]
    MissingCredentials {
        /// The user with incomplete credentials
        user_id: i64,
    },

    /// Source or target channel is not configured
    #[error("missing source or target channel for user {user_id}")]
    MissingChannels {
        /// The user with incomplete channel configuration
        user_id: i64,
    },
}

/// Messaging platform errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Session could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// Session exists but is not logged in
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// Channel id is malformed or inaccessible
    #[error("cannot resolve channel {channel}: {reason}")]
    Resolve {
        /// The channel id as configured
        channel: String,
        /// Why resolution failed
        reason: String,
    },

    /// History page request failed
    #[error("history request failed: {0}")]
    History(String),

    /// Media download failed
    #[error("media download failed: {0}")]
    Download(String),

    /// Sending text or a file to the target failed
    #[error("send failed: {0}")]
    Send(String),

    /// Local file error while transferring media
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "already_running",
///     "message": "job error: a clone job is already running for user 42",
///     "details": { "user_id": 42 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "already_running")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,

            Error::NotFound(_) => 404,
            Error::Job(JobError::NothingToResume { .. }) => 404,

            Error::Job(JobError::AlreadyRunning { .. }) => 409,

            Error::Job(JobError::MissingCredentials { .. })
            | Error::Job(JobError::MissingChannels { .. }) => 422,

            Error::Storage(_)
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::ApiServerError(_)
            | Error::Other(_) => 500,

            Error::Client(_) | Error::Network(_) | Error::Notification(_) => 502,

            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Storage(_) => "storage_error",
            Error::Client(_) => "client_error",
            Error::Job(e) => match e {
                JobError::AlreadyRunning { .. } => "already_running",
                JobError::NothingToResume { .. } => "nothing_to_resume",
                JobError::MissingCredentials { .. } => "missing_credentials",
                JobError::MissingChannels { .. } => "missing_channels",
            },
            Error::Io(_) => "io_error",
            Error::NotFound(_) => "not_found",
            Error::ShuttingDown => "shutting_down",
            Error::Network(_) => "network_error",
            Error::Notification(_) => "notification_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Job(
                JobError::AlreadyRunning { user_id }
                | JobError::NothingToResume { user_id }
                | JobError::MissingCredentials { user_id }
                | JobError::MissingChannels { user_id },
            ) => Some(serde_json::json!({ "user_id": user_id })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            _ => None,
        };

        Self {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
