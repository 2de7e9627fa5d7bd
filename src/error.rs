//! Error types for fetchq
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (store, fetch executor)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for fetchq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fetchq
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing submission fields, or an out-of-range page number
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable description of what is invalid
        message: String,
        /// The request fields the error applies to
        fields: Vec<String>,
    },

    /// Requested task key is absent
    #[error("task not found: {0}")]
    NotFound(String),

    /// Task store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Outbound fetch failed inside a worker
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Task record serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The worker job queue stayed full past the enqueue timeout
    #[error("job queue full: submission rejected")]
    QueueFull,

    /// The worker pool has shut down and is not accepting jobs
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServer(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a validation error for the given fields
    pub fn validation(message: impl Into<String>, fields: &[&str]) -> Self {
        Error::Validation {
            message: message.into(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}

/// Task store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to open or connect to the backing store
    #[error("failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// A store operation failed
    #[error("store operation failed: {0}")]
    QueryFailed(String),
}

/// Fetch executor errors
///
/// Failures of the outbound request performed by a worker. These are never
/// surfaced to API clients directly; workers persist them as the `error`
/// field of a terminal task record.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The submitted HTTP method is not a valid token
    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),

    /// The submitted address is not a valid absolute URL
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress {
        /// The address that failed to parse
        address: String,
        /// Why it failed to parse
        reason: String,
    },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The request did not complete within the configured timeout
    #[error("request timed out after {seconds}s")]
    TimedOut {
        /// The configured timeout in seconds
        seconds: u64,
    },

    /// The request failed (connection, protocol, malformed header, ...)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// API error response format
///
/// Returned by API endpoints when an error occurs. Machine-readable code,
/// human-readable message, optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "validation_error",
///     "message": "missing required fields",
///     "details": {
///       "fields": ["address"]
///     }
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
    /// Machine-readable error code (e.g., "not_found", "validation_error")
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

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
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

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create a "service unavailable" error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new("service_unavailable", message)
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
            // 400 Bad Request - invalid input
            Error::Validation { .. } => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 500 Internal Server Error - server-side issues, surfaced opaque
            Error::Store(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServer(_) => 500,
            Error::Io(_) => 500,

            // 502 Bad Gateway - upstream fetch failures
            Error::Fetch(_) => 502,

            // 503 Service Unavailable - backpressure and shutdown
            Error::QueueFull => 503,
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Validation { .. } => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::Store(_) => "store_error",
            Error::Fetch(_) => "fetch_error",
            Error::Serialization(_) => "serialization_error",
            Error::QueueFull => "queue_full",
            Error::ShuttingDown => "shutting_down",
            Error::ApiServer(_) => "api_server_error",
            Error::Io(_) => "io_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Validation { fields, .. } if !fields.is_empty() => Some(serde_json::json!({
                "fields": fields,
            })),
            _ => None,
        };

        match details {
            Some(details) => ApiError::with_details(code, message, details),
            None => ApiError::new(code, message),
        }
    }
}
