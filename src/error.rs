// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the engine. Each
//! variant tells the story of what went wrong and where, enabling
//! composable recovery strategies (retry, re-authenticate, abort job).

use std::fmt;
use thiserror::Error;

/// Upstream ALM error conditions as a typed vocabulary.
///
/// Instead of matching against raw HTTP status codes at every call site,
/// the recovery-relevant categories are encoded in the type system: a
/// variant tells you whether the call is worth retrying, needs a fresh
/// session, or simply found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlmErrorCode {
    /// Session cookies rejected — re-authenticate and retry once
    SessionExpired,
    /// Credentials rejected outright
    Unauthorized,
    /// The requested entity does not exist
    NotFound,
    /// Upstream internal server error
    InternalError,
    /// Upstream temporarily unavailable
    ServiceUnavailable,
    /// Request rejected as malformed (bad query filter, unknown field)
    BadRequest,
    /// HTTP status fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl AlmErrorCode {
    /// Classify an HTTP status into the typed vocabulary.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 => Self::SessionExpired,
            403 => Self::Unauthorized,
            404 => Self::NotFound,
            400 => Self::BadRequest,
            500 => Self::InternalError,
            502 | 503 | 504 => Self::ServiceUnavailable,
            other => Self::HttpStatus(other),
        }
    }

    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InternalError | Self::ServiceUnavailable | Self::HttpStatus(500..=599)
        )
    }

    /// Whether this error means the session needs renewing.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Whether this error means the entity simply doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl fmt::Display for AlmErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionExpired => write!(f, "session_expired"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::NotFound => write!(f, "not_found"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("ALM returned an error ({code}): {message}")]
    AlmService { code: AlmErrorCode, message: String },

    #[error("Authentication failed for {username}: {message}")]
    AuthenticationFailed { username: String, message: String },

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("No storage collection routes entity kind '{kind}' under parent '{parent}'")]
    UnroutableEntity { kind: String, parent: String },

    #[error("Storage operation failed on collection '{collection}': {cause}")]
    Storage { collection: String, cause: String },

    #[error("Extraction job {0} not found")]
    JobNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AppError {
    /// Whether the retry policy may re-issue the failed operation.
    ///
    /// Network-level failures (timeouts, resets) and upstream 5xx responses
    /// are transient; everything else either needs a different recovery
    /// (session renewal) or is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkFailure(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::AlmService { code, .. } => code.is_retryable(),
            _ => false,
        }
    }

    /// Whether the failed call should be retried once after renewing the
    /// upstream session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::AlmService { code, .. } if code.is_session_expired())
    }
}

// Allow converting from anyhow::Error, preserving the message
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: err.to_string(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
