//! Error types for vibecheck modules using thiserror.

use std::time::Duration;

use thiserror::Error;

/// Errors from a single round trip to a model backend.
///
/// These never reach callers of [`crate::VibeClient`]: the retry loop logs
/// them and counts the attempt as rejected.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimited { message: String },

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Failed to parse backend response: {0}")]
    ParseFailed(String),

    #[error("Backend configuration error: {0}")]
    Configuration(String),
}

impl BackendError {
    /// Map a failed HTTP exchange onto a backend error.
    ///
    /// `timeout` is the client's configured request timeout, reported when the
    /// exchange ran out of time.
    pub fn from_transport(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            BackendError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            BackendError::Network(error)
        }
    }

    /// Map a non-success HTTP status and body onto a backend error.
    ///
    /// Both Gemini and OpenAI wrap failures as `{"error": {"message": ...}}`;
    /// the raw body is used when that shape is absent.
    pub fn from_status_and_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.to_string());

        match status {
            401 | 403 => BackendError::AuthenticationFailed { message },
            429 => BackendError::RateLimited { message },
            500..=599 => BackendError::ServerError { status, message },
            _ => BackendError::InvalidRequest {
                message: format!("HTTP {status}: {message}"),
            },
        }
    }
}

/// The model never produced an acceptable answer within the configured attempts.
///
/// Transport failures and unusable answers are deliberately not told apart here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unable to get a valid response matching {expected} after {attempts} attempt(s)")]
pub struct ResponseTypeError {
    /// Description of the expected shape, e.g. `bool` or `list[int]`.
    pub expected: String,
    pub attempts: u32,
}

/// Errors from resolving invocation configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("num_tries must be at least 1 (got {0})")]
    InvalidNumTries(u32),

    #[error("backoff_base must be a positive number of seconds (got {0})")]
    InvalidBackoffBase(f64),

    #[error("backoff_max ({max}) must be at least backoff_base ({base})")]
    InvalidBackoffMax { base: f64, max: f64 },

    #[error("timeout_ms must be greater than zero")]
    InvalidTimeout,

    #[error("Unknown provider '{0}'. Expected one of: gemini, openai")]
    UnknownProvider(String),
}

/// Errors from parsing function signatures and type annotations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid function signature: {0}")]
    InvalidSignature(String),

    #[error("Unsupported type annotation '{0}'")]
    UnsupportedType(String),

    #[error("Invalid parameter '{0}'")]
    InvalidParameter(String),
}
