//! Backend payload and failure types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Successful backend response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloPayload {
    pub message: String,
    /// ISO-8601 timestamp produced by the backend.
    pub timestamp: String,
}

impl HelloPayload {
    pub fn new(message: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Discriminant of a [`BackendFailure`], as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    NetworkError,
    BadStatus,
    InvalidPayload,
    Timeout,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NetworkError => "NetworkError",
            FailureKind::BadStatus => "BadStatus",
            FailureKind::InvalidPayload => "InvalidPayload",
            FailureKind::Timeout => "Timeout",
        }
    }
}

/// Every way a single backend call can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendFailure {
    /// DNS, connect, TLS, or reset before a complete response was read.
    #[error("Network error: {detail}")]
    Network { detail: String },

    /// Response status outside `[200, 300)`.
    #[error("Backend returned status {status_code}")]
    BadStatus { status_code: u16, body: String },

    /// 2xx response whose body is not a `{message, timestamp}` object.
    #[error("Invalid response format: {detail}")]
    InvalidPayload {
        status_code: u16,
        body: String,
        detail: String,
    },

    /// Deadline expired; the request was aborted.
    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl BackendFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            BackendFailure::Network { .. } => FailureKind::NetworkError,
            BackendFailure::BadStatus { .. } => FailureKind::BadStatus,
            BackendFailure::InvalidPayload { .. } => FailureKind::InvalidPayload,
            BackendFailure::Timeout { .. } => FailureKind::Timeout,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            BackendFailure::BadStatus { status_code, .. }
            | BackendFailure::InvalidPayload { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            BackendFailure::BadStatus { body, .. } | BackendFailure::InvalidPayload { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }
}

/// Outcome of one backend call.
pub type BackendResult = Result<HelloPayload, BackendFailure>;

/// Validate a response body as a [`HelloPayload`].
///
/// The body must be a JSON object whose `message` and `timestamp` are both
/// strings. Extra fields are ignored.
pub fn parse_payload(body: &str) -> Result<HelloPayload, String> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| format!("Failed to parse response: {}", e))?;

    let object = value
        .as_object()
        .ok_or_else(|| "response is not a JSON object".to_string())?;

    let field = |name: &str| {
        object
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| format!("missing string field '{}'", name))
    };

    Ok(HelloPayload {
        message: field("message")?,
        timestamp: field("timestamp")?,
    })
}

/// Shorten a body for log fields. The full body is kept on the failure.
pub fn truncate_for_log(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
