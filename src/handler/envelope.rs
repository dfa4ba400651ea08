//! Response envelope returned to the invocation caller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ConfigError;
use crate::gateway::{BackendFailure, HelloPayload};

/// Caller-facing error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// Unsupported operation requested; caller-caused.
    InvalidField,
    /// Configuration problem or unexpected defect; operator-caused.
    InternalError,
    /// The backend call failed; dependency-caused.
    BackendError,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::InvalidField => "InvalidField",
            ErrorType::InternalError => "InternalError",
            ErrorType::BackendError => "BackendError",
        }
    }
}

/// Error shape of the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub message: String,
    pub error_type: ErrorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_info: Option<Map<String, Value>>,
}

impl ErrorEnvelope {
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type,
            error_info: None,
        }
    }

    pub fn with_info(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.error_info
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn unsupported_field(name: &str) -> Self {
        Self::new(ErrorType::InvalidField, format!("Unsupported field: {}", name))
            .with_info("fieldName", name)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorType::InternalError, message)
    }
}

impl From<&ConfigError> for ErrorEnvelope {
    fn from(err: &ConfigError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<&BackendFailure> for ErrorEnvelope {
    fn from(failure: &BackendFailure) -> Self {
        let mut envelope = Self::new(
            ErrorType::BackendError,
            format!("Backend error: {}", failure),
        )
        .with_info("kind", failure.kind().as_str());
        if let Some(status_code) = failure.status_code() {
            envelope = envelope.with_info("statusCode", status_code);
        }
        if let Some(body) = failure.body() {
            envelope = envelope.with_info("body", body);
        }
        envelope
    }
}

/// Either the raw success payload or a typed error. Never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Error(ErrorEnvelope),
    Success(HelloPayload),
}

impl ResponseEnvelope {
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success(_))
    }

    pub fn error_type(&self) -> Option<ErrorType> {
        match self {
            ResponseEnvelope::Error(e) => Some(e.error_type),
            ResponseEnvelope::Success(_) => None,
        }
    }

    /// Outcome label for metrics.
    pub fn outcome(&self) -> &'static str {
        self.error_type().map_or("success", |t| t.as_str())
    }
}

impl From<HelloPayload> for ResponseEnvelope {
    fn from(payload: HelloPayload) -> Self {
        ResponseEnvelope::Success(payload)
    }
}

impl From<ErrorEnvelope> for ResponseEnvelope {
    fn from(error: ErrorEnvelope) -> Self {
        ResponseEnvelope::Error(error)
    }
}
