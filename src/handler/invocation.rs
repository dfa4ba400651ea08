//! Inbound invocation types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single request for the gateway's operation.
///
/// Also accepts the AppSync direct-resolver spellings (`typeName`,
/// `fieldName`, `request`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    #[serde(default, alias = "typeName")]
    pub operation_type: String,

    #[serde(alias = "fieldName")]
    pub operation_name: String,

    #[serde(default)]
    pub arguments: HashMap<String, Value>,

    #[serde(default, alias = "request")]
    pub request_metadata: RequestMetadata,
}

impl Invocation {
    /// Query invocation with no arguments or headers.
    pub fn query(operation_name: impl Into<String>) -> Self {
        Self {
            operation_type: "Query".to_string(),
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_metadata.headers.insert(name.into(), value.into());
        self
    }
}

/// Request metadata forwarded by the routing layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestMetadata {
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Host-supplied metadata about the current execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMeta {
    pub invocation_id: String,
}

impl ExecutionMeta {
    pub fn new(invocation_id: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
        }
    }

    /// Metadata with a freshly generated UUID v4 invocation id.
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}
