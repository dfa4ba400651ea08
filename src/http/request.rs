//! Request metadata extraction.
//!
//! # Responsibilities
//! - Resolve the invocation id (`X-Request-ID` or a generated UUID)
//! - Derive the trace snapshot from HTTP headers, falling back to the
//!   headers carried inside the invocation

use std::collections::HashMap;

use axum::http::HeaderMap;

use crate::handler::{ExecutionMeta, Invocation};
use crate::observability::tracing::TraceContext;

/// Header name for request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Execution metadata for a request: its `X-Request-ID` when present and
/// printable, otherwise a fresh UUID.
pub fn execution_meta(headers: &HeaderMap) -> ExecutionMeta {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ExecutionMeta::new)
        .unwrap_or_else(ExecutionMeta::generate)
}

/// Trace snapshot for a request.
pub fn trace_context(headers: &HeaderMap, invocation: &Invocation) -> TraceContext {
    let from_http = TraceContext::from_headers(&header_map(headers));
    if !from_http.is_empty() {
        return from_http;
    }
    TraceContext::from_headers(&invocation.request_metadata.headers)
}

fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
