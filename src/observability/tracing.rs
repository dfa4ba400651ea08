//! Distributed trace context.
//!
//! # Responsibilities
//! - Derive trace context from incoming headers or the Lambda environment
//! - Format trace ids for X-Ray compatible propagation
//! - Build the outbound propagation header
//!
//! # Design Decisions
//! - Reading context never starts a trace; absence is an empty context
//! - Malformed headers are treated as absent rather than as errors
//! - Snapshots are plain values, so an invocation cannot observe changes

use std::collections::HashMap;

/// Outbound/inbound X-Ray propagation header.
pub const XRAY_TRACE_HEADER: &str = "x-amzn-trace-id";

/// W3C trace context header.
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Environment variable set by the Lambda runtime when tracing is active.
pub const XRAY_TRACE_ENV: &str = "_X_AMZN_TRACE_ID";

const TRACE_ID_LEN: usize = 32;
const EPOCH_PART_LEN: usize = 8;
const SPAN_ID_LEN: usize = 16;

/// Snapshot of the ambient trace for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceContext {
    trace_id: Option<String>,
    span_id: Option<String>,
}

impl TraceContext {
    /// Context with no active trace.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(trace_id: impl Into<String>, span_id: Option<String>) -> Self {
        Self {
            trace_id: Some(trace_id.into()),
            span_id,
        }
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn span_id(&self) -> Option<&str> {
        self.span_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.trace_id.is_none()
    }

    /// Trace id in the externally propagated `1-xxxxxxxx-yyyy...` form.
    pub fn formatted_trace_id(&self) -> Option<String> {
        self.trace_id.as_deref().map(format_xray_trace_id)
    }

    /// Value for the outbound `X-Amzn-Trace-Id` header, if a trace is active.
    pub fn propagation_header(&self) -> Option<String> {
        let root = self.formatted_trace_id()?;
        Some(match &self.span_id {
            Some(parent) => format!("Root={};Parent={}", root, parent),
            None => format!("Root={}", root),
        })
    }

    /// Derive a context from request headers.
    ///
    /// `traceparent` is preferred over `X-Amzn-Trace-Id`. Lookup is
    /// case-insensitive. Returns an empty context when neither is usable.
    pub fn from_headers(headers: &HashMap<String, String>) -> Self {
        let lookup = |name: &str| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        };

        lookup(TRACEPARENT_HEADER)
            .and_then(parse_traceparent)
            .or_else(|| lookup(XRAY_TRACE_HEADER).and_then(parse_xray_header))
            .unwrap_or_default()
    }
}

/// Source of the ambient trace context.
///
/// Implementations only read state; they never create or alter a trace.
pub trait TraceProvider: Send + Sync {
    fn current(&self) -> TraceContext;
}

impl TraceProvider for TraceContext {
    fn current(&self) -> TraceContext {
        self.clone()
    }
}

/// Reads `_X_AMZN_TRACE_ID` from the process environment at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvTraceProvider;

impl TraceProvider for EnvTraceProvider {
    fn current(&self) -> TraceContext {
        std::env::var(XRAY_TRACE_ENV)
            .ok()
            .and_then(|value| parse_xray_header(&value))
            .unwrap_or_default()
    }
}

/// Convert a 32-hex-character trace id into X-Ray form.
///
/// `67890abc12345678901234567890abcd` becomes
/// `1-67890abc-12345678901234567890abcd`. Input of any other shape is
/// returned unchanged.
pub fn format_xray_trace_id(trace_id: &str) -> String {
    if trace_id.len() != TRACE_ID_LEN || !is_hex(trace_id) {
        return trace_id.to_string();
    }
    let (epoch, unique) = trace_id.split_at(EPOCH_PART_LEN);
    format!("1-{}-{}", epoch, unique)
}

/// Parse `00-<trace-id>-<span-id>-<flags>`.
fn parse_traceparent(value: &str) -> Option<TraceContext> {
    let parts: Vec<&str> = value.trim().split('-').collect();
    if parts.len() != 4 || parts[0] != "00" {
        return None;
    }
    let (trace_id, span_id) = (parts[1], parts[2]);
    if trace_id.len() != TRACE_ID_LEN || !is_hex(trace_id) || is_all_zero(trace_id) {
        return None;
    }
    if span_id.len() != SPAN_ID_LEN || !is_hex(span_id) || is_all_zero(span_id) {
        return None;
    }
    Some(TraceContext::new(
        trace_id.to_ascii_lowercase(),
        Some(span_id.to_ascii_lowercase()),
    ))
}

/// Parse `Root=1-xxxxxxxx-yyyy...;Parent=...;Sampled=...`.
///
/// The root is normalized back to its 32-hex form so that formatting it
/// again reproduces the original header value. A root of any other shape
/// makes the whole header unusable; a malformed parent is dropped.
fn parse_xray_header(value: &str) -> Option<TraceContext> {
    let mut root = None;
    let mut parent = None;
    for field in value.split(';') {
        match field.trim().split_once('=') {
            Some(("Root", v)) => root = Some(v.trim()),
            Some(("Parent", v)) => parent = Some(v.trim()),
            _ => {}
        }
    }

    let trace_id = parse_xray_root(root?)?;
    let span_id = parent
        .filter(|p| p.len() == SPAN_ID_LEN && is_hex(p))
        .map(str::to_ascii_lowercase);
    Some(TraceContext::new(trace_id, span_id))
}

/// Accepts `1-<8 hex>-<24 hex>` or a bare 32-hex id.
fn parse_xray_root(root: &str) -> Option<String> {
    let joined = match root.split('-').collect::<Vec<_>>().as_slice() {
        ["1", epoch, unique] if epoch.len() == EPOCH_PART_LEN => format!("{}{}", epoch, unique),
        [bare] => bare.to_string(),
        _ => return None,
    };
    if joined.len() != TRACE_ID_LEN || !is_hex(&joined) {
        return None;
    }
    Some(joined.to_ascii_lowercase())
}

fn is_hex(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_all_zero(s: &str) -> bool {
    s.chars().all(|c| c == '0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_xray_trace_id() {
        let formatted = format_xray_trace_id("67890abc12345678901234567890abcd");
        assert_eq!(formatted, "1-67890abc-12345678901234567890abcd");

        let parts: Vec<&str> = formatted.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], "67890abc");
        assert_eq!(parts[2], "12345678901234567890abcd");
        assert_eq!(format!("{}{}", parts[1], parts[2]), "67890abc12345678901234567890abcd");
    }

    #[test]
    fn test_format_passes_through_other_shapes() {
        // 31 characters
        assert_eq!(
            format_xray_trace_id("67890abc12345678901234567890abc"),
            "67890abc12345678901234567890abc"
        );
        assert_eq!(format_xray_trace_id(""), "");
        let not_hex = "zz890abc12345678901234567890abcd";
        assert_eq!(format_xray_trace_id(not_hex), not_hex);
    }

    #[test]
    fn test_parse_xray_header() {
        let ctx = parse_xray_header("Root=1-67890abc-12345678901234567890abcd;Parent=53995c3f42cd8ad8;Sampled=1")
            .unwrap();
        assert_eq!(ctx.trace_id(), Some("67890abc12345678901234567890abcd"));
        assert_eq!(ctx.span_id(), Some("53995c3f42cd8ad8"));
        assert_eq!(
            ctx.formatted_trace_id().as_deref(),
            Some("1-67890abc-12345678901234567890abcd")
        );

        assert!(parse_xray_header("Sampled=1").is_none());
        assert!(parse_xray_header("").is_none());
    }

    #[test]
    fn test_parse_xray_header_rejects_malformed_values() {
        assert!(parse_xray_header("Root=ab\ncd").is_none());
        assert!(parse_xray_header("Root=1-67890abc-1234").is_none());
        assert!(parse_xray_header("Root=2-67890abc-12345678901234567890abcd").is_none());
        assert!(parse_xray_header("Root=1-67890abc-12345678901234567890abcz").is_none());

        let ctx = parse_xray_header("Root=67890ABC12345678901234567890ABCD").unwrap();
        assert_eq!(ctx.trace_id(), Some("67890abc12345678901234567890abcd"));

        let ctx = parse_xray_header("Root=1-67890abc-12345678901234567890abcd;Parent=bad\r\nvalue")
            .unwrap();
        assert_eq!(ctx.span_id(), None);
        assert_eq!(
            ctx.propagation_header().as_deref(),
            Some("Root=1-67890abc-12345678901234567890abcd")
        );

        let mut headers = HashMap::new();
        headers.insert("X-Amzn-Trace-Id".to_string(), "Root=ab\ncd".to_string());
        assert!(TraceContext::from_headers(&headers).is_empty());
    }

    #[test]
    fn test_parse_traceparent() {
        let ctx = parse_traceparent("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01").unwrap();
        assert_eq!(ctx.trace_id(), Some("0af7651916cd43dd8448eb211c80319c"));
        assert_eq!(ctx.span_id(), Some("b7ad6b7169203331"));

        assert!(parse_traceparent("01-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01").is_none());
        assert!(parse_traceparent("00-00000000000000000000000000000000-b7ad6b7169203331-01").is_none());
        assert!(parse_traceparent("00-short-b7ad6b7169203331-01").is_none());
    }

    #[test]
    fn test_from_headers_prefers_traceparent() {
        let mut headers = HashMap::new();
        headers.insert(
            "X-Amzn-Trace-Id".to_string(),
            "Root=1-11111111-222222222222222222222222".to_string(),
        );
        assert_eq!(
            TraceContext::from_headers(&headers).trace_id(),
            Some("11111111222222222222222222222222")
        );

        headers.insert(
            "TraceParent".to_string(),
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01".to_string(),
        );
        assert_eq!(
            TraceContext::from_headers(&headers).trace_id(),
            Some("0af7651916cd43dd8448eb211c80319c")
        );
    }

    #[test]
    fn test_empty_context() {
        let ctx = TraceContext::from_headers(&HashMap::new());
        assert!(ctx.is_empty());
        assert!(ctx.propagation_header().is_none());
        assert!(ctx.current().is_empty());
    }

    #[test]
    fn test_propagation_header() {
        let ctx = TraceContext::new("67890abc12345678901234567890abcd", None);
        assert_eq!(
            ctx.propagation_header().as_deref(),
            Some("Root=1-67890abc-12345678901234567890abcd")
        );

        let ctx = TraceContext::new("67890abc12345678901234567890abcd", Some("53995c3f42cd8ad8".into()));
        assert_eq!(
            ctx.propagation_header().as_deref(),
            Some("Root=1-67890abc-12345678901234567890abcd;Parent=53995c3f42cd8ad8")
        );
    }
}
