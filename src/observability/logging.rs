//! Structured logging.
//!
//! # Responsibilities
//! - Emit one JSON object per line for every log call
//! - Stamp each entry with an ISO-8601 timestamp at emission time
//! - Tag entries with the bound trace/span ids for correlation
//!
//! # Design Decisions
//! - Emission is infallible; sink errors are dropped
//! - Reserved field names always win over caller-supplied fields
//! - The sink is injected, so tests capture output without touching stdout
//! - Runtime diagnostics go through `tracing` on stderr; this stream is
//!   kept to pure JSON on stdout
//! - Not a `tracing-subscriber` JSON layer: entries need an injectable sink
//!   and a flat field layout where `level`, `message`, `timestamp`,
//!   `traceId` and `spanId` always override caller fields

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::observability::tracing::TraceContext;

/// Field carrying the X-Ray formatted trace id.
pub const TRACE_ID_FIELD: &str = "traceId";
/// Field carrying the active span id.
pub const SPAN_ID_FIELD: &str = "spanId";

const RESERVED_FIELDS: [&str; 5] = ["level", "message", "timestamp", TRACE_ID_FIELD, SPAN_ID_FIELD];

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Destination for serialized log lines.
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str) -> io::Result<()>;
}

/// Writes each line to the process's standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()
    }
}

/// Collects lines in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Captured lines parsed back into JSON objects.
    pub fn entries(&self) -> Vec<Map<String, Value>> {
        self.lines()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log buffer poisoned"))?;
        lines.push(line.to_string());
        Ok(())
    }
}

/// JSON line logger bound to one trace context.
///
/// Cloning is cheap; the sink is shared. Use [`StructuredLogger::for_trace`]
/// at the start of an invocation to get a logger tagged with that
/// invocation's trace snapshot.
#[derive(Clone)]
pub struct StructuredLogger {
    sink: Arc<dyn LogSink>,
    min_level: LogLevel,
    trace: TraceContext,
}

impl fmt::Debug for StructuredLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredLogger")
            .field("min_level", &self.min_level)
            .field("trace", &self.trace)
            .finish()
    }
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::stdout()
    }
}

impl StructuredLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            min_level: LogLevel::Info,
            trace: TraceContext::empty(),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Arc::new(StdoutSink))
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Logger sharing this sink, tagged with `trace`.
    pub fn for_trace(&self, trace: &TraceContext) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            min_level: self.min_level,
            trace: trace.clone(),
        }
    }

    /// Build an entry without writing it.
    pub fn entry(&self, level: LogLevel, message: &str, fields: Value) -> Map<String, Value> {
        let mut entry = match fields {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        for reserved in RESERVED_FIELDS {
            entry.remove(reserved);
        }

        entry.insert("level".to_string(), Value::from(level.as_str()));
        entry.insert("message".to_string(), Value::from(message));
        entry.insert(
            "timestamp".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        if let Some(trace_id) = self.trace.formatted_trace_id() {
            entry.insert(TRACE_ID_FIELD.to_string(), Value::from(trace_id));
        }
        if let Some(span_id) = self.trace.span_id() {
            entry.insert(SPAN_ID_FIELD.to_string(), Value::from(span_id));
        }
        entry
    }

    /// Write one entry. Never fails.
    pub fn emit(&self, level: LogLevel, message: &str, fields: Value) {
        if level < self.min_level {
            return;
        }
        let entry = self.entry(level, message, fields);
        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(error = %e, "Dropped unserializable log entry");
                return;
            }
        };
        if let Err(e) = self.sink.write_line(&line) {
            tracing::debug!(error = %e, "Dropped log entry");
        }
    }

    pub fn debug(&self, message: &str, fields: Value) {
        self.emit(LogLevel::Debug, message, fields);
    }

    pub fn info(&self, message: &str, fields: Value) {
        self.emit(LogLevel::Info, message, fields);
    }

    pub fn warn(&self, message: &str, fields: Value) {
        self.emit(LogLevel::Warn, message, fields);
    }

    pub fn error(&self, message: &str, fields: Value) {
        self.emit(LogLevel::Error, message, fields);
    }

    /// ERROR entry with an `error: {name, message}` object attached.
    pub fn error_with<E>(&self, message: &str, name: &str, err: &E, fields: Value)
    where
        E: std::fmt::Display + ?Sized,
    {
        let mut fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        fields.insert(
            "error".to_string(),
            serde_json::json!({ "name": name, "message": err.to_string() }),
        );
        self.emit(LogLevel::Error, message, Value::Object(fields));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FailingSink;

    impl LogSink for FailingSink {
        fn write_line(&self, _line: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    fn traced() -> TraceContext {
        TraceContext::new("67890abc12345678901234567890abcd", Some("53995c3f42cd8ad8".into()))
    }

    #[test]
    fn test_entry_carries_trace_fields() {
        let sink = MemorySink::new();
        let logger = StructuredLogger::new(Arc::new(sink.clone())).for_trace(&traced());

        logger.info("Resolver invoked", json!({ "requestId": "abc" }));

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry["level"], "INFO");
        assert_eq!(entry["message"], "Resolver invoked");
        assert_eq!(entry["requestId"], "abc");
        assert_eq!(entry["traceId"], "1-67890abc-12345678901234567890abcd");
        assert_eq!(entry["spanId"], "53995c3f42cd8ad8");
        assert!(entry["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_no_trace_fields_without_context() {
        let sink = MemorySink::new();
        let logger = StructuredLogger::new(Arc::new(sink.clone()));

        logger.info("plain", Value::Null);

        let entry = &sink.entries()[0];
        assert!(!entry.contains_key("traceId"));
        assert!(!entry.contains_key("spanId"));
    }

    #[test]
    fn test_reserved_fields_win() {
        let sink = MemorySink::new();
        let logger = StructuredLogger::new(Arc::new(sink.clone())).for_trace(&traced());

        logger.warn(
            "collision",
            json!({ "traceId": "forged", "spanId": "forged", "level": "DEBUG", "other": 1 }),
        );

        let entry = &sink.entries()[0];
        assert_eq!(entry["traceId"], "1-67890abc-12345678901234567890abcd");
        assert_eq!(entry["spanId"], "53995c3f42cd8ad8");
        assert_eq!(entry["level"], "WARN");
        assert_eq!(entry["other"], 1);
    }

    #[test]
    fn test_repeated_emit_yields_distinct_entries() {
        let sink = MemorySink::new();
        let logger = StructuredLogger::new(Arc::new(sink.clone())).for_trace(&traced());

        logger.info("same", json!({ "k": "v" }));
        logger.info("same", json!({ "k": "v" }));

        let mut entries = sink.entries();
        assert_eq!(entries.len(), 2);
        for entry in entries.iter_mut() {
            entry.remove("timestamp");
        }
        assert_eq!(entries[0], entries[1]);
    }

    #[test]
    fn test_sink_failure_is_swallowed() {
        let logger = StructuredLogger::new(Arc::new(FailingSink));
        logger.error("still fine", json!({ "x": 1 }));
        logger.info("still fine", Value::Null);
    }

    #[test]
    fn test_min_level_filters() {
        let sink = MemorySink::new();
        let logger = StructuredLogger::new(Arc::new(sink.clone())).with_min_level(LogLevel::Warn);

        logger.debug("dropped", Value::Null);
        logger.info("dropped", Value::Null);
        logger.error("kept", Value::Null);

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["message"], "kept");
    }

    #[test]
    fn test_error_with_attaches_error_object() {
        let sink = MemorySink::new();
        let logger = StructuredLogger::new(Arc::new(sink.clone()));

        logger.error_with("Backend error occurred", "BackendError", "Timeout after 10ms", json!({}));

        let entry = &sink.entries()[0];
        assert_eq!(entry["error"]["name"], "BackendError");
        assert_eq!(entry["error"]["message"], "Timeout after 10ms");
    }

    #[test]
    fn test_non_object_fields_nest_under_data() {
        let sink = MemorySink::new();
        let logger = StructuredLogger::new(Arc::new(sink.clone()));

        logger.info("scalar", json!(42));

        assert_eq!(sink.entries()[0]["data"], 42);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
