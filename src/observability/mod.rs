//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Invocation start:
//!     → tracing.rs (trace snapshot from headers or environment)
//!     → logging.rs (logger bound to that snapshot)
//!
//! During the backend call:
//!     → tracing.rs (X-Amzn-Trace-Id propagation header)
//!     → logging.rs (correlated JSON lines on stdout)
//!     → metrics.rs (outcome counters, latency histogram)
//! ```
//!
//! # Design Decisions
//! - Trace context and log sink are passed explicitly, never global
//! - Trace context is read-only; nothing here starts or ends a trace

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::logging::{LogLevel, LogSink, MemorySink, StdoutSink, StructuredLogger};
pub use self::tracing::{EnvTraceProvider, TraceContext, TraceProvider};
