//! Trace-propagating request gateway.
//!
//! Resolves a single supported invocation to exactly one backend HTTP call,
//! propagates the caller's distributed trace to that backend, and turns every
//! outcome into a caller-safe [`ResponseEnvelope`].

pub mod config;
pub mod gateway;
pub mod handler;
pub mod http;
pub mod observability;

pub use config::GatewayConfig;
pub use gateway::{BackendGateway, HttpGateway};
pub use handler::{ExecutionMeta, Invocation, InvocationHandler, ResponseEnvelope};
pub use observability::{StructuredLogger, TraceContext};
