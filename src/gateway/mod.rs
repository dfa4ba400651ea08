//! Backend gateway subsystem.
//!
//! # Data Flow
//! ```text
//! GatewayConfig + TraceContext
//!     → client.rs (one GET, deadline, propagation header)
//!     → types.rs (status and payload classification)
//!     → BackendResult (HelloPayload or BackendFailure)
//! ```

pub mod client;
pub mod types;

pub use client::{BackendGateway, HttpGateway, CLIENT_USER_AGENT};
pub use types::{BackendFailure, BackendResult, FailureKind, HelloPayload};
