//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! POST /invoke (Invocation JSON)
//!     → request.rs (request ID, trace snapshot from headers)
//!     → handler (one invocation)
//!     → server.rs (envelope as JSON, X-Request-ID echoed)
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{shutdown_signal, HttpServer};
