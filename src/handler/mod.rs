//! Invocation handling subsystem.
//!
//! # Data Flow
//! ```text
//! Invocation + ExecutionMeta
//!     → resolver.rs (validate operation, load config, snapshot trace)
//!     → gateway (one backend call)
//!     → envelope.rs (payload or typed error)
//!     → ResponseEnvelope to the routing layer
//! ```

pub mod envelope;
pub mod invocation;
pub mod resolver;

pub use envelope::{ErrorEnvelope, ErrorType, ResponseEnvelope};
pub use invocation::{ExecutionMeta, Invocation, RequestMetadata};
pub use resolver::{InvocationHandler, SUPPORTED_OPERATION};
