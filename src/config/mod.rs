//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! execution environment (ALB_ENDPOINT, API_PATH, ...)
//!     → loader.rs (read & parse through an EnvSource)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable, one per invocation)
//! ```
//!
//! # Design Decisions
//! - Strict policy: base address and path are both required, no defaults
//! - Configuration problems are operator errors, never backend errors
//! - The environment is injected so loading is testable without process state

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, EnvSource, ProcessEnv};
pub use schema::GatewayConfig;
pub use validation::ValidationError;
