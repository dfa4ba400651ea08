//! Configuration schema definitions.
//!
//! The gateway has exactly one backend target. Its settings are resolved
//! from the environment on every invocation; see [`crate::config::loader`].

use serde::{Deserialize, Serialize};

/// Environment variable holding the backend base address.
pub const ENDPOINT_ENV: &str = "ALB_ENDPOINT";
/// Environment variable holding the request path.
pub const PATH_ENV: &str = "API_PATH";
/// Optional override for the request deadline, in milliseconds.
pub const TIMEOUT_ENV: &str = "BACKEND_TIMEOUT_MS";
/// Optional flag to accept self-signed backend certificates.
pub const ACCEPT_INVALID_CERTS_ENV: &str = "BACKEND_ACCEPT_INVALID_CERTS";

/// Default request deadline (30 seconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Resolved settings for one backend call.
///
/// Both `base_address` and `path` are required; there is no default path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Backend base URL (e.g., "https://internal-alb.example.com").
    pub base_address: String,

    /// Request path with leading slash (e.g., "/api/hello").
    pub path: String,

    /// Deadline covering connect and full response read.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Skip TLS certificate verification for internal load balancers.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl GatewayConfig {
    pub fn new(base_address: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base_address: base_address.into(),
            path: path.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            accept_invalid_certs: false,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Full request URL: base address with the path appended.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_address.trim_end_matches('/'), self.path)
    }
}
