//! Configuration loading from the execution environment.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::schema::{
    GatewayConfig, ACCEPT_INVALID_CERTS_ENV, DEFAULT_TIMEOUT_MS, ENDPOINT_ENV, PATH_ENV,
    TIMEOUT_ENV,
};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read access to key/value settings.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Empty values count as unset.
fn required<E: EnvSource + ?Sized>(env: &E, name: &'static str) -> Result<String, ConfigError> {
    env.var(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional<E: EnvSource + ?Sized>(env: &E, name: &str) -> Option<String> {
    env.var(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load and validate the gateway configuration.
///
/// `ALB_ENDPOINT` and `API_PATH` are both required.
pub fn load_config<E: EnvSource + ?Sized>(env: &E) -> Result<GatewayConfig, ConfigError> {
    let base_address = required(env, ENDPOINT_ENV)?;
    let path = required(env, PATH_ENV)?;

    let timeout_ms = match optional(env, TIMEOUT_ENV) {
        Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            name: TIMEOUT_ENV,
            value: raw.clone(),
        })?,
        None => DEFAULT_TIMEOUT_MS,
    };

    let accept_invalid_certs = match optional(env, ACCEPT_INVALID_CERTS_ENV) {
        Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidValue {
            name: ACCEPT_INVALID_CERTS_ENV,
            value: raw.clone(),
        })?,
        None => false,
    };

    let config = GatewayConfig {
        base_address,
        path,
        timeout_ms,
        accept_invalid_certs,
    };
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
