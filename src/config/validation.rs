//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (presence is checked by the loader)
//! - Base address must be an absolute http(s) URL with a host
//! - Path must start with '/'
//! - Timeout must be positive
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a [`GatewayConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("base address '{address}' is not a valid URL: {reason}")]
    InvalidBaseAddress { address: String, reason: String },

    #[error("base address '{0}' must use http or https")]
    UnsupportedScheme(String),

    #[error("path '{0}' must start with '/'")]
    InvalidPath(String),

    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

/// Check a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.base_address) {
        Ok(url) => {
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                errors.push(ValidationError::UnsupportedScheme(config.base_address.clone()));
            }
        }
        Err(e) => errors.push(ValidationError::InvalidBaseAddress {
            address: config.base_address.clone(),
            reason: e.to_string(),
        }),
    }

    if !config.path.starts_with('/') {
        errors.push(ValidationError::InvalidPath(config.path.clone()));
    }

    if config.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = GatewayConfig::new("https://example.alb.amazonaws.com", "/api/hello");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let config = GatewayConfig::new("not a url", "api/hello").with_timeout_ms(0);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::InvalidPath("api/hello".into())));
        assert!(errors.contains(&ValidationError::ZeroTimeout));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let config = GatewayConfig::new("ftp://example.com", "/api/hello");
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnsupportedScheme("ftp://example.com".into())]
        );
    }
}
