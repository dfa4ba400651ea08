//! Backend HTTP client with timeout and error classification.
//!
//! # Responsibilities
//! - Issue exactly one GET per call to `base_address + path`
//! - Attach the X-Ray propagation header when a trace is active
//! - Bound the whole exchange (connect through body read) by one deadline
//! - Classify every outcome into a [`BackendResult`]
//!
//! # Design Decisions
//! - No retries: a failed attempt is terminal
//! - On deadline expiry the request future is dropped, which closes its
//!   connection instead of leaving it to finish in the background
//! - Failures are values; nothing here panics or propagates an error

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::json;
use tokio::time::timeout;

use crate::config::GatewayConfig;
use crate::gateway::types::{parse_payload, truncate_for_log, BackendFailure, BackendResult};
use crate::observability::logging::StructuredLogger;
use crate::observability::metrics;
use crate::observability::tracing::{TraceContext, XRAY_TRACE_HEADER};

/// Client identification sent on every backend request.
pub const CLIENT_USER_AGENT: &str = concat!("trace-gateway/", env!("CARGO_PKG_VERSION"));

/// Maximum body characters copied into log fields.
const LOG_BODY_LIMIT: usize = 200;

/// Performs the single backend call for an invocation.
pub trait BackendGateway: Send + Sync {
    fn call(
        &self,
        config: &GatewayConfig,
        trace: &TraceContext,
    ) -> impl Future<Output = BackendResult> + Send;
}

/// [`BackendGateway`] over HTTP(S) using a shared connection pool.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    insecure_client: reqwest::Client,
    logger: StructuredLogger,
}

impl HttpGateway {
    /// Create a gateway.
    ///
    /// # Errors
    /// Fails if the TLS backend cannot be initialized.
    pub fn new(logger: StructuredLogger) -> Result<Self, reqwest::Error> {
        let client = Self::builder().build()?;
        let insecure_client = Self::builder().danger_accept_invalid_certs(true).build()?;
        Ok(Self {
            client,
            insecure_client,
            logger,
        })
    }

    // The backend is a private load balancer; system proxies are ignored.
    fn builder() -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .user_agent(CLIENT_USER_AGENT)
            .no_proxy()
    }

    async fn fetch(&self, config: &GatewayConfig, trace: &TraceContext) -> BackendResult {
        let client = if config.accept_invalid_certs {
            &self.insecure_client
        } else {
            &self.client
        };

        let mut request = client
            .get(config.url())
            .header(CONTENT_TYPE, "application/json")
            .timeout(Duration::from_millis(config.timeout_ms));
        match trace.propagation_header().map(HeaderValue::try_from) {
            Some(Ok(value)) => request = request.header(XRAY_TRACE_HEADER, value),
            Some(Err(_)) => tracing::debug!("Dropping unencodable trace header"),
            None => {}
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(&e, config.timeout_ms))?;

        let status_code = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(&e, config.timeout_ms))?;

        if !(200..300).contains(&status_code) {
            return Err(BackendFailure::BadStatus { status_code, body });
        }

        parse_payload(&body).map_err(|detail| BackendFailure::InvalidPayload {
            status_code,
            body,
            detail,
        })
    }
}

impl BackendGateway for HttpGateway {
    async fn call(&self, config: &GatewayConfig, trace: &TraceContext) -> BackendResult {
        let log = self.logger.for_trace(trace);
        log.debug(
            "Calling backend",
            json!({
                "endpoint": config.base_address,
                "path": config.path,
                "timeout": config.timeout_ms,
            }),
        );

        let start = Instant::now();
        let deadline = Duration::from_millis(config.timeout_ms);
        let result = match timeout(deadline, self.fetch(config, trace)).await {
            Ok(result) => result,
            Err(_) => Err(BackendFailure::Timeout {
                timeout_ms: config.timeout_ms,
            }),
        };

        match &result {
            Ok(_) => {
                metrics::record_backend_call("success", start);
                log.debug(
                    "Backend call successful",
                    json!({ "durationMs": start.elapsed().as_millis() as u64 }),
                );
            }
            Err(failure) => {
                metrics::record_backend_call(failure.kind().as_str(), start);
                log.debug(
                    "Backend call failed",
                    json!({
                        "kind": failure.kind().as_str(),
                        "statusCode": failure.status_code(),
                        "body": failure.body().map(|b| truncate_for_log(b, LOG_BODY_LIMIT)),
                        "durationMs": start.elapsed().as_millis() as u64,
                    }),
                );
            }
        }

        result
    }
}

fn classify_transport_error(err: &reqwest::Error, timeout_ms: u64) -> BackendFailure {
    if err.is_timeout() {
        return BackendFailure::Timeout { timeout_ms };
    }
    BackendFailure::Network {
        detail: error_chain(err),
    }
}

/// Error message including its source chain, e.g.
/// `error sending request: client error (Connect): Connection refused`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
