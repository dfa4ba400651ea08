//! Invocation handler.
//!
//! # Responsibilities
//! - Reject unsupported operations before any I/O
//! - Load the gateway configuration for this invocation
//! - Call the backend once and map the outcome to a [`ResponseEnvelope`]
//! - Log entry and exit, with every failure logged once at ERROR
//!
//! # Design Decisions
//! - `handle` is infallible: every path, including a panic in the trace
//!   provider, the environment source or the gateway, ends in a
//!   well-formed envelope
//! - The trace snapshot is taken once at entry and used for the whole call

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::json;

use crate::config::{load_config, EnvSource, ProcessEnv};
use crate::gateway::BackendGateway;
use crate::handler::envelope::{ErrorEnvelope, ResponseEnvelope};
use crate::handler::invocation::{ExecutionMeta, Invocation};
use crate::observability::logging::StructuredLogger;
use crate::observability::metrics;
use crate::observability::tracing::{EnvTraceProvider, TraceContext, TraceProvider};

/// The single operation this gateway serves.
pub const SUPPORTED_OPERATION: &str = "getHello";

/// Resolves invocations of [`SUPPORTED_OPERATION`] against the backend.
pub struct InvocationHandler<G> {
    gateway: G,
    env: Arc<dyn EnvSource>,
    trace: Arc<dyn TraceProvider>,
    logger: StructuredLogger,
}

impl<G: BackendGateway> InvocationHandler<G> {
    /// Handler reading configuration and trace state from the process environment.
    pub fn new(gateway: G, logger: StructuredLogger) -> Self {
        Self {
            gateway,
            env: Arc::new(ProcessEnv),
            trace: Arc::new(EnvTraceProvider),
            logger,
        }
    }

    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    pub fn with_trace_provider(mut self, trace: Arc<dyn TraceProvider>) -> Self {
        self.trace = trace;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Handle one invocation using the handler's trace provider.
    pub async fn handle(&self, invocation: &Invocation, meta: &ExecutionMeta) -> ResponseEnvelope {
        self.run(invocation, meta, || self.trace.current()).await
    }

    /// Handle one invocation under an explicit trace snapshot.
    ///
    /// Used by hosts that derive the trace per request (e.g. from headers).
    pub async fn handle_traced(
        &self,
        invocation: &Invocation,
        meta: &ExecutionMeta,
        trace: &TraceContext,
    ) -> ResponseEnvelope {
        self.run(invocation, meta, || trace.clone()).await
    }

    /// Every panic from the snapshot through the backend call ends here as
    /// an `InternalError` envelope.
    async fn run<F>(&self, invocation: &Invocation, meta: &ExecutionMeta, snapshot: F) -> ResponseEnvelope
    where
        F: FnOnce() -> TraceContext + Send,
    {
        let trace = std::panic::catch_unwind(AssertUnwindSafe(snapshot));
        let log = match &trace {
            Ok(trace) => self.logger.for_trace(trace),
            Err(_) => self.logger.clone(),
        };
        log.info(
            "Resolver invoked",
            json!({
                "operationName": invocation.operation_name,
                "requestId": meta.invocation_id,
            }),
        );

        let envelope = match trace {
            Ok(trace) => {
                let guarded = AssertUnwindSafe(self.resolve(invocation, &trace, &log)).catch_unwind();
                match guarded.await {
                    Ok(envelope) => envelope,
                    Err(panic) => internal_failure(&log, panic.as_ref()),
                }
            }
            Err(panic) => internal_failure(&log, panic.as_ref()),
        };

        if envelope.is_success() {
            log.info(
                "Backend response received",
                json!({ "status": "success", "requestId": meta.invocation_id }),
            );
        }
        metrics::record_invocation(envelope.outcome());
        envelope
    }

    async fn resolve(
        &self,
        invocation: &Invocation,
        trace: &TraceContext,
        log: &StructuredLogger,
    ) -> ResponseEnvelope {
        if invocation.operation_name != SUPPORTED_OPERATION {
            log.error(
                "Unsupported field requested",
                json!({ "fieldName": invocation.operation_name }),
            );
            return ErrorEnvelope::unsupported_field(&invocation.operation_name).into();
        }

        let config = match load_config(self.env.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                log.error_with("Internal error occurred", "ConfigError", &e, json!({}));
                return ErrorEnvelope::from(&e).into();
            }
        };

        match self.gateway.call(&config, trace).await {
            Ok(payload) => payload.into(),
            Err(failure) => {
                log.error_with(
                    "Backend error occurred",
                    "BackendError",
                    &failure,
                    json!({
                        "kind": failure.kind().as_str(),
                        "statusCode": failure.status_code(),
                    }),
                );
                ErrorEnvelope::from(&failure).into()
            }
        }
    }
}

fn internal_failure(log: &StructuredLogger, panic: &(dyn Any + Send)) -> ResponseEnvelope {
    let message = panic_message(panic);
    log.error_with("Internal error occurred", "Panic", &message, json!({}));
    ErrorEnvelope::internal(message).into()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown error".to_string()
    }
}
