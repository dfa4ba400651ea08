//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router (`POST /invoke`, `GET /health`)
//! - Wire up request tracing middleware
//! - Translate each request into one handler invocation
//! - Serve until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::gateway::BackendGateway;
use crate::handler::{ErrorEnvelope, Invocation, InvocationHandler};
use crate::http::request;

/// HTTP front end exposing the invocation handler.
pub struct HttpServer<G> {
    handler: Arc<InvocationHandler<G>>,
}

impl<G: BackendGateway + 'static> HttpServer<G> {
    pub fn new(handler: InvocationHandler<G>) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub fn handler(&self) -> &InvocationHandler<G> {
        &self.handler
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/invoke", post(invoke::<G>))
            .route("/health", get(health))
            .with_state(Arc::clone(&self.handler))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run<S>(self, listener: TcpListener, shutdown: S) -> Result<(), std::io::Error>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Invoke handler. Handled invocations always answer 200 with an envelope;
/// only an unparseable body is rejected with 400.
async fn invoke<G: BackendGateway + 'static>(
    State(handler): State<Arc<InvocationHandler<G>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let meta = request::execution_meta(&headers);

    let invocation: Invocation = match serde_json::from_slice(&body) {
        Ok(invocation) => invocation,
        Err(e) => {
            tracing::warn!(request_id = %meta.invocation_id, error = %e, "Rejected malformed invocation");
            let envelope = ErrorEnvelope::internal(format!("Invalid invocation: {}", e));
            return (StatusCode::BAD_REQUEST, Json(envelope)).into_response();
        }
    };

    let trace = request::trace_context(&headers, &invocation);
    let envelope = handler.handle_traced(&invocation, &meta, &trace).await;

    (
        [(request::X_REQUEST_ID, meta.invocation_id)],
        Json(envelope),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Resolve on Ctrl+C. Never resolves if the handler cannot be installed.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
