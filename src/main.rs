//! trace-gateway
//!
//! Resolves `getHello` invocations against one backend HTTP endpoint with
//! X-Ray trace propagation.
//!
//! # Architecture Overview
//!
//! ```text
//!   Invocation (CLI stdin/file, or POST /invoke)
//!        │
//!        ▼
//!   ┌──────────┐   trace snapshot   ┌───────────────┐
//!   │ handler  │◀───────────────────│ observability │
//!   │ resolver │───── logs ────────▶│ logging (JSON)│──▶ stdout
//!   └────┬─────┘                    └───────────────┘
//!        │ GatewayConfig (config: env)
//!        ▼
//!   ┌──────────┐   GET + X-Amzn-Trace-Id   ┌─────────┐
//!   │ gateway  │──────────────────────────▶│ backend │
//!   │ client   │◀──────────────────────────└─────────┘
//!   └────┬─────┘
//!        ▼
//!   ResponseEnvelope (payload or typed error)
//! ```

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trace_gateway::gateway::HttpGateway;
use trace_gateway::handler::{ExecutionMeta, Invocation, InvocationHandler};
use trace_gateway::http::{shutdown_signal, HttpServer};
use trace_gateway::observability::logging::{LogLevel, StructuredLogger};
use trace_gateway::observability::metrics;
use trace_gateway::observability::tracing::{EnvTraceProvider, TraceContext, TraceProvider};

#[derive(Parser)]
#[command(name = "trace-gateway", version)]
#[command(about = "Trace-propagating request gateway", long_about = None)]
struct Cli {
    /// Minimum level for the JSON log stream on stdout.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one invocation read from a file or stdin and print the envelope
    Invoke {
        /// Invocation JSON file (stdin when omitted).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Invocation id (generated when omitted).
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Serve invocations over HTTP
    Serve {
        #[arg(short, long, default_value = "0.0.0.0:8080")]
        bind: String,

        /// Prometheus scrape endpoint (disabled when omitted).
        #[arg(long)]
        metrics_address: Option<std::net::SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Runtime diagnostics on stderr; stdout carries the JSON log stream
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trace_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let logger = StructuredLogger::stdout().with_min_level(cli.log_level);
    let gateway = HttpGateway::new(logger.clone())?;
    let handler = InvocationHandler::new(gateway, logger);

    match cli.command {
        Commands::Invoke { input, request_id } => {
            let raw = match input {
                Some(path) => fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let invocation: Invocation = serde_json::from_str(&raw)?;
            let meta = request_id
                .map(ExecutionMeta::new)
                .unwrap_or_else(ExecutionMeta::generate);

            let trace = match TraceContext::from_headers(&invocation.request_metadata.headers) {
                ctx if !ctx.is_empty() => ctx,
                _ => EnvTraceProvider.current(),
            };

            let envelope = handler.handle_traced(&invocation, &meta, &trace).await;
            println!("{}", serde_json::to_string(&envelope)?);
        }
        Commands::Serve {
            bind,
            metrics_address,
        } => {
            if let Some(addr) = metrics_address {
                metrics::init_metrics(addr);
            }

            let listener = TcpListener::bind(&bind).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for invocations");

            HttpServer::new(handler).run(listener, shutdown_signal()).await?;
            tracing::info!("Shutdown complete");
        }
    }

    Ok(())
}
