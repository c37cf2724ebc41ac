//! Codereview Gateway
//!
//! Front door for the code review application: maps every request path to
//! a static asset or a dynamic dispatcher through an ordered routing table.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                       GATEWAY                         │
//!                      │                                                       │
//!   Client Request     │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐   │
//!   ───────────────────┼─▶│ listener │──▶│ routing  │──▶│ transport policy │   │
//!                      │  │http/https│   │  table   │   │   + admin gate   │   │
//!                      │  └──────────┘   └──────────┘   └────────┬─────────┘   │
//!                      │                                         │             │
//!                      │                          ┌──────────────┴──────┐      │
//!                      │                          ▼                     ▼      │
//!   Client Response    │                   ┌────────────┐       ┌────────────┐ │
//!   ◀──────────────────┼───────────────────│   static   │       │ dispatcher │─┼──▶ main / backend
//!                      │                   │   files    │       │  forward   │ │
//!                      │                   └────────────┘       └────────────┘ │
//!                      └──────────────────────────────────────────────────────┘
//! ```
//!
//! The release pipeline lives in the `codereview-release` binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use codereview_gateway::config::load_config;
use codereview_gateway::http::HttpServer;
use codereview_gateway::lifecycle::{signals::shutdown_on_signal, supervise, Shutdown};
use codereview_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "codereview-gateway")]
#[command(about = "Routing gateway for the code review application", long_about = None)]
struct Cli {
    /// Gateway configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!(
        config = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "codereview-gateway v0.1.0 starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let tls = config.listener.tls.clone();
    let server = Arc::new(HttpServer::new(config)?);
    let shutdown = Shutdown::new();

    let mut listeners = JoinSet::new();
    {
        let server = Arc::clone(&server);
        let rx = shutdown.subscribe();
        listeners.spawn(async move { server.run(listener, rx).await });
    }
    if let Some(tls) = tls {
        let server = Arc::clone(&server);
        let rx = shutdown.subscribe();
        listeners.spawn(async move { server.run_tls(&tls, rx).await });
    }

    supervise(&shutdown, listeners, shutdown_on_signal(&shutdown)).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
