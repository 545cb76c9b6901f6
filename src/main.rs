//! Slug Router
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing (slug + sub-path)
//!                                          │
//!                                          ▼
//!                                      directory ──── GET ────▶ Directory service
//!                                          │
//!                                          ▼
//!                                      security (outbound header policy)
//!                                          │
//!                                          ▼
//!                                      upstream (≤ 3 redirects) ──▶ Backend origin
//!                                          │
//!     Client Response                      ▼
//!     ◀────────────── http::response (relay mode, hop-by-hop stripped)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use slug_router::config::load_config;
use slug_router::lifecycle::{signals, Shutdown};
use slug_router::observability::{logging, metrics};
use slug_router::RouterServer;

#[derive(Parser)]
#[command(name = "slug-router")]
#[command(about = "Dynamic reverse proxy that routes /<slug>/... to a directory-resolved origin", long_about = None)]
struct Cli {
    /// TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    if cli.check {
        println!("Configuration OK");
        return Ok(());
    }

    logging::init(&config.observability);
    tracing::info!("slug-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        directory = %config.directory.base_url,
        header_policy = ?config.upstream.header_policy,
        relay_mode = ?config.upstream.relay_mode,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = RouterServer::new(config)?;
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        signals::wait_for_shutdown().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
