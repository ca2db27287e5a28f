//! Gist Search Server - HTTP API for regex search across a user's gists.
//!
//! Exposes `GET /ping` and `POST /api/v1/search` on top of the
//! `gistsearch-core` library.

mod handlers;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use gistsearch_core::{GistSearchApi, ServerConfig, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gistsearch-server")]
#[command(about = "HTTP API for searching a GitHub user's gists with a regular expression")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value_t = ServerConfig::DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = ServerConfig::DEFAULT_HOST)]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// GitHub API base URL (overrides GITHUB_API_URL)
    #[arg(long)]
    github_api_url: Option<String>,

    /// Maximum gists fetched in parallel per search
    #[arg(long)]
    max_concurrent_fetches: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --debug
    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    info!("Starting Gist Search Server");

    let mut settings = Settings::from_env().context("Failed to load settings")?;
    if let Some(url) = args.github_api_url {
        settings = settings.with_api_url(url);
    }
    if let Some(n) = args.max_concurrent_fetches {
        settings = settings.with_max_concurrent_fetches(n);
    }
    info!("Settings: {:?}", settings);

    let api = GistSearchApi::new(&settings).context("Failed to create GitHub client")?;

    let (addr, server) = server::start_server(api, &args.host, args.port, shutdown_signal()).await?;

    // Bound port for supervisors and tests (intentional stdout)
    println!("SERVER_PORT={}", addr.port());

    info!("Search API running on {}", addr);

    server.await??;
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
