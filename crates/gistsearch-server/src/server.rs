//! HTTP server implementation using Axum.

use crate::handlers::{handle_not_found, handle_ping, handle_search};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use gistsearch_core::{GistSearchApi, ServerConfig};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers.
pub struct AppState {
    /// Gist search API (GitHub client, file cache, search engine)
    pub api: GistSearchApi,
}

/// Build the router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ping", get(handle_ping))
        .route("/api/v1/search", post(handle_search))
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(ServerConfig::REQUEST_BODY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and start serving in the background.
///
/// Returns the actual bound address (useful when port=0) and the server
/// task, which completes once `shutdown` resolves and in-flight requests
/// have drained.
pub async fn start_server<S>(
    api: GistSearchApi,
    host: &str,
    port: u16,
    shutdown: S,
) -> anyhow::Result<(SocketAddr, JoinHandle<anyhow::Result<()>>)>
where
    S: Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(AppState { api });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Server stopped");
        Ok(())
    });

    Ok((actual_addr, handle))
}
