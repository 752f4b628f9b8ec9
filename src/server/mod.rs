// src/server/mod.rs
// =============================================================================
// The HTTP front-end: exposes "crawl this site" as a network endpoint.
//
// Submodules:
// - handlers: the /crawl endpoint and its error responses
//
// The server shuts down gracefully on Ctrl+C or SIGTERM. There is no way to
// cancel a crawl that is already running; in-flight requests are allowed to
// finish.
// =============================================================================

mod handlers;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
pub use handlers::AppState;
use handlers::{get_crawl, post_crawl};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/crawl", get(get_crawl).post(post_crawl))
        .layer(TraceLayer::new_for_http().on_response(
            |response: &axum::response::Response, latency: Duration, _span: &tracing::Span| {
                info!(
                    "response latency: {:?}, status: {}",
                    latency,
                    response.status()
                );
            },
        ))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
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
}

pub async fn start_server(config: Config) -> Result<()> {
    info!("Starting site-mapper server with config: {:?}", config);

    let state = AppState {
        crawler_options: config.crawler_options(),
    };
    let app = create_router(state);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to address {}", bind_address))?;

    info!("App started at: {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down site-mapper server");
    Ok(())
}
