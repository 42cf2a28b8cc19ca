use std::net::SocketAddr;

use axum::routing::get;
use axum::{Extension, Router};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

pub mod handlers;
pub mod range;

use crate::service_config::Config;
use crate::ServiceState;

/// Build the server's route table.
///
/// Separated from [`run`] so tests can drive the router directly.
pub fn router(config: &Config, state: ServiceState) -> Router {
    Router::new()
        .route("/", get(handlers::download::handler))
        .route("/ping", get(handlers::ping::handler))
        .fallback(handlers::not_found::handler)
        .layer(Extension(config.clone()))
        .with_state(state)
}

/// Run the HTTP server until the shutdown signal fires.
pub async fn run(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let log_level = config.log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let listen_addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let router = router(&config, state).layer(trace_layer);

    tracing::info!(addr = ?listen_addr, "HTTP server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
