// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::poller::TelemetryPoller;
use crate::domain::poller_state::PollerState;
use crate::infrastructure::config::load_viewer_config;
use crate::infrastructure::http_source::HttpTelemetrySource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{dashboard, health_check, refresh, set_live};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_viewer_config()?;

    // Create telemetry source (infrastructure layer)
    let source = Arc::new(HttpTelemetrySource::new(
        config.endpoint.url.clone(),
        config.endpoint.timeout(),
    )?);

    // Create poller (application layer)
    let state = Arc::new(AppState {
        poller: TelemetryPoller::new(source, config.poller.interval()),
    });

    tokio::spawn(log_state_changes(state.poller.subscribe()));

    // Initial fetch runs alongside server startup
    let activation = {
        let state = Arc::clone(&state);
        let live_on_start = config.poller.live_on_start;
        tokio::spawn(async move { state.poller.start(live_on_start).await })
    };

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/api/dashboard", get(dashboard))
        .route("/api/live", put(set_live))
        .route("/api/refresh", post(refresh))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&state));

    // Start server
    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, endpoint = %config.endpoint.url, "Starting telemetry viewer");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    activation.abort();
    state.poller.set_live_enabled(false);
    tracing::info!("Telemetry viewer stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Logs each newly applied sample and the recovery after a failed fetch
async fn log_state_changes(mut updates: watch::Receiver<PollerState>) {
    let mut last_success = None;
    let mut had_error = false;

    while updates.changed().await.is_ok() {
        let state = updates.borrow_and_update().clone();

        if state.last_success_time() != last_success {
            last_success = state.last_success_time();
            if let Some(sample) = state.last_sample() {
                tracing::info!(
                    device_id = %sample.device_id,
                    temperature = sample.temperature,
                    humidity = sample.humidity,
                    "Telemetry updated"
                );
            }
        }

        let has_error = state.last_error().is_some();
        if had_error && !has_error {
            tracing::info!("Telemetry endpoint reachable again");
        }
        had_error = has_error;
    }
}
