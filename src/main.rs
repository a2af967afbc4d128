// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::refresh_controller::{CycleOutcome, DashboardController, InitOutcome};
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::stats_client::HttpStatsSource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_dashboard, health_check, refresh_dashboard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,filefinder_dashboard=debug")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    let settings = config.controller_settings()?;
    let locale = config.locale()?;

    // Create stats source (infrastructure layer)
    let source = Arc::new(HttpStatsSource::new(
        config.stats_url.clone(),
        config.csrf_token.clone(),
        config.session_id.clone(),
        config.request_timeout(),
    )?);

    // Create controller (application layer)
    let controller = DashboardController::new(source, config.widgets.registry(), settings);
    let charts = controller.initialize_charts(config.widgets.chart_slots());
    tracing::debug!(charts, "Chart widgets registered");

    if let InitOutcome::Started(CycleOutcome::Failed(e)) = controller.initialize().await {
        tracing::warn!(
            url = %config.stats_url,
            error = %e,
            "Initial dashboard load failed, will retry on schedule"
        );
    }

    let state = Arc::new(AppState {
        controller: controller.clone(),
        locale,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/refresh", post(refresh_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen_addr {}", config.listen_addr))?;
    tracing::info!(%addr, stats_url = %config.stats_url, "Starting filefinder-dashboard");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    controller.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
