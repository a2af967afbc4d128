// HTTP request handlers
use crate::application::refresh_controller::CycleOutcome;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::view::DashboardView;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current rendered dashboard
pub async fn get_dashboard(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let view = DashboardView::render(&state.controller.rendered(), state.locale);
    respond(StatusCode::OK, &view, accepts_brotli(&headers)).await
}

/// Manual refresh control. Rejected while disabled, i.e. before the
/// controller is initialized or while a cycle is in flight.
pub async fn refresh_dashboard(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    if !state.controller.refresh_enabled() {
        return (StatusCode::CONFLICT, "refresh unavailable").into_response();
    }

    let status = match state.controller.refresh().await {
        CycleOutcome::Rendered(summary) => {
            tracing::info!(
                counters = summary.counters_updated,
                charts = summary.charts_updated,
                "Manual dashboard refresh rendered"
            );
            StatusCode::OK
        }
        CycleOutcome::Failed(e) => {
            tracing::info!(error = %e, "Manual dashboard refresh failed");
            StatusCode::BAD_GATEWAY
        }
    };

    let view = DashboardView::render(&state.controller.rendered(), state.locale);
    respond(status, &view, accepts_brotli(&headers)).await
}

async fn respond(status: StatusCode, view: &DashboardView, compress: bool) -> Response {
    match json_response(status, view, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
