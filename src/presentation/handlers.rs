// HTTP request handlers
use crate::presentation::app_state::AppState;
use crate::presentation::view::DashboardView;
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LiveToggle {
    pub enabled: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current dashboard view
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(DashboardView::from_state(&state.poller.snapshot()))
}

/// Turn live polling on or off
pub async fn set_live(
    State(state): State<Arc<AppState>>,
    Json(toggle): Json<LiveToggle>,
) -> Json<DashboardView> {
    state.poller.set_live_enabled(toggle.enabled);
    Json(DashboardView::from_state(&state.poller.snapshot()))
}

/// Manual refresh; refused with 409 while live or while a fetch is in flight
pub async fn refresh(State(state): State<Arc<AppState>>) -> (StatusCode, Json<DashboardView>) {
    let accepted = state.poller.refresh_manual().await;
    let status = if accepted {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    (status, Json(DashboardView::from_state(&state.poller.snapshot())))
}
