use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::AppState;
use crate::worker::StatsSnapshot;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub started_at: DateTime<Utc>,
    pub uptime_secs: f64,
    pub storage_enabled: bool,
    #[serde(flatten)]
    pub pipeline: StatsSnapshot,
}

/// GET /health
/// Liveness: answers as long as the process is up
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /status
/// Pipeline counters and uptime
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = Utc::now().signed_duration_since(state.started_at);

    (
        StatusCode::OK,
        Json(StatusResponse {
            started_at: state.started_at,
            uptime_secs: uptime.num_milliseconds() as f64 / 1000.0,
            storage_enabled: state.storage_enabled,
            pipeline: state.stats.snapshot(),
        }),
    )
}
