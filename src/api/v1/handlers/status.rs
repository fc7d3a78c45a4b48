/*
 * Responsibility
 * - GET /status: version + uptime reference for operators
 * - GET /config: sanitized view of the running configuration (no tokens, no URLs with secrets)
 */
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub started_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub backend: String,
    pub realm: String,
    pub app_env: &'static str,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at,
        timestamp: Utc::now(),
    })
}

pub async fn config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        backend: state.backend.to_string(),
        realm: state.access.realm().to_string(),
        app_env: state.app_env.as_str(),
    })
}
