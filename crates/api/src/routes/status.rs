//! Health, Diagnostics and Metrics Routes

use axum::{extract::State, http::header, response::IntoResponse, Json};
use scoring::diagnostics::{self, DiagnosticReport};
use scoring::ModelHealth;
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: ModelHealth,
}

/// Health check handler
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let model = state.pipeline.state().health().clone();
    let status = if model.is_degraded() { "degraded" } else { "healthy" };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model,
    })
}

/// Canned-scenario check against the loaded model
pub async fn diagnostics(State(state): State<Arc<AppState>>) -> ApiResult<Json<DiagnosticReport>> {
    Ok(Json(diagnostics::run(&state.pipeline)?))
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
