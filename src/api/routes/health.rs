//! Probes for the process, the record database and the chat hub.
//!
//! - GET /health/live
//! - GET /health/ready
//! - GET /health

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// 503 until the record database answers `SELECT 1`.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if database_ok(&state) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Database status plus live chat session count and uptime.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ok = database_ok(&state);

    Json(HealthResponse {
        status: if ok { "healthy" } else { "unhealthy" }.to_string(),
        database: if ok { "ok" } else { "error" }.to_string(),
        chat_sessions: state.hub.session_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn database_ok(state: &AppState) -> bool {
    match state.attachments.records().ping() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Record database health check failed");
            false
        }
    }
}
