//! Health check endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Basic health check (is the server running?)
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    store: bool,
    backend: &'static str,
}

/// Readiness check (is the solution store reachable?)
pub async fn ready_check(
    State(state): State<AppState>,
) -> Result<Json<ReadyResponse>, StatusCode> {
    let backend = if state.config.redis_url.is_some() {
        "redis"
    } else {
        "memory"
    };

    match state.otp.ping().await {
        Ok(()) => Ok(Json(ReadyResponse {
            status: "ready",
            store: true,
            backend,
        })),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
