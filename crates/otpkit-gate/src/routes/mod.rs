//! HTTP route handlers for the gate.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod health;
mod otp;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))

        // OTP challenges
        .nest("/otp", otp_routes())

        .layer(TraceLayer::new_for_http())

        // Add shared state
        .with_state(state)
}

/// Challenge lifecycle routes, keyed by token
fn otp_routes() -> Router<AppState> {
    Router::new()
        .route("/issue", post(otp::issue))
        .route("/{token}", get(otp::info).delete(otp::invalidate))
        .route("/{token}/check", post(otp::check))
        .route("/{token}/resend", post(otp::resend))
}
