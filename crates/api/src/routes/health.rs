//! Liveness probe.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

/// Body of `GET /health`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `healthy` when the process answers.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Open accounts.
    pub accounts: usize,
    /// Proof storage backend.
    pub storage: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        accounts: state.repository.account_count(),
        storage: state.storage.provider_name(),
    })
}

/// Public route, mounted outside the auth layer.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
