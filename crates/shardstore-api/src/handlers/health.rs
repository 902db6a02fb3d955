//! Health check handler and response type.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub backends: usize,
    /// Backends whose free capacity could be read
    pub backends_reachable: usize,
}

/// Liveness probe with a summary of the backend pool
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.registry.status().await;
    let reachable = status.iter().filter(|b| b.free_capacity.is_some()).count();

    (
        StatusCode::OK,
        Json(HealthCheckResponse {
            status: "healthy".to_string(),
            backends: status.len(),
            backends_reachable: reachable,
        }),
    )
}
