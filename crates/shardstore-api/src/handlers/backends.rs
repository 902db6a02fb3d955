use crate::state::AppState;
use axum::{extract::State, Json};
use shardstore_core::BackendStatus;
use std::sync::Arc;

/// List every registered backend with its current free capacity
#[tracing::instrument(skip(state))]
pub async fn list_backends(State(state): State<Arc<AppState>>) -> Json<Vec<BackendStatus>> {
    Json(state.registry.status().await)
}
