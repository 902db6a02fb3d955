//! Route configuration and setup

use crate::handlers;
use crate::middleware::error_details_middleware;
use crate::state::AppState;
use axum::{routing::get, Router};
use shardstore_core::Config;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router<()> {
    let body_limit = usize::try_from(config.max_upload_size_bytes).unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/file/{name}",
            get(handlers::files::download_file)
                .put(handlers::files::upload_file)
                .delete(handlers::files::delete_file),
        )
        .route("/file/{name}/meta", get(handlers::files::file_metadata))
        .route("/backends", get(handlers::backends::list_backends))
        .route("/health", get(handlers::health::health_check))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            error_details_middleware,
        ))
        .with_state(state)
}
