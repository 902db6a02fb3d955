//! Server startup and graceful shutdown

use crate::state::AppState;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;

/// Start the server with graceful shutdown
///
/// After a termination signal the server keeps serving for the configured grace period,
/// then stops accepting connections and cancels in-flight transfers.
pub async fn start_server(state: Arc<AppState>, app: Router) -> Result<()> {
    let config = &state.config;
    let addr = format!("0.0.0.0:{}", config.server_port);
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        backend_count = config.backend_count,
        backend_capacity_mb = config.backend_capacity_bytes / 1024 / 1024,
        max_upload_mb = config.max_upload_size_bytes / 1024 / 1024,
        split_count = config.split_count,
        min_chunk_size_bytes = config.min_chunk_size_bytes,
        "Server ready and accepting connections"
    );

    let grace = Duration::from_secs(config.shutdown_grace_secs);
    let shutdown = state.shutdown.clone();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            if !grace.is_zero() {
                tracing::info!(grace_secs = grace.as_secs(), "Waiting before shutdown");
                tokio::time::sleep(grace).await;
            }
            shutdown.cancel();
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Signal handler for graceful shutdown
///
/// Listens for Ctrl+C (SIGINT) and SIGTERM signals to initiate graceful shutdown.
///
/// # Panics
/// - Panics if Ctrl+C signal handler cannot be installed (unrecoverable system error)
/// - On Unix systems, panics if SIGTERM signal handler cannot be installed (unrecoverable system error)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
