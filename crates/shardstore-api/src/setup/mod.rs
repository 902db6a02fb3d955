//! Application setup and initialization
//!
//! Builds the backend pool, the metadata store and the file service from configuration,
//! then wires them into the router.

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use shardstore_core::Config;
use shardstore_meta::InMemoryMetadataStore;
use shardstore_services::{FileService, FileServiceConfig};
use shardstore_storage::create_backends;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Build the application state: backend pool, metadata store and file service
pub async fn build_state(config: Config) -> Result<Arc<AppState>> {
    config.validate().context("Configuration validation failed")?;

    let registry = Arc::new(
        create_backends(&config)
            .await
            .context("Failed to create backend pool")?,
    );
    let metadata = Arc::new(InMemoryMetadataStore::new());
    let files = FileService::new(
        registry.clone(),
        metadata,
        FileServiceConfig::from_config(&config),
    );

    Ok(Arc::new(AppState {
        files,
        registry,
        config,
        shutdown: CancellationToken::new(),
    }))
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    tracing::info!(
        environment = %config.environment,
        backend_type = %config.storage_backend,
        backend_count = config.backend_count,
        split_count = config.split_count,
        "Configuration loaded and validated successfully"
    );

    let state = build_state(config.clone()).await?;
    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
