//! Application state shared by every handler.

use shardstore_core::Config;
use shardstore_services::FileService;
use shardstore_storage::BackendRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub files: FileService,
    pub registry: Arc<BackendRegistry>,
    pub config: Config,
    /// Cancelled when the server shuts down; requests derive child tokens from it.
    pub shutdown: CancellationToken,
}
