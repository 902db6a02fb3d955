//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p shardstore-api`.

use axum::Router;
use axum_test::TestServer;
use shardstore_api::setup::{build_state, routes};
use shardstore_api::AppState;
use shardstore_core::Config;
use std::sync::Arc;

/// Test application: server plus the state behind it.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Small in-memory pool so capacity effects are visible: 7 backends of 1 MiB each.
pub fn create_test_config() -> Config {
    Config {
        backend_capacity_bytes: 1024 * 1024,
        max_upload_size_bytes: 4 * 1024 * 1024,
        shutdown_grace_secs: 0,
        ..Config::default()
    }
}

pub async fn build_router(config: Config) -> (Arc<AppState>, Router) {
    let state = build_state(config.clone())
        .await
        .expect("Failed to build application state");
    let router = routes::setup_routes(&config, state.clone());
    (state, router)
}

pub async fn setup_test_app_with(config: Config) -> TestApp {
    let (state, router) = build_router(config).await;
    let server = TestServer::new(router.into_make_service()).expect("Failed to create test server");
    TestApp { server, state }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(create_test_config()).await
}

/// Deterministic test content
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 253) as u8).collect()
}
