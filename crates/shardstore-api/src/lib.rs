//! Shardstore API Library
//!
//! This crate provides the HTTP handlers, telemetry setup and server bootstrap around
//! the file placement service.

mod handlers;
pub mod error;
pub mod middleware;
pub mod setup;
pub mod state;
pub mod telemetry;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
