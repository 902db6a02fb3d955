//! Backend registry
//!
//! Holds the pool of backend stores and ranks them by free capacity when a file
//! is placed.

use crate::traits::Storage;
use futures::future::join_all;
use shardstore_core::{AppError, AppResult, BackendStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct RegistryInner {
    by_id: HashMap<String, Arc<dyn Storage>>,
    /// Registration order, used as the tie-breaker when ranking
    ranked: Vec<Arc<dyn Storage>>,
}

/// Registry of backend stores keyed by identifier
///
/// The identifier map and the ranking list are only ever updated together by
/// [`BackendRegistry::register`], under the same write lock.
#[derive(Default)]
pub struct BackendRegistry {
    inner: RwLock<RegistryInner>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a backend to the pool under its own identifier
    pub async fn register(&self, backend: Arc<dyn Storage>) -> AppResult<()> {
        let id = backend.identifier().to_string();
        let mut inner = self.inner.write().await;

        if inner.by_id.contains_key(&id) {
            return Err(AppError::DuplicateBackend(id));
        }

        inner.by_id.insert(id.clone(), backend.clone());
        inner.ranked.push(backend);

        tracing::debug!(backend = %id, total = inner.ranked.len(), "Backend registered");
        Ok(())
    }

    /// Resolve a backend identifier recorded in file metadata
    pub async fn lookup(&self, id: &str) -> AppResult<Arc<dyn Storage>> {
        self.inner
            .read()
            .await
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::BackendNotFound(id.to_string()))
    }

    /// Pick `count` distinct backends, most free capacity first.
    ///
    /// Capacities are queried concurrently and reflect a single point in time;
    /// nothing is reserved. Backends whose capacity cannot be read are left out of
    /// this round. Equal capacities keep registration order.
    #[tracing::instrument(skip(self))]
    pub async fn select_for_write(&self, count: usize) -> AppResult<Vec<Arc<dyn Storage>>> {
        let candidates = self.inner.read().await.ranked.clone();

        if candidates.len() < count {
            return Err(AppError::InsufficientBackends {
                requested: count,
                available: candidates.len(),
            });
        }

        let capacities = join_all(candidates.iter().map(|b| b.free_capacity())).await;

        let mut ranked: Vec<(u64, Arc<dyn Storage>)> = Vec::with_capacity(candidates.len());
        for (backend, capacity) in candidates.into_iter().zip(capacities) {
            match capacity {
                Ok(free) => ranked.push((free, backend)),
                Err(e) => {
                    tracing::warn!(
                        backend = %backend.identifier(),
                        error = %e,
                        "Skipping backend whose free capacity could not be read"
                    );
                }
            }
        }

        if ranked.len() < count {
            return Err(AppError::InsufficientBackends {
                requested: count,
                available: ranked.len(),
            });
        }

        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        ranked.truncate(count);

        tracing::debug!(
            selected = ?ranked
                .iter()
                .map(|(free, b)| format!("{}={}", b.identifier(), free))
                .collect::<Vec<_>>(),
            "Backends selected for write"
        );

        Ok(ranked.into_iter().map(|(_, backend)| backend).collect())
    }

    /// Number of registered backends
    pub async fn len(&self) -> usize {
        self.inner.read().await.ranked.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Identifiers in registration order
    pub async fn identifiers(&self) -> Vec<String> {
        self.inner
            .read()
            .await
            .ranked
            .iter()
            .map(|b| b.identifier().to_string())
            .collect()
    }

    /// Snapshot of every backend and its free capacity, in registration order.
    /// A backend whose capacity cannot be read reports `None`.
    pub async fn status(&self) -> Vec<BackendStatus> {
        let backends = self.inner.read().await.ranked.clone();
        let capacities = join_all(backends.iter().map(|b| b.free_capacity())).await;

        backends
            .iter()
            .zip(capacities)
            .map(|(backend, capacity)| BackendStatus {
                id: backend.identifier().to_string(),
                backend: backend.backend_type(),
                free_capacity: capacity.ok(),
            })
            .collect()
    }
}
