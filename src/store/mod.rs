//! Geospatial store backends
//!
//! This module defines the `LocationStore` trait and its implementations.
//! Each backend is a single file implementing the trait.
//!
//! Every backend must:
//! - have its spatial index in place before the constructor returns
//! - write bulk batches unordered, so one bad record never sinks the rest
//! - return search results by ascending distance, capped at `max_results`

pub mod memory;
pub mod mongo;

use crate::config::{Config, StoreBackend};
use crate::error::Result;
use crate::geo::LocationPoint;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// One reported driver position. Every report is a new record.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverLocation {
    /// Store-assigned identity
    pub id: String,
    pub point: LocationPoint,
}

/// A single radius-query hit
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: String,
    pub point: LocationPoint,
    /// Spherical distance from the query point in meters
    pub distance: f64,
}

/// Capability interface over durable location storage
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Backend name (e.g., "mongo", "memory")
    fn name(&self) -> &'static str;

    /// Persist one location and return its assigned identity
    async fn insert(&self, point: LocationPoint) -> Result<String>;

    /// Unordered bulk write
    ///
    /// Each record is attempted independently. Returns how many records
    /// were written; callers derive failures by subtraction.
    async fn insert_many(&self, points: &[LocationPoint]) -> Result<usize>;

    /// All records within `radius_meters` of `point`, nearest first,
    /// truncated to the backend's result cap
    async fn search(&self, point: LocationPoint, radius_meters: f64) -> Result<Vec<SearchResult>>;

    /// Liveness probe against the underlying storage
    async fn ping(&self) -> Result<()>;
}

/// Open the configured store backend
///
/// Fails if the backend cannot be reached or its spatial index cannot
/// be created.
pub async fn open_store(config: &Config) -> Result<Arc<dyn LocationStore>> {
    let max_results = config.locations.max_results;

    let store: Arc<dyn LocationStore> = match config.store.backend {
        StoreBackend::Mongo => Arc::new(mongo::MongoStore::connect(&config.store, max_results).await?),
        StoreBackend::Memory => Arc::new(memory::MemoryStore::new(max_results)),
    };

    info!(backend = store.name(), max_results, "Location store ready");
    Ok(store)
}

/// Information about a store backend
#[derive(Debug, Clone)]
pub struct BackendInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// List all available store backends
pub fn available_backends() -> Vec<BackendInfo> {
    vec![
        BackendInfo {
            name: "mongo",
            description: "MongoDB collection with a 2dsphere index",
        },
        BackendInfo {
            name: "memory",
            description: "In-process R-tree (not durable; for tests and demos)",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_memory_store() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Memory;
        config.locations.max_results = 7;

        let store = open_store(&config).await.unwrap();
        assert_eq!(store.name(), "memory");
        assert!(store.ping().await.is_ok());
    }

    #[test]
    fn test_available_backends() {
        let names: Vec<_> = available_backends().iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["mongo", "memory"]);
    }
}
