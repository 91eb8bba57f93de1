//! driver-locator: driver location registry and nearest-driver matching
//!
//! Two cooperating HTTP services built on one library:
//!
//! - the **location service** stores driver positions in a geospatial
//!   store (MongoDB 2dsphere or an in-memory R-tree), answers radius
//!   searches nearest-first and ingests CSV dumps;
//! - the **matching service** resolves a rider's position to the single
//!   nearest driver by calling the location service over HTTP.
//!
//! ## Quick Start
//!
//! ```rust
//! use driver_locator::config::LocationsConfig;
//! use driver_locator::geo::LocationPoint;
//! use driver_locator::locations::{LocationService, SearchOutcome};
//! use driver_locator::store::memory::MemoryStore;
//! use std::sync::Arc;
//!
//! # tokio_test_runtime();
//! # fn tokio_test_runtime() {
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let store = Arc::new(MemoryStore::new(100));
//! let service = LocationService::new(store, &LocationsConfig::default());
//!
//! // Coordinates are (longitude, latitude)
//! service.create_location(LocationPoint::new(28.9784, 41.0082)).await.unwrap();
//!
//! match service.search(LocationPoint::new(28.98, 41.01), 1000.0).await.unwrap() {
//!     SearchOutcome::Found(drivers) => println!("nearest: {}", drivers[0].id),
//!     SearchOutcome::NoMatches => println!("nobody nearby"),
//! }
//! # });
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod geo;
pub mod locations;
pub mod logging;
pub mod matching;
pub mod server;
pub mod store;
pub mod wire;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use geo::LocationPoint;
pub use locations::{BulkResult, LocationService, SearchOutcome};
pub use matching::{MatchOutcome, MatchResolver};
pub use store::LocationStore;
