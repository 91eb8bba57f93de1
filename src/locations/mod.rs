//! Proximity search service
//!
//! Sits directly above a `LocationStore`. Validates every request before
//! touching the store, derives bulk failure counts from the store's
//! success count, and turns an empty search into `SearchOutcome::NoMatches`
//! so callers can tell "nothing nearby" apart from a store failure.

pub mod import;

use crate::config::{ImportPolicy, LocationsConfig};
use crate::error::{Error, Result};
use crate::geo::{validate_radius, LocationPoint};
use crate::store::{LocationStore, SearchResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

/// Outcome of one bulk write or import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

impl BulkResult {
    /// Build from submitted and written counts; `failed = total - successful`
    pub fn from_counts(total: usize, successful: usize) -> Self {
        let successful = successful.min(total);
        Self {
            total,
            successful,
            failed: total - successful,
        }
    }

    /// True when some submitted records were not written
    pub fn is_partial(&self) -> bool {
        self.failed > 0
    }
}

/// Outcome of a radius search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// At least one location, nearest first
    Found(Vec<SearchResult>),
    /// The search ran and nothing was within range
    NoMatches,
}

impl SearchOutcome {
    fn from_results(results: Vec<SearchResult>) -> Self {
        if results.is_empty() {
            Self::NoMatches
        } else {
            Self::Found(results)
        }
    }
}

/// Limits enforced before any store call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchLimits {
    pub max_radius_meters: f64,
    pub max_batch_size: usize,
}

impl From<&LocationsConfig> for SearchLimits {
    fn from(config: &LocationsConfig) -> Self {
        Self {
            max_radius_meters: config.max_radius_meters,
            max_batch_size: config.max_batch_size,
        }
    }
}

/// Validation and translation layer over a location store
#[derive(Clone)]
pub struct LocationService {
    store: Arc<dyn LocationStore>,
    limits: SearchLimits,
    import_policy: ImportPolicy,
}

impl LocationService {
    /// Create a service over `store` using the limits from `config`
    pub fn new(store: Arc<dyn LocationStore>, config: &LocationsConfig) -> Self {
        Self {
            store,
            limits: SearchLimits::from(config),
            import_policy: config.import_policy,
        }
    }

    /// Record one driver location and return its identity
    pub async fn create_location(&self, point: LocationPoint) -> Result<String> {
        point.validate()?;

        self.store.insert(point).await.map_err(|e| {
            error!(
                error = %e,
                longitude = point.longitude,
                latitude = point.latitude,
                "Failed to create driver location"
            );
            e
        })
    }

    /// Record a batch of driver locations
    ///
    /// The whole batch is validated first; any invalid point or a batch
    /// outside `1..=max_batch_size` is rejected without I/O.
    pub async fn create_locations_bulk(&self, points: &[LocationPoint]) -> Result<BulkResult> {
        if points.is_empty() {
            return Err(Error::InvalidBatch("At least one location is required".to_string()));
        }
        if points.len() > self.limits.max_batch_size {
            return Err(Error::InvalidBatch(format!(
                "Batch of {} exceeds the maximum of {} locations",
                points.len(),
                self.limits.max_batch_size
            )));
        }
        for (index, point) in points.iter().enumerate() {
            point.validate().map_err(|e| batch_item_error(index, e))?;
        }

        self.write_batch(points).await
    }

    /// Submit an already-parsed batch through the unordered bulk write
    ///
    /// Shared by bulk creation and CSV import so both count failures the
    /// same way.
    pub(crate) async fn write_batch(&self, points: &[LocationPoint]) -> Result<BulkResult> {
        if points.is_empty() {
            return Ok(BulkResult::from_counts(0, 0));
        }

        let successful = self.store.insert_many(points).await.map_err(|e| {
            error!(error = %e, total = points.len(), "Failed to create driver locations");
            e
        })?;

        let result = BulkResult::from_counts(points.len(), successful);
        if result.is_partial() {
            warn!(
                total = result.total,
                successful = result.successful,
                failed = result.failed,
                "Some driver locations failed to be created in bulk operation"
            );
        }

        Ok(result)
    }

    /// Find driver locations within `radius_meters` of `point`, nearest first
    pub async fn search(&self, point: LocationPoint, radius_meters: f64) -> Result<SearchOutcome> {
        point.validate()?;
        validate_radius(radius_meters, self.limits.max_radius_meters)?;

        let results = self.store.search(point, radius_meters).await.map_err(|e| {
            error!(
                error = %e,
                longitude = point.longitude,
                latitude = point.latitude,
                radius = radius_meters,
                "Failed to search driver locations"
            );
            e
        })?;

        Ok(SearchOutcome::from_results(results))
    }

    /// Check that the underlying store is reachable
    pub async fn health_check(&self) -> Result<()> {
        self.store.ping().await.map_err(|e| {
            error!(error = %e, "Health check failed");
            Error::Store(format!("Health check failed: {}", e))
        })
    }
}

/// Prefix a coordinate error with the position of the offending batch item
pub(crate) fn batch_item_error(index: usize, err: Error) -> Error {
    match err {
        Error::InvalidCoordinates(reason) => {
            Error::InvalidCoordinates(format!("locations[{}]: {}", index, reason))
        }
        other => other,
    }
}
