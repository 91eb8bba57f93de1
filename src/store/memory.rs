//! In-process R-tree store
//!
//! Keeps every record in an `rstar` tree keyed on `[lon, lat]`. Radius
//! queries narrow candidates with bounding windows from
//! `geo::distance::search_windows`, then apply the exact haversine
//! check. Nothing survives a restart.

use crate::error::Result;
use crate::geo::distance::{haversine_distance, search_windows};
use crate::geo::LocationPoint;
use crate::store::{DriverLocation, LocationStore, SearchResult};
use async_trait::async_trait;
use rstar::{RTree, RTreeObject, AABB};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

impl RTreeObject for DriverLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.longitude, self.point.latitude])
    }
}

/// In-memory location store
pub struct MemoryStore {
    tree: RwLock<RTree<DriverLocation>>,
    max_results: usize,
}

impl MemoryStore {
    /// Create an empty store returning at most `max_results` per search
    pub fn new(max_results: usize) -> Self {
        Self {
            tree: RwLock::new(RTree::new()),
            max_results,
        }
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.tree.read().await.size()
    }

    /// Check whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn new_record(point: LocationPoint) -> Result<DriverLocation> {
        // Same rule a 2dsphere index applies: out-of-range geometry is refused
        point.validate()?;
        Ok(DriverLocation {
            id: Uuid::new_v4().simple().to_string(),
            point,
        })
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, point: LocationPoint) -> Result<String> {
        let record = Self::new_record(point)?;
        let id = record.id.clone();
        self.tree.write().await.insert(record);
        Ok(id)
    }

    async fn insert_many(&self, points: &[LocationPoint]) -> Result<usize> {
        let mut tree = self.tree.write().await;
        let mut inserted = 0;

        for point in points {
            match Self::new_record(*point) {
                Ok(record) => {
                    tree.insert(record);
                    inserted += 1;
                }
                Err(e) => debug!(error = %e, "Skipping record in unordered bulk write"),
            }
        }

        Ok(inserted)
    }

    async fn search(&self, point: LocationPoint, radius_meters: f64) -> Result<Vec<SearchResult>> {
        let guard = self.tree.read().await;
        let tree: &RTree<DriverLocation> = &guard;

        let mut results: Vec<SearchResult> = search_windows(point, radius_meters)
            .into_iter()
            .flat_map(|window| {
                tree.locate_in_envelope_intersecting(&AABB::from_corners(window.min, window.max))
            })
            .filter_map(|record| {
                let distance = haversine_distance(point, record.point);
                (distance <= radius_meters).then(|| SearchResult {
                    id: record.id.clone(),
                    point: record.point,
                    distance,
                })
            })
            .collect();

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(self.max_results);

        Ok(results)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
