//! Nearest-driver matching
//!
//! Resolves a rider's position to the single closest driver by asking
//! the location service for drivers within a fixed radius and taking the
//! first result. The location service already orders by distance, so the
//! list is not re-sorted here.

pub mod client;

use crate::config::MatchingConfig;
use crate::error::Result;
use crate::geo::LocationPoint;
use crate::locations::SearchOutcome;
use client::SearchClient;
use std::sync::Arc;
use tracing::{debug, error};

/// The driver chosen for a rider
#[derive(Debug, Clone, PartialEq)]
pub struct DriverMatch {
    pub id: String,
    pub point: LocationPoint,
    /// Meters from the rider
    pub distance: f64,
}

/// Result of a match attempt
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(DriverMatch),
    /// No driver within the search radius
    NotFound,
}

/// Picks the nearest driver for a rider
#[derive(Clone)]
pub struct MatchResolver {
    client: Arc<dyn SearchClient>,
    search_radius_meters: f64,
}

impl MatchResolver {
    pub fn new(client: Arc<dyn SearchClient>, config: &MatchingConfig) -> Self {
        Self {
            client,
            search_radius_meters: config.search_radius_meters,
        }
    }

    /// Radius used for every search
    pub fn search_radius_meters(&self) -> f64 {
        self.search_radius_meters
    }

    /// Find the nearest driver to `rider`
    ///
    /// Invalid coordinates are rejected before the location service is
    /// called. Transport failures propagate as errors and are never
    /// reported as `NotFound`.
    pub async fn find_nearest(&self, rider: LocationPoint) -> Result<MatchOutcome> {
        rider.validate()?;

        let outcome = self
            .client
            .search_drivers(rider, self.search_radius_meters)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    longitude = rider.longitude,
                    latitude = rider.latitude,
                    "Failed to search nearby drivers"
                );
                e
            })?;

        let nearest = match outcome {
            SearchOutcome::Found(results) => results.into_iter().next(),
            SearchOutcome::NoMatches => None,
        };

        Ok(match nearest {
            Some(result) => MatchOutcome::Matched(DriverMatch {
                id: result.id,
                point: result.point,
                distance: result.distance,
            }),
            None => {
                debug!(radius = self.search_radius_meters, "No driver within search radius");
                MatchOutcome::NotFound
            }
        })
    }

    /// Liveness only; the location service is not probed
    pub async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::SearchResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Search client returning a scripted outcome and recording its calls
    pub(crate) struct ScriptedClient {
        outcome: fn() -> Result<SearchOutcome>,
        pub calls: Mutex<Vec<(LocationPoint, f64)>>,
    }

    impl ScriptedClient {
        pub(crate) fn new(outcome: fn() -> Result<SearchOutcome>) -> Self {
            Self {
                outcome,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchClient for ScriptedClient {
        async fn search_drivers(&self, point: LocationPoint, radius_meters: f64) -> Result<SearchOutcome> {
            self.calls.lock().unwrap().push((point, radius_meters));
            (self.outcome)()
        }
    }

    pub(crate) fn two_drivers() -> Result<SearchOutcome> {
        Ok(SearchOutcome::Found(vec![
            SearchResult {
                id: "d1".to_string(),
                point: LocationPoint::new(29.0, 41.0),
                distance: 120.0,
            },
            SearchResult {
                id: "d2".to_string(),
                point: LocationPoint::new(29.01, 41.0),
                distance: 840.0,
            },
        ]))
    }

    pub(crate) fn no_drivers() -> Result<SearchOutcome> {
        Ok(SearchOutcome::NoMatches)
    }

    pub(crate) fn unreachable() -> Result<SearchOutcome> {
        Err(Error::Transport("connection refused".to_string()))
    }

    fn resolver(client: Arc<ScriptedClient>) -> MatchResolver {
        MatchResolver::new(client, &MatchingConfig::default())
    }

    #[tokio::test]
    async fn test_takes_first_result() {
        let client = Arc::new(ScriptedClient::new(two_drivers));
        let outcome = resolver(client.clone())
            .find_nearest(LocationPoint::new(29.0, 41.0))
            .await
            .unwrap();

        match outcome {
            MatchOutcome::Matched(m) => {
                assert_eq!(m.id, "d1");
                assert_eq!(m.distance, 120.0);
            }
            MatchOutcome::NotFound => panic!("expected a match"),
        }
    }

    #[tokio::test]
    async fn test_uses_configured_radius_once() {
        let client = Arc::new(ScriptedClient::new(two_drivers));
        let config = MatchingConfig {
            search_radius_meters: 2500.0,
            ..MatchingConfig::default()
        };
        let resolver = MatchResolver::new(client.clone(), &config);

        resolver.find_nearest(LocationPoint::new(29.0, 41.0)).await.unwrap();

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (LocationPoint::new(29.0, 41.0), 2500.0));
    }

    #[tokio::test]
    async fn test_default_radius_is_8km() {
        let resolver = resolver(Arc::new(ScriptedClient::new(no_drivers)));
        assert_eq!(resolver.search_radius_meters(), 8000.0);
    }

    #[tokio::test]
    async fn test_no_matches_is_not_found() {
        let outcome = resolver(Arc::new(ScriptedClient::new(no_drivers)))
            .find_nearest(LocationPoint::new(29.0, 41.0))
            .await
            .unwrap();
        assert_eq!(outcome, MatchOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_transport_error_is_not_not_found() {
        let result = resolver(Arc::new(ScriptedClient::new(unreachable)))
            .find_nearest(LocationPoint::new(29.0, 41.0))
            .await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_invalid_rider_skips_search() {
        let client = Arc::new(ScriptedClient::new(two_drivers));
        let result = resolver(client.clone())
            .find_nearest(LocationPoint::new(181.0, 41.0))
            .await;

        assert!(matches!(result, Err(Error::InvalidCoordinates(_))));
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_is_always_ok() {
        let resolver = resolver(Arc::new(ScriptedClient::new(unreachable)));
        assert!(resolver.health_check().await.is_ok());
    }
}
