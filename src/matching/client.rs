//! Remote location client
//!
//! Calls the location service's search endpoint over HTTP. One attempt
//! per call with a fixed timeout; no retries. A 404 is the service's way
//! of saying "no drivers in range" and is returned as
//! `SearchOutcome::NoMatches`, never as an error.
//!
//! Responses are checked for shape (GeoJSON points, finite distances)
//! but their order is passed through untouched.

use crate::config::MatchingConfig;
use crate::constants::api::{API_KEY_HEADER, SEARCH_PATH};
use crate::error::{Error, Result};
use crate::geo::{parse_point, LocationPoint};
use crate::locations::SearchOutcome;
use crate::store::SearchResult;
use crate::wire::{LocationHit, SearchReply, SearchRequest};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Capability interface for finding drivers near a point
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Drivers within `radius_meters` of `point`, nearest first
    async fn search_drivers(&self, point: LocationPoint, radius_meters: f64) -> Result<SearchOutcome>;
}

/// HTTP client for the location service
#[derive(Debug, Clone)]
pub struct RemoteLocationClient {
    client: reqwest::Client,
    search_url: String,
    api_key: String,
    timeout: Duration,
}

impl RemoteLocationClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            search_url: format!("{}{}", base_url.trim_end_matches('/'), SEARCH_PATH),
            api_key: api_key.into(),
            timeout,
        })
    }

    /// Create a client from the matching service settings
    pub fn from_config(config: &MatchingConfig) -> Result<Self> {
        Self::new(
            &config.driver_location_base_url,
            config.driver_location_api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Full URL of the search endpoint
    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    fn hit_to_result(hit: LocationHit) -> Result<SearchResult> {
        let point = parse_point(&hit.location).map_err(|e| {
            Error::Transport(format!("Malformed location for driver {}: {}", hit.id, e))
        })?;

        if !hit.distance.is_finite() || hit.distance < 0.0 {
            return Err(Error::Transport(format!(
                "Malformed distance for driver {}: {}",
                hit.id, hit.distance
            )));
        }

        Ok(SearchResult {
            id: hit.id,
            point,
            distance: hit.distance,
        })
    }
}

#[async_trait]
impl SearchClient for RemoteLocationClient {
    async fn search_drivers(&self, point: LocationPoint, radius_meters: f64) -> Result<SearchOutcome> {
        let response = self
            .client
            .post(&self.search_url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&SearchRequest::new(point, radius_meters))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Transport(format!(
                        "Location service did not answer within {:?}",
                        self.timeout
                    ))
                } else {
                    Error::Transport(format!("Location service request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(radius = radius_meters, "Location service reported no drivers");
            return Ok(SearchOutcome::NoMatches);
        }
        if status != StatusCode::OK {
            return Err(Error::Transport(format!(
                "Location service returned unexpected status: {}",
                status
            )));
        }

        let reply: SearchReply = response.json().await.map_err(|e| {
            Error::Transport(format!("Failed to parse location service response: {}", e))
        })?;

        let hits = match reply.data {
            Some(data) if reply.success && !data.locations.is_empty() => data.locations,
            _ => return Ok(SearchOutcome::NoMatches),
        };

        let results = hits
            .into_iter()
            .map(Self::hit_to_result)
            .collect::<Result<Vec<_>>>()?;

        Ok(SearchOutcome::Found(results))
    }
}
