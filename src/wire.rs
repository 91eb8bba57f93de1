//! JSON bodies of the HTTP surfaces
//!
//! Shared by the servers and by `matching::client`, so both sides of the
//! location search call agree on one definition.

use crate::geo::{GeoJsonPoint, LocationPoint};
use crate::locations::BulkResult;
use crate::store::SearchResult;
use serde::{Deserialize, Serialize};

/// Successful response envelope: `{"success": true, "data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Body of `POST /api/v1/locations` and one item of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocationRequest {
    pub location: GeoJsonPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocationData {
    pub id: String,
    pub message: String,
}

/// Body of `POST /api/v1/locations/batch`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocationBulkRequest {
    pub locations: Vec<CreateLocationRequest>,
}

/// `data` of bulk and import responses
pub type BulkData = BulkResult;

/// Body of `POST /api/v1/locations/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub location: GeoJsonPoint,
    /// Radius in meters
    pub radius: f64,
}

impl SearchRequest {
    pub fn new(point: LocationPoint, radius_meters: f64) -> Self {
        Self {
            location: point.to_geojson(),
            radius: radius_meters,
        }
    }
}

/// One located driver on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationHit {
    pub id: String,
    pub location: GeoJsonPoint,
    /// Meters from the query point
    pub distance: f64,
}

impl From<SearchResult> for LocationHit {
    fn from(result: SearchResult) -> Self {
        Self {
            id: result.id,
            location: result.point.to_geojson(),
            distance: result.distance,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub locations: Vec<LocationHit>,
    #[serde(default)]
    pub total: usize,
}

/// Search response as read by the client
///
/// Lenient on purpose: `success: false` or a missing `data` are read as
/// "no matches" rather than a decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchReply {
    pub success: bool,
    #[serde(default)]
    pub data: Option<SearchData>,
}

/// Body of `POST /api/v1/match`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub location: GeoJsonPoint,
}

/// `data` of a successful match response
pub type MatchData = LocationHit;

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status: "unavailable".to_string(),
        }
    }
}
