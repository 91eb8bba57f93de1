//! Geographic primitives
//!
//! `LocationPoint` is the single internal coordinate type. It always
//! travels as a GeoJSON point, whose coordinate order is
//! `[longitude, latitude]`; the conversions in this module are the only
//! place where that order is read or written.

pub mod distance;

use crate::constants::geo::POINT_TYPE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A geographic coordinate (longitude, latitude)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl LocationPoint {
    /// Create a new point. Note the argument order: longitude first.
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Validate that coordinates are within valid ranges
    ///
    /// Latitude: -90 to 90
    /// Longitude: -180 to 180
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || self.latitude < -90.0 || self.latitude > 90.0 {
            return Err(Error::InvalidCoordinates(format!(
                "Latitude {} is out of range [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || self.longitude < -180.0 || self.longitude > 180.0 {
            return Err(Error::InvalidCoordinates(format!(
                "Longitude {} is out of range [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Convert to the GeoJSON wire shape
    pub fn to_geojson(&self) -> GeoJsonPoint {
        GeoJsonPoint::from(*self)
    }
}

/// GeoJSON point as it appears on the wire and in the store
///
/// Example: `{"type": "Point", "coordinates": [28.9784, 41.0082]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl From<LocationPoint> for GeoJsonPoint {
    fn from(point: LocationPoint) -> Self {
        Self {
            kind: POINT_TYPE.to_string(),
            coordinates: vec![point.longitude, point.latitude],
        }
    }
}

impl TryFrom<&GeoJsonPoint> for LocationPoint {
    type Error = Error;

    /// Checks shape only; range checks are left to `validate`
    fn try_from(geojson: &GeoJsonPoint) -> Result<Self> {
        if geojson.kind != POINT_TYPE {
            return Err(Error::InvalidCoordinates(format!(
                "Expected geometry type '{}', got '{}'",
                POINT_TYPE, geojson.kind
            )));
        }
        match geojson.coordinates.as_slice() {
            [longitude, latitude] => Ok(LocationPoint::new(*longitude, *latitude)),
            other => Err(Error::InvalidCoordinates(format!(
                "Point must have exactly 2 coordinates [lon, lat], got {}",
                other.len()
            ))),
        }
    }
}

impl TryFrom<GeoJsonPoint> for LocationPoint {
    type Error = Error;

    fn try_from(geojson: GeoJsonPoint) -> Result<Self> {
        LocationPoint::try_from(&geojson)
    }
}

/// Parse and range-check a GeoJSON point in one step
pub fn parse_point(geojson: &GeoJsonPoint) -> Result<LocationPoint> {
    let point = LocationPoint::try_from(geojson)?;
    point.validate()?;
    Ok(point)
}

/// Validate a search radius in meters
///
/// The radius must be finite, strictly positive and no larger than
/// `max_meters` (inclusive).
pub fn validate_radius(radius_meters: f64, max_meters: f64) -> Result<()> {
    if !radius_meters.is_finite() || radius_meters <= 0.0 {
        return Err(Error::InvalidRadius(format!(
            "Radius must be positive, got {}",
            radius_meters
        )));
    }
    if radius_meters > max_meters {
        return Err(Error::InvalidRadius(format!(
            "Radius {} exceeds maximum of {} meters",
            radius_meters, max_meters
        )));
    }
    Ok(())
}
