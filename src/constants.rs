//! Centralized constants for the driver-locator crate
//!
//! Values shared by the location service, the matching service and the
//! client that connects them.

/// Geographic constants
pub mod geo {
    /// Mean Earth radius in meters (WGS84 approximation)
    pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

    /// GeoJSON geometry type for points
    pub const POINT_TYPE: &str = "Point";
}

/// HTTP surface shared by server and client
pub mod api {
    /// Header carrying the pre-shared key of the location service
    pub const API_KEY_HEADER: &str = "X-API-Key";

    /// Location search path, relative to the service base URL
    pub const SEARCH_PATH: &str = "/api/v1/locations/search";

    /// Health endpoint path
    pub const HEALTH_PATH: &str = "/health";
}

/// User-facing error messages. Internals are never leaked to callers.
pub mod messages {
    pub const INTERNAL_ERROR: &str = "An unexpected error occurred. Please try again later.";
    pub const UNAUTHORIZED: &str = "Unauthorized. You shall not pass!";
    pub const NOT_FOUND: &str = "Not found.";
    pub const LOCATION_CREATED: &str = "Location created successfully";
}
