//! Spherical distance and search-window helpers

use crate::constants::geo::EARTH_RADIUS_METERS;
use crate::geo::LocationPoint;

/// Padding added to search windows so points sitting exactly on the edge
/// survive floating point error; the exact distance check filters them.
const WINDOW_PADDING_DEG: f64 = 1e-9;

/// A longitude/latitude rectangle, corners as `[lon, lat]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLatWindow {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

/// Calculate the distance between two points in meters (Haversine formula)
pub fn haversine_distance(p1: LocationPoint, p2: LocationPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let delta_lat = (p2.latitude - p1.latitude).to_radians();
    let delta_lng = (p2.longitude - p1.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Rectangles that together cover every point within `radius_meters`
/// of `center`
///
/// Returns one window normally, two when the circle crosses the
/// antimeridian, and a full-longitude band when it reaches a pole.
pub fn search_windows(center: LocationPoint, radius_meters: f64) -> Vec<LonLatWindow> {
    let angular = radius_meters / EARTH_RADIUS_METERS;
    let delta_lat = angular.to_degrees() + WINDOW_PADDING_DEG;

    let min_lat = center.latitude - delta_lat;
    let max_lat = center.latitude + delta_lat;

    if min_lat <= -90.0 || max_lat >= 90.0 || angular >= std::f64::consts::FRAC_PI_2 {
        return vec![LonLatWindow {
            min: [-180.0, min_lat.max(-90.0)],
            max: [180.0, max_lat.min(90.0)],
        }];
    }

    let ratio = angular.sin() / center.latitude.to_radians().cos();
    if ratio >= 1.0 {
        return vec![LonLatWindow {
            min: [-180.0, min_lat],
            max: [180.0, max_lat],
        }];
    }
    let delta_lon = ratio.asin().to_degrees() + WINDOW_PADDING_DEG;

    let min_lon = center.longitude - delta_lon;
    let max_lon = center.longitude + delta_lon;

    if min_lon < -180.0 {
        vec![
            LonLatWindow {
                min: [min_lon + 360.0, min_lat],
                max: [180.0, max_lat],
            },
            LonLatWindow {
                min: [-180.0, min_lat],
                max: [max_lon, max_lat],
            },
        ]
    } else if max_lon > 180.0 {
        vec![
            LonLatWindow {
                min: [min_lon, min_lat],
                max: [180.0, max_lat],
            },
            LonLatWindow {
                min: [-180.0, min_lat],
                max: [max_lon - 360.0, max_lat],
            },
        ]
    } else {
        vec![LonLatWindow {
            min: [min_lon, min_lat],
            max: [max_lon, max_lat],
        }]
    }
}

impl LonLatWindow {
    /// Check whether a point falls inside this window
    pub fn contains(&self, point: LocationPoint) -> bool {
        point.longitude >= self.min[0]
            && point.longitude <= self.max[0]
            && point.latitude >= self.min[1]
            && point.latitude <= self.max[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_haversine_one_degree_latitude() {
        let a = LocationPoint::new(29.0, 40.0);
        let b = LocationPoint::new(29.0, 41.0);

        let distance = haversine_distance(a, b);
        assert_relative_eq!(distance, 111_195.0, max_relative = 0.001);
    }

    #[test]
    fn test_haversine_zero_and_symmetric() {
        let a = LocationPoint::new(28.9784, 41.0082);
        let b = LocationPoint::new(29.0, 41.02);
        assert_eq!(haversine_distance(a, a), 0.0);
        assert_relative_eq!(haversine_distance(a, b), haversine_distance(b, a));
    }

    #[test]
    fn test_single_window_contains_circle_edge() {
        let center = LocationPoint::new(29.0, 41.0);
        let windows = search_windows(center, 1_000.0);
        assert_eq!(windows.len(), 1);

        // ~1km north and east of the center
        let north = LocationPoint::new(29.0, 41.0 + 1_000.0 / 111_195.0);
        assert!(windows[0].contains(north));
        assert!(!windows[0].contains(LocationPoint::new(29.0, 41.1)));
    }

    #[test]
    fn test_antimeridian_splits_window() {
        let center = LocationPoint::new(179.999, 0.0);
        let windows = search_windows(center, 5_000.0);
        assert_eq!(windows.len(), 2);

        let across = LocationPoint::new(-179.99, 0.0);
        assert!(haversine_distance(center, across) < 5_000.0);
        assert!(windows.iter().any(|w| w.contains(across)));
    }

    #[test]
    fn test_pole_uses_full_longitude_band() {
        let center = LocationPoint::new(10.0, 89.99);
        let windows = search_windows(center, 5_000.0);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].min[0], -180.0);
        assert_eq!(windows[0].max[0], 180.0);
    }
}
