//! Geographic coordinates and great-circle distance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used for Haversine distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoPointError {
    #[error("latitude must be within [-90, 90] (got {0})")]
    Latitude(f64),
    #[error("longitude must be within [-180, 180] (got {0})")]
    Longitude(f64),
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// # Errors
    ///
    /// Returns an error for non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoPointError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoPointError::Latitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoPointError::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Haversine distance to `other` in kilometers.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let origin = GeoPoint::new(0.0, 0.0).unwrap();
        assert!(origin.distance_km(&origin).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric() {
        let a = GeoPoint::new(12.9716, 77.5946).unwrap();
        let b = GeoPoint::new(19.0760, 72.8777).unwrap();
        assert!((a.distance_km(&b) - b.distance_km(&a)).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance() {
        let nyc = GeoPoint::new(40.7128, -74.0060).unwrap();
        let la = GeoPoint::new(34.0522, -118.2437).unwrap();
        assert!((nyc.distance_km(&la) - 3936.0).abs() < 50.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(1.0, 0.0).unwrap();
        assert!((a.distance_km(&b) - 111.19).abs() < 0.1);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(GeoPoint::new(91.0, 0.0), Err(GeoPointError::Latitude(_))));
        assert!(matches!(GeoPoint::new(0.0, -181.0), Err(GeoPointError::Longitude(_))));
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }
}
