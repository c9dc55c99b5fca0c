//! Great-circle geometry on WGS84 coordinates.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for all distance calculations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Create a coordinate from latitude and longitude.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns true if both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Format as `lat,lng`, the form routing providers accept as a place.
    pub fn to_query_string(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

/// Great-circle distance between two coordinates in kilometres (haversine).
///
/// # Examples
///
/// ```
/// use stop_server::domain::{LatLng, haversine_km};
///
/// let tokyo = LatLng::new(35.6812, 139.7671);
/// assert_eq!(haversine_km(tokyo, tokyo), 0.0);
/// ```
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}
