//! Directions API request and response types.

use serde::Deserialize;

/// Places to route between, in visiting order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteQuery {
    pub origin: String,
    pub destination: String,
    pub waypoints: Vec<String>,
}

impl RouteQuery {
    /// Create a query.
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        waypoints: Vec<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            waypoints,
        }
    }
}

/// What a routing provider returns: geometry plus summed leg totals.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRoute {
    pub polyline: String,
    pub total_distance_km: f64,
    pub total_duration_min: f64,
}

/// Top-level Directions API response.
#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DirectionsRoute {
    pub overview_polyline: OverviewPolyline,
    #[serde(default)]
    pub legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
pub struct OverviewPolyline {
    pub points: String,
}

#[derive(Debug, Deserialize)]
pub struct DirectionsLeg {
    pub distance: ValueField,
    pub duration: ValueField,
}

/// Metres or seconds, depending on the field.
#[derive(Debug, Deserialize)]
pub struct ValueField {
    pub value: f64,
}

impl DirectionsRoute {
    /// Sum the legs into a [`RawRoute`].
    pub fn to_raw_route(&self) -> RawRoute {
        RawRoute {
            polyline: self.overview_polyline.points.clone(),
            total_distance_km: self.legs.iter().map(|l| l.distance.value / 1000.0).sum(),
            total_duration_min: self.legs.iter().map(|l| l.duration.value / 60.0).sum(),
        }
    }
}
