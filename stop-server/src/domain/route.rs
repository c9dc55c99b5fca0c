//! Route geometry with cumulative distance and time.

use chrono::{DateTime, Utc};

use super::geo::{LatLng, haversine_km};
use super::polyline::decode_polyline;
use super::time::add_minutes;

/// A decoded route vertex with cumulative progress from the start.
///
/// Along a route, both cumulative values are non-decreasing and the first
/// point has both at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,
    pub cumulative_distance_km: f64,
    pub cumulative_duration_min: f64,
}

impl RoutePoint {
    /// The point's coordinate.
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// A resolved driving route.
///
/// Built once per planning request and not modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub origin: String,
    pub destination: String,
    pub waypoints: Vec<String>,
    pub total_distance_km: f64,
    pub total_duration_min: f64,
    pub geometry: String,
    pub points: Vec<RoutePoint>,
}

impl RouteSummary {
    /// Decode `geometry` and apportion the provider's totals over its points.
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        waypoints: Vec<String>,
        geometry: impl Into<String>,
        total_distance_km: f64,
        total_duration_min: f64,
    ) -> Self {
        let geometry = geometry.into();
        let decoded = decode_polyline(&geometry);
        let points = build_route_points(&decoded, total_distance_km, total_duration_min);

        Self {
            origin: origin.into(),
            destination: destination.into(),
            waypoints,
            total_distance_km,
            total_duration_min,
            geometry,
            points,
        }
    }

    /// Project a coordinate onto this route.
    ///
    /// Returns `None` only for a route without points.
    pub fn locate(&self, target: LatLng) -> Option<RoutePosition> {
        locate_on_route(&self.points, target)
    }
}

/// Where a coordinate sits relative to a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePosition {
    /// Index of the nearest route point.
    pub nearest_index: usize,
    /// Great-circle distance to that point.
    pub distance_from_route_km: f64,
    /// Cumulative distance of that point from the start.
    pub distance_from_start_km: f64,
    /// Cumulative driving time of that point from the start.
    pub duration_from_start_min: f64,
}

impl RoutePosition {
    /// Expected arrival given the departure instant.
    pub fn eta(&self, depart_at: DateTime<Utc>) -> DateTime<Utc> {
        add_minutes(depart_at, self.duration_from_start_min)
    }
}

/// Assign cumulative distance and duration to decoded points.
///
/// Totals are apportioned by great-circle sub-segment length, so dense
/// clusters of points do not skew ETAs. A polyline with zero length falls
/// back to apportioning by point index.
pub fn build_route_points(
    decoded: &[LatLng],
    total_distance_km: f64,
    total_duration_min: f64,
) -> Vec<RoutePoint> {
    let Some(first) = decoded.first() else {
        return Vec::new();
    };

    let segment_lengths: Vec<f64> = decoded
        .windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .collect();
    let polyline_length: f64 = segment_lengths.iter().sum();
    let last_index = decoded.len() - 1;

    let mut points = Vec::with_capacity(decoded.len());
    points.push(RoutePoint {
        lat: first.lat,
        lng: first.lng,
        cumulative_distance_km: 0.0,
        cumulative_duration_min: 0.0,
    });

    let mut travelled = 0.0;
    for (i, point) in decoded.iter().enumerate().skip(1) {
        travelled += segment_lengths[i - 1];
        let ratio = if polyline_length > 0.0 {
            (travelled / polyline_length).min(1.0)
        } else {
            i as f64 / last_index as f64
        };

        points.push(RoutePoint {
            lat: point.lat,
            lng: point.lng,
            cumulative_distance_km: total_distance_km * ratio,
            cumulative_duration_min: total_duration_min * ratio,
        });
    }

    points
}

/// Find the route point nearest to `target` by linear scan.
///
/// Ties resolve to the earliest point.
pub fn locate_on_route(points: &[RoutePoint], target: LatLng) -> Option<RoutePosition> {
    let mut best: Option<(usize, f64)> = None;

    for (i, point) in points.iter().enumerate() {
        let d = haversine_km(target, point.position());
        if best.is_none_or(|(_, min)| d < min) {
            best = Some((i, d));
        }
    }

    best.map(|(index, distance)| {
        let point = &points[index];
        RoutePosition {
            nearest_index: index,
            distance_from_route_km: distance,
            distance_from_start_km: point.cumulative_distance_km,
            duration_from_start_min: point.cumulative_duration_min,
        }
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_points() -> impl Strategy<Value = Vec<LatLng>> {
        prop::collection::vec((30.0f64..45.0, 129.0f64..146.0), 2..80)
            .prop_map(|v| v.into_iter().map(|(lat, lng)| LatLng::new(lat, lng)).collect())
    }

    proptest! {
        #[test]
        fn cumulative_values_are_monotonic(
            decoded in arb_points(),
            distance in 0.0f64..2000.0,
            duration in 0.0f64..1500.0,
        ) {
            let points = build_route_points(&decoded, distance, duration);
            prop_assert_eq!(points.len(), decoded.len());
            for pair in points.windows(2) {
                prop_assert!(pair[1].cumulative_distance_km >= pair[0].cumulative_distance_km);
                prop_assert!(pair[1].cumulative_duration_min >= pair[0].cumulative_duration_min);
            }
            let last = points.last().unwrap();
            prop_assert!((last.cumulative_distance_km - distance).abs() < 1e-6);
            prop_assert!((last.cumulative_duration_min - duration).abs() < 1e-6);
        }

        #[test]
        fn locate_is_within_bounds(
            decoded in arb_points(),
            lat in 30.0f64..45.0,
            lng in 129.0f64..146.0,
        ) {
            let points = build_route_points(&decoded, 500.0, 400.0);
            let pos = locate_on_route(&points, LatLng::new(lat, lng)).unwrap();
            prop_assert!(pos.nearest_index < points.len());
            prop_assert!(pos.distance_from_route_km >= 0.0);
        }

        #[test]
        fn locate_on_vertex_is_exact(decoded in arb_points(), pick in any::<prop::sample::Index>()) {
            let points = build_route_points(&decoded, 500.0, 400.0);
            let i = pick.index(points.len());
            let pos = locate_on_route(&points, points[i].position()).unwrap();
            prop_assert_eq!(pos.distance_from_route_km, 0.0);
            // Duplicate vertices resolve to the earliest copy
            prop_assert_eq!(points[pos.nearest_index].position(), points[i].position());
        }
    }
}
