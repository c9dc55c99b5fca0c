//! Sources of rest-facility candidates.
//!
//! Each source sits behind [`RestProvider`] so the planner can try them in
//! order without knowing how any of them fetch or classify facilities.
//! Classification of free-text names and tags lives in one pure function
//! per source.

mod error;
mod overpass;
mod places;
mod seed;

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;

use crate::domain::{
    Equipment, EquipmentFilter, Facility, FacilityClass, FacilityTypeFilter, LatLng, RoutePoint,
    RouteSummary, StopCandidate,
};

pub use error::ProviderError;
pub use overpass::{
    OverpassClient, OverpassConfig, OverpassElement, OverpassResponse, build_query,
    classify_osm_tags, prioritize_endpoints,
};
pub use places::{
    NearbyResult, PlaceDetails, PlacesClient, PlacesConfig, PlacesFuelLookup,
    PlacesRestProvider, classify_place,
};
pub use seed::{LocalSeedProvider, SeedRest};

/// Service-area or parking-area markers in a facility name.
///
/// `SA`/`PA` only count as standalone tokens, so words like "spa" or
/// "Japan" do not match.
pub(crate) static SA_PA_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z])(?:sa|pa)(?:$|[^a-z])|サービスエリア|パーキングエリア")
        .expect("SA/PA pattern is valid")
});

/// Everything a provider needs to find candidates for one request.
#[derive(Debug, Clone, Copy)]
pub struct ProviderContext<'a> {
    pub route: &'a RouteSummary,
    pub depart_at: DateTime<Utc>,
    pub facility_types: FacilityTypeFilter,
    pub equipment: EquipmentFilter,
}

impl ProviderContext<'_> {
    /// Returns true if the facility passes both filters.
    pub fn accepts(&self, class: &FacilityClass, equipment: &Equipment) -> bool {
        self.facility_types.accepts(class) && self.equipment.accepts(equipment)
    }

    /// Project a facility onto the route. `None` only for an empty route.
    pub fn place(&self, facility: Facility) -> Option<StopCandidate> {
        let position = self.route.locate(facility.position)?;
        Some(facility.place_on_route(&position, self.depart_at))
    }
}

/// A source of rest-facility candidates.
#[async_trait]
pub trait RestProvider: Send + Sync {
    /// Short name used in warnings and logs.
    fn name(&self) -> &str;

    /// Maximum distance from the route for this source's candidates.
    fn corridor_km(&self) -> f64;

    /// Fetch candidates matching the context's filters, sorted by
    /// distance from start.
    async fn fetch_candidates(
        &self,
        ctx: &ProviderContext<'_>,
    ) -> Result<Vec<StopCandidate>, ProviderError>;
}

/// What a classifier decided about one facility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub class: FacilityClass,
    pub equipment: Equipment,
}

/// Pick route points roughly `step_km` apart, starting at the first point.
///
/// Points past `limit_km` are ignored. Always yields the first point of a
/// non-empty route.
pub fn sample_points(points: &[RoutePoint], step_km: f64, limit_km: f64, max: usize) -> Vec<LatLng> {
    let mut out = Vec::new();
    let mut next_target = 0.0;

    for point in points {
        if out.len() >= max || point.cumulative_distance_km > limit_km {
            break;
        }
        if point.cumulative_distance_km >= next_target {
            out.push(point.position());
            next_target += step_km;
        }
    }

    if out.is_empty() {
        out.extend(points.first().map(RoutePoint::position));
    }

    out
}

/// Sort candidates by distance from start, keeping the input order for ties.
pub fn sort_by_distance_from_start(candidates: &mut [StopCandidate]) {
    candidates.sort_by(|a, b| a.distance_from_start_km.total_cmp(&b.distance_from_start_km));
}

/// Await `fut` for at most `timeout_ms`.
pub(crate) async fn with_timeout<T, F>(
    label: &str,
    timeout_ms: u64,
    fut: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    tokio::time::timeout(Duration::from_millis(timeout_ms), fut)
        .await
        .map_err(|_| ProviderError::timeout(label, timeout_ms))?
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use axum::Router;

    use crate::domain::{LatLng, RouteSummary, encode_polyline};

    /// Requests seen by a local test server, in arrival order.
    pub type Hits = Arc<Mutex<Vec<String>>>;

    /// Serve `router` on an ephemeral local port. Returns the base URL.
    pub async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    pub fn record(hits: &Hits, what: impl Into<String>) {
        hits.lock().unwrap().push(what.into());
    }

    pub fn recorded(hits: &Hits) -> Vec<String> {
        hits.lock().unwrap().clone()
    }

    /// An eastbound route of `stops` evenly spaced points, `km_per_step` apart.
    pub fn eastbound_route(stops: usize, km_per_step: f64) -> RouteSummary {
        let coords: Vec<LatLng> = (0..stops)
            .map(|i| LatLng::new(35.0, 139.0 + i as f64 * 0.1))
            .collect();
        let total = km_per_step * (stops.saturating_sub(1)) as f64;
        RouteSummary::new("a", "b", vec![], encode_polyline(&coords), total, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(distances: &[f64]) -> Vec<RoutePoint> {
        distances
            .iter()
            .enumerate()
            .map(|(i, d)| RoutePoint {
                lat: 35.0 + i as f64 * 0.01,
                lng: 139.0,
                cumulative_distance_km: *d,
                cumulative_duration_min: *d,
            })
            .collect()
    }

    #[test]
    fn samples_by_distance() {
        let pts = points(&[0.0, 10.0, 36.0, 50.0, 71.0, 110.0]);
        let sampled = sample_points(&pts, 35.0, f64::INFINITY, 25);
        // targets 0, 35, 70, 105
        assert_eq!(sampled.len(), 4);
        assert_eq!(sampled[1], pts[2].position());
        assert_eq!(sampled[3], pts[5].position());
    }

    #[test]
    fn samples_respect_max_and_limit() {
        let pts = points(&[0.0, 40.0, 80.0, 120.0, 160.0]);
        assert_eq!(sample_points(&pts, 35.0, f64::INFINITY, 2).len(), 2);
        assert_eq!(sample_points(&pts, 35.0, 100.0, 25).len(), 3);
    }

    #[test]
    fn samples_empty_route() {
        assert!(sample_points(&[], 35.0, f64::INFINITY, 25).is_empty());
    }

    #[tokio::test]
    async fn timeout_helper_labels_error() {
        let err = with_timeout("slow", 10, async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, ProviderError>(())
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "slow timeout (10ms)");
    }
}
