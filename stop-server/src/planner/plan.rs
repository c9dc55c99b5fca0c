//! The planning sequence: link, route, rest stops, fuel, windows.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::cascade::RestCascade;
use super::error::PlanError;
use super::fuel::{FuelCollector, FuelPreferences};
use super::schedule::{RestStyle, RestWindow, build_rest_windows};
use crate::domain::{EquipmentFilter, FacilityTypeFilter, RouteSummary, StopCandidate};
use crate::fuel::FuelMaster;
use crate::link::{LinkError, LinkResolver, ResolvedLink};
use crate::providers::ProviderContext;
use crate::routing::{RawRoute, RouteProvider, RouteQuery};

const COORDINATE_FALLBACK_WARNING: &str =
    "route re-fetched from coordinates embedded in the link (lower confidence)";
const NO_REST_WARNING: &str =
    "no rest stops found along the route; relax the facility type or equipment filters";
const NO_FUEL_WARNING: &str =
    "no fuel stations found along the route; widen the fuel range or accept both brands";

/// A validated planning request.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub map_url: String,
    pub depart_at: DateTime<Utc>,
    pub extra_waypoints: Vec<String>,
    pub allow_extended_drive: bool,
    pub rest_style: RestStyle,
    pub facility_types: FacilityTypeFilter,
    pub equipment: EquipmentFilter,
    pub fuel: FuelPreferences,
}

/// `fallback` whenever anything was substituted or skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Ok,
    Fallback,
}

/// The places the route was actually built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRouteInput {
    pub final_expanded_url: String,
    pub origin: String,
    pub destination: String,
    pub waypoints: Vec<String>,
}

/// Everything a plan produced.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub status: PlanStatus,
    pub warnings: Vec<String>,
    pub extracted: ExtractedRouteInput,
    pub route: RouteSummary,
    pub rest_windows: Vec<RestWindow>,
    pub fuel_candidates: Vec<StopCandidate>,
}

/// Runs the whole planning sequence.
///
/// Only an unusable link, an unresolvable route or missing configuration
/// fail a plan. Everything else is recovered and reported as a warning.
pub struct Planner {
    routes: Arc<dyn RouteProvider>,
    links: LinkResolver,
    rest: RestCascade,
    fuel: FuelCollector,
    master: Arc<FuelMaster>,
}

impl Planner {
    pub fn new(
        routes: Arc<dyn RouteProvider>,
        links: LinkResolver,
        rest: RestCascade,
        fuel: FuelCollector,
        master: Arc<FuelMaster>,
    ) -> Self {
        Self {
            routes,
            links,
            rest,
            fuel,
            master,
        }
    }

    pub async fn plan(&self, request: &PlanRequest) -> Result<PlanOutcome, PlanError> {
        let mut warnings = self.master.ensure_ready().await.warnings.clone();

        let link = self
            .links
            .resolve(&request.map_url, &request.extra_waypoints)
            .await?;
        let (query, raw) = self.fetch_route(&link, &mut warnings).await?;

        let route = RouteSummary::new(
            query.origin.clone(),
            query.destination.clone(),
            query.waypoints.clone(),
            raw.polyline,
            raw.total_distance_km,
            raw.total_duration_min,
        );
        if route.points.is_empty() {
            return Err(PlanError::UpstreamFailure(
                "route geometry is empty".to_string(),
            ));
        }
        info!(
            origin = %route.origin,
            destination = %route.destination,
            distance_km = route.total_distance_km,
            duration_min = route.total_duration_min,
            points = route.points.len(),
            "route resolved"
        );

        let ctx = ProviderContext {
            route: &route,
            depart_at: request.depart_at,
            facility_types: request.facility_types,
            equipment: request.equipment,
        };
        let (rest, fuel) = tokio::join!(
            self.rest.run(&ctx),
            self.fuel.collect(&route, request.depart_at, &request.fuel),
        );

        warnings.extend(rest.warnings);
        warnings.extend(fuel.warnings);

        let rest_windows = build_rest_windows(
            route.total_duration_min,
            request.depart_at,
            &rest.candidates,
            request.allow_extended_drive,
            request.rest_style,
        );

        if rest.candidates.is_empty() {
            warnings.push(NO_REST_WARNING.to_string());
        }
        if fuel.candidates.is_empty() {
            warnings.push(NO_FUEL_WARNING.to_string());
        }

        let status = if warnings.is_empty() {
            PlanStatus::Ok
        } else {
            PlanStatus::Fallback
        };
        info!(
            rest_candidates = rest.candidates.len(),
            windows = rest_windows.len(),
            fuel_candidates = fuel.candidates.len(),
            warnings = warnings.len(),
            "plan complete"
        );

        Ok(PlanOutcome {
            status,
            warnings,
            extracted: ExtractedRouteInput {
                final_expanded_url: link.expanded_url,
                origin: query.origin,
                destination: query.destination,
                waypoints: query.waypoints,
            },
            route,
            rest_windows,
            fuel_candidates: fuel.candidates,
        })
    }

    /// Fetch the link's route, falling back to its embedded coordinates
    /// once when the places are missing or cannot be found.
    async fn fetch_route(
        &self,
        link: &ResolvedLink,
        warnings: &mut Vec<String>,
    ) -> Result<(RouteQuery, RawRoute), PlanError> {
        let failure = match &link.route_input {
            Some(query) => match self.routes.fetch_route(query).await {
                Ok(raw) => return Ok((query.clone(), raw)),
                Err(e) if e.is_not_found() => PlanError::from(e),
                Err(e) => return Err(PlanError::from(e)),
            },
            None => PlanError::LinkResolution(LinkError::Unextractable),
        };

        let Some(fallback) = link.coordinate_fallback() else {
            return Err(failure);
        };
        warn!(
            origin = %fallback.origin,
            destination = %fallback.destination,
            reason = %failure,
            "using coordinates embedded in the link"
        );

        let raw = self.routes.fetch_route(&fallback).await?;
        warnings.push(COORDINATE_FALLBACK_WARNING.to_string());
        Ok((fallback, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BrandPreference, FuelBrand};
    use crate::fuel::test_support::station;
    use crate::fuel::{FuelStationStore, JsonFileStore};
    use crate::planner::test_support::{
        FixedExpander, MockFuelLookup, MockRestProvider, MockRouteProvider, cascade_of, depart,
        raw_route,
    };
    use crate::providers::ProviderError;
    use crate::routing::RoutingError;

    const PATH_LINK: &str = "https://www.google.com/maps/dir/東京駅/名古屋駅/@35.3,137.9,8z/data=!4m2";
    const BLOB_LINK: &str =
        "https://www.google.com/maps/@35.3,138.9,9z/data=!4m8!4m7!1m1!1d139.7671!2d35.6812!1m1!1d136.8815!2d35.1709";

    struct Fixture {
        _dir: tempfile::TempDir,
        planner: Planner,
        routes: Arc<MockRouteProvider>,
        seed: MockRestProvider,
    }

    async fn fixture(
        expanded: &'static str,
        routes: MockRouteProvider,
        osm: MockRestProvider,
        places: MockRestProvider,
    ) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::open(dir.path().join("s.json")).await.unwrap());
        store
            .upsert(&[station("ew-1", FuelBrand::Ew, 35.2, 139.0)])
            .await
            .unwrap();
        let master = Arc::new(FuelMaster::new(store, vec![], vec![]));
        let seed = MockRestProvider::returning("seed", vec![]);
        let routes = Arc::new(routes);

        let planner = Planner::new(
            routes.clone(),
            LinkResolver::new(Arc::new(FixedExpander(expanded))),
            cascade_of(&[&osm, &places, &seed]),
            FuelCollector::new(master.clone(), MockFuelLookup::returning(vec![]), 1_000),
            master,
        );
        Fixture {
            _dir: dir,
            planner,
            routes,
            seed,
        }
    }

    fn request() -> PlanRequest {
        PlanRequest {
            map_url: "https://maps.app.goo.gl/abc123".into(),
            depart_at: depart(),
            extra_waypoints: vec![],
            allow_extended_drive: false,
            rest_style: RestStyle::Single30,
            facility_types: FacilityTypeFilter::default(),
            equipment: EquipmentFilter::default(),
            fuel: FuelPreferences {
                brand: BrandPreference::Ew,
                range_km: 100.0,
                prioritize_highway: true,
            },
        }
    }

    fn rest_stop(id: &str, lat: f64) -> StopCandidate {
        let mut c = crate::planner::test_support::candidate(id, id, lat, 139.0);
        c.distance_from_start_km = (lat - 35.0) * 111.0;
        c
    }

    #[tokio::test]
    async fn places_substitute_for_empty_open_data() {
        let fx = fixture(
            PATH_LINK,
            MockRouteProvider::ok(raw_route(500.0)),
            MockRestProvider::returning("open data", vec![]),
            MockRestProvider::returning(
                "places",
                vec![rest_stop("a", 35.1), rest_stop("b", 35.2), rest_stop("c", 35.3)],
            ),
        )
        .await;

        let outcome = fx.planner.plan(&request()).await.unwrap();

        assert_eq!(outcome.status, PlanStatus::Fallback);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("places"));
        assert_eq!(outcome.extracted.origin, "東京駅");
        assert_eq!(outcome.extracted.destination, "名古屋駅");
        assert_eq!(outcome.route.total_duration_min, 500.0);
        assert_eq!(outcome.rest_windows.len(), 2);
        assert_eq!(outcome.fuel_candidates.len(), 1);
        assert_eq!(fx.seed.calls(), 0);
    }

    #[tokio::test]
    async fn clean_plan_is_ok() {
        let fx = fixture(
            PATH_LINK,
            MockRouteProvider::ok(raw_route(300.0)),
            MockRestProvider::returning("open data", vec![rest_stop("a", 35.1)]),
            MockRestProvider::returning("places", vec![]),
        )
        .await;

        let outcome = fx.planner.plan(&request()).await.unwrap();
        assert_eq!(outcome.status, PlanStatus::Ok);
        assert!(outcome.warnings.is_empty());
        assert_eq!(fx.routes.queries().len(), 1);
    }

    #[tokio::test]
    async fn extra_waypoints_reach_the_route_query() {
        let fx = fixture(
            PATH_LINK,
            MockRouteProvider::ok(raw_route(300.0)),
            MockRestProvider::returning("open data", vec![rest_stop("a", 35.1)]),
            MockRestProvider::returning("places", vec![]),
        )
        .await;

        let mut req = request();
        req.extra_waypoints = vec![" 浜松SA ".into(), "".into()];
        let outcome = fx.planner.plan(&req).await.unwrap();

        assert_eq!(outcome.extracted.waypoints, vec!["浜松SA".to_string()]);
        assert_eq!(fx.routes.queries()[0].waypoints, vec!["浜松SA".to_string()]);
    }

    #[tokio::test]
    async fn coordinate_fallback_when_link_has_no_places() {
        let fx = fixture(
            BLOB_LINK,
            MockRouteProvider::ok(raw_route(300.0)),
            MockRestProvider::returning("open data", vec![rest_stop("a", 35.1)]),
            MockRestProvider::returning("places", vec![]),
        )
        .await;

        let outcome = fx.planner.plan(&request()).await.unwrap();

        assert_eq!(outcome.status, PlanStatus::Fallback);
        assert!(outcome.warnings.iter().any(|w| w.contains("lower confidence")));
        assert_eq!(outcome.extracted.origin, "35.6812,139.7671");
        assert_eq!(outcome.extracted.destination, "35.1709,136.8815");
    }

    #[tokio::test]
    async fn coordinate_fallback_after_not_found() {
        let routes = MockRouteProvider::sequence(vec![
            Err(RoutingError::Status {
                status: "NOT_FOUND".into(),
                message: None,
            }),
            Ok(raw_route(300.0)),
        ]);
        let link = "https://www.google.com/maps/dir/謎の場所/どこか/data=!4m8!4m7!1m1!1d139.7671!2d35.6812!1m1!1d136.8815!2d35.1709";
        let fx = fixture(
            link,
            routes,
            MockRestProvider::returning("open data", vec![rest_stop("a", 35.1)]),
            MockRestProvider::returning("places", vec![]),
        )
        .await;

        let outcome = fx.planner.plan(&request()).await.unwrap();

        let queries = fx.routes.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].origin, "謎の場所");
        assert_eq!(queries[1].origin, "35.6812,139.7671");
        assert!(outcome.warnings.iter().any(|w| w.contains("lower confidence")));
    }

    #[tokio::test]
    async fn fallback_is_tried_only_once() {
        let not_found = || RoutingError::Status {
            status: "ZERO_RESULTS".into(),
            message: None,
        };
        let fx = fixture(
            BLOB_LINK,
            MockRouteProvider::sequence(vec![Err(not_found()), Err(not_found())]),
            MockRestProvider::returning("open data", vec![]),
            MockRestProvider::returning("places", vec![]),
        )
        .await;

        let err = fx.planner.plan(&request()).await.unwrap_err();
        assert!(matches!(err, PlanError::UpstreamFailure(_)));
        assert_eq!(fx.routes.queries().len(), 1);
    }

    #[tokio::test]
    async fn unextractable_link_without_coordinates_fails() {
        let fx = fixture(
            "https://www.google.com/maps/@35.3,138.9,9z",
            MockRouteProvider::ok(raw_route(300.0)),
            MockRestProvider::returning("open data", vec![]),
            MockRestProvider::returning("places", vec![]),
        )
        .await;

        let err = fx.planner.plan(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            PlanError::LinkResolution(LinkError::Unextractable)
        ));
        assert!(fx.routes.queries().is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let fx = fixture(
            PATH_LINK,
            MockRouteProvider::sequence(vec![Err(RoutingError::MissingApiKey)]),
            MockRestProvider::returning("open data", vec![]),
            MockRestProvider::returning("places", vec![]),
        )
        .await;

        let err = fx.planner.plan(&request()).await.unwrap_err();
        assert!(matches!(err, PlanError::Configuration(_)));
    }

    #[tokio::test]
    async fn empty_results_add_advisories() {
        let fx = fixture(
            PATH_LINK,
            MockRouteProvider::ok(raw_route(300.0)),
            MockRestProvider::failing(
                "open data",
                ProviderError::AllEndpointsFailed {
                    last: "Overpass timeout (8000ms)".into(),
                },
            ),
            MockRestProvider::returning("places", vec![]),
        )
        .await;

        let mut req = request();
        req.fuel.brand = BrandPreference::Usami;
        let outcome = fx.planner.plan(&req).await.unwrap();

        assert_eq!(outcome.status, PlanStatus::Fallback);
        assert!(outcome.warnings[0].contains("open data failed"));
        assert!(outcome.warnings.contains(&NO_REST_WARNING.to_string()));
        assert!(outcome.warnings.contains(&NO_FUEL_WARNING.to_string()));
        assert!(outcome.fuel_candidates.is_empty());
        assert!(outcome.rest_windows.iter().all(|w| w.primary_candidates.is_empty()));
    }

    #[tokio::test]
    async fn empty_geometry_is_rejected() {
        let fx = fixture(
            PATH_LINK,
            MockRouteProvider::ok(RawRoute {
                polyline: String::new(),
                total_distance_km: 0.0,
                total_duration_min: 0.0,
            }),
            MockRestProvider::returning("open data", vec![]),
            MockRestProvider::returning("places", vec![]),
        )
        .await;

        let err = fx.planner.plan(&request()).await.unwrap_err();
        assert!(matches!(err, PlanError::UpstreamFailure(_)));
    }
}
