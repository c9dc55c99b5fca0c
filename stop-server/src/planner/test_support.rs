//! Canned routes and mock providers for planner tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use url::Url;

use super::cascade::RestCascade;
use crate::domain::{
    CandidateKind, CandidateSource, Equipment, LatLng, RouteSummary, StopCandidate,
    encode_polyline,
};
use crate::fuel::{FuelLookup, FuelQuery};
use crate::link::{LinkError, LinkExpander};
use crate::providers::{ProviderContext, ProviderError, RestProvider};
use crate::routing::{RawRoute, RouteProvider, RouteQuery, RoutingError};

pub fn depart() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
}

/// A line running due north from (35.0, 139.0) to (35.5, 139.0).
pub fn route_points() -> Vec<LatLng> {
    (0..=5)
        .map(|i| LatLng::new(35.0 + f64::from(i) / 10.0, 139.0))
        .collect()
}

pub fn raw_route(duration_min: f64) -> RawRoute {
    RawRoute {
        polyline: encode_polyline(&route_points()),
        total_distance_km: 55.6,
        total_duration_min: duration_min,
    }
}

pub fn straight_route() -> RouteSummary {
    let raw = raw_route(60.0);
    RouteSummary::new(
        "origin",
        "destination",
        vec![],
        raw.polyline,
        raw.total_distance_km,
        raw.total_duration_min,
    )
}

/// A rest candidate sitting on the route at the start.
pub fn candidate(id: &str, name: &str, lat: f64, lng: f64) -> StopCandidate {
    StopCandidate {
        id: id.to_string(),
        kind: CandidateKind::Rest,
        name: name.to_string(),
        address: String::new(),
        lat,
        lng,
        source: CandidateSource::OpenData,
        is_highway: false,
        distance_from_route_km: 0.0,
        distance_from_start_km: 0.0,
        eta: depart(),
        equipment: Equipment::default(),
        tags: vec![],
        brand: None,
    }
}

/// Rest provider with a fixed answer. Clones share the call counter.
#[derive(Clone)]
pub struct MockRestProvider {
    name: String,
    result: Result<Vec<StopCandidate>, ProviderError>,
    calls: Arc<AtomicUsize>,
}

impl MockRestProvider {
    pub fn returning(name: &str, candidates: Vec<StopCandidate>) -> Self {
        Self {
            name: name.to_string(),
            result: Ok(candidates),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(name: &str, error: ProviderError) -> Self {
        Self {
            name: name.to_string(),
            result: Err(error),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RestProvider for MockRestProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn corridor_km(&self) -> f64 {
        12.0
    }

    async fn fetch_candidates(
        &self,
        _ctx: &ProviderContext<'_>,
    ) -> Result<Vec<StopCandidate>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

pub fn cascade_of(providers: &[&MockRestProvider]) -> RestCascade {
    RestCascade::new(
        providers
            .iter()
            .map(|p| Arc::new((*p).clone()) as Arc<dyn RestProvider>)
            .collect(),
    )
}

pub enum MockFuelLookup {
    Returning(Vec<StopCandidate>),
    Failing(ProviderError),
    Hanging,
}

impl MockFuelLookup {
    pub fn returning(candidates: Vec<StopCandidate>) -> Arc<Self> {
        Arc::new(MockFuelLookup::Returning(candidates))
    }

    pub fn failing(error: ProviderError) -> Arc<Self> {
        Arc::new(MockFuelLookup::Failing(error))
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(MockFuelLookup::Hanging)
    }
}

#[async_trait]
impl FuelLookup for MockFuelLookup {
    async fn lookup(&self, _query: &FuelQuery<'_>) -> Result<Vec<StopCandidate>, ProviderError> {
        match self {
            MockFuelLookup::Returning(candidates) => Ok(candidates.clone()),
            MockFuelLookup::Failing(error) => Err(error.clone()),
            MockFuelLookup::Hanging => std::future::pending().await,
        }
    }
}

/// Route provider that records every query it is asked.
pub struct MockRouteProvider {
    fixed: Option<RawRoute>,
    queued: Mutex<VecDeque<Result<RawRoute, RoutingError>>>,
    queries: Mutex<Vec<RouteQuery>>,
}

impl MockRouteProvider {
    /// Always answers with `raw`.
    pub fn ok(raw: RawRoute) -> Self {
        Self {
            fixed: Some(raw),
            queued: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Answers in order; `NOT_FOUND` once the queue runs dry.
    pub fn sequence(results: Vec<Result<RawRoute, RoutingError>>) -> Self {
        Self {
            fixed: None,
            queued: Mutex::new(results.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<RouteQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RouteProvider for MockRouteProvider {
    async fn fetch_route(&self, query: &RouteQuery) -> Result<RawRoute, RoutingError> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(raw) = &self.fixed {
            return Ok(raw.clone());
        }
        self.queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(RoutingError::Status {
                status: "NOT_FOUND".into(),
                message: None,
            }))
    }
}

/// Expands every link to the same URL.
pub struct FixedExpander(pub &'static str);

#[async_trait]
impl LinkExpander for FixedExpander {
    async fn expand(&self, _url: &Url) -> Result<Url, LinkError> {
        Url::parse(self.0).map_err(|e| LinkError::InvalidUrl(e.to_string()))
    }
}
