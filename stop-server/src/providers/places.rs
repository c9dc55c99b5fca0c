//! Commercial places search (nearby search plus place details).
//!
//! Used twice: as the second rest-facility source, and as the live half of
//! the fuel lookup. Both share one deadline-driven loop: no new sub-query is
//! started once the budget is spent, but a sub-query already running keeps
//! its full timeout.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{
    Classification, ProviderContext, ProviderError, RestProvider, SA_PA_NAME, sample_points,
    sort_by_distance_from_start,
};
use crate::domain::{
    CandidateKind, CandidateSource, Equipment, Facility, FacilityClass, FuelBrand, LatLng,
    StopCandidate, TAG_HIGHWAY_STATION, TAG_SURFACE_STATION,
};
use crate::fuel::{FuelLookup, FuelQuery};

const DEFAULT_NEARBY_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";
const DEFAULT_DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

const SEARCH_RADIUS_M: u32 = 12_000;
const RESULTS_PER_QUERY: usize = 6;
const MAX_REST_CANDIDATES: usize = 20;
const MAX_REST_SAMPLES: usize = 3;
const MIN_REST_STEP_KM: f64 = 90.0;
const MAX_FUEL_SAMPLES: usize = 4;
/// Fuel sampling reaches this far past the driver's range.
const FUEL_SEARCH_MARGIN_KM: f64 = 50.0;
/// Details are only worth starting with more than this left.
const DETAILS_MIN_REMAINING: Duration = Duration::from_millis(500);

const KEYWORD_SERVICE_AREA: &str = "サービスエリア";
const KEYWORD_MICHI_NO_EKI: &str = "道の駅";

static OPEN_24H: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)24時間営業|24 時間営業|24 hours").expect("24h pattern is valid")
});

/// Configuration for the places client.
#[derive(Debug, Clone)]
pub struct PlacesConfig {
    /// API key; without one every lookup returns nothing
    pub api_key: Option<String>,
    pub nearby_url: String,
    pub details_url: String,
    pub nearby_timeout_ms: u64,
    pub details_timeout_ms: u64,
    /// Wall-clock budget for one rest-candidate lookup
    pub total_budget_ms: u64,
}

impl PlacesConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn with_timeouts(mut self, nearby_ms: u64, details_ms: u64) -> Self {
        self.nearby_timeout_ms = nearby_ms;
        self.details_timeout_ms = details_ms;
        self
    }

    pub fn with_total_budget_ms(mut self, ms: u64) -> Self {
        self.total_budget_ms = ms;
        self
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            nearby_url: DEFAULT_NEARBY_URL.to_string(),
            details_url: DEFAULT_DETAILS_URL.to_string(),
            nearby_timeout_ms: 4_500,
            details_timeout_ms: 2_500,
            total_budget_ms: 8_000,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    results: Vec<NearbyResult>,
}

/// One nearby-search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct NearbyResult {
    pub place_id: String,
    pub name: String,
    pub vicinity: Option<String>,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub types: Vec<String>,
    pub business_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl NearbyResult {
    fn position(&self) -> Option<LatLng> {
        let loc = self.geometry.as_ref()?.location?;
        Some(LatLng::new(loc.lat, loc.lng))
    }

    fn is_closed(&self) -> bool {
        self.business_status.as_deref() == Some("CLOSED_PERMANENTLY")
    }
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
}

/// Extra facts from a place-details lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceDetails {
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

/// Classify a place from its name, types and optional details.
pub fn classify_place(
    name: &str,
    types: &[String],
    details: Option<&PlaceDetails>,
) -> Classification {
    let class = FacilityClass {
        is_sa_pa: SA_PA_NAME.is_match(name),
        is_expressway_rest: name.contains("ハイウェイオアシス") || name.contains("休憩"),
        is_michi_no_eki: name.contains("道の駅"),
    };

    let detail_name = details.and_then(|d| d.name.as_deref()).unwrap_or_default();
    let full_name = format!("{name} {detail_name}");
    let has_type = |t: &str| {
        types.iter().any(|x| x == t) || details.is_some_and(|d| d.types.iter().any(|x| x == t))
    };
    let open24h = details
        .and_then(|d| d.opening_hours.as_ref())
        .is_some_and(|h| OPEN_24H.is_match(&h.weekday_text.join(" ")));

    let equipment = Equipment {
        shower: full_name.contains("シャワー"),
        open24h,
        convenience: has_type("convenience_store") || full_name.contains("コンビニ"),
        large_parking: has_type("parking")
            || full_name.contains("大型")
            || full_name.contains("トラック"),
    };

    Classification { class, equipment }
}

/// Keywords to search for given the type filter.
fn rest_keywords(ctx: &ProviderContext<'_>) -> Vec<&'static str> {
    let filter = ctx.facility_types;
    let mut out = Vec::new();
    if filter.sa_pa || filter.expressway_rest {
        out.push(KEYWORD_SERVICE_AREA);
    }
    if filter.michi_no_eki {
        out.push(KEYWORD_MICHI_NO_EKI);
    }
    if out.is_empty() {
        out = vec![KEYWORD_SERVICE_AREA, KEYWORD_MICHI_NO_EKI];
    }
    out
}

/// Client for the places API.
#[derive(Debug, Clone)]
pub struct PlacesClient {
    http: reqwest::Client,
    config: PlacesConfig,
}

impl PlacesClient {
    pub fn new(http: reqwest::Client, config: PlacesConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &PlacesConfig {
        &self.config
    }

    /// Keyword search around a location.
    ///
    /// Non-success statuses come back as errors so callers can skip them;
    /// `ZERO_RESULTS` is an empty list.
    pub async fn nearby_search(
        &self,
        location: LatLng,
        keyword: &str,
        timeout: Duration,
    ) -> Result<Vec<NearbyResult>, ProviderError> {
        let label = "Places NearbySearch";
        let Some(key) = self.config.api_key.as_deref() else {
            return Ok(Vec::new());
        };

        let request = self
            .http
            .get(&self.config.nearby_url)
            .query(&[
                ("location", location.to_query_string()),
                ("radius", SEARCH_RADIUS_M.to_string()),
                ("language", "ja".to_string()),
                ("keyword", keyword.to_string()),
                ("key", key.to_string()),
            ])
            .send();

        let response = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| ProviderError::timeout(label, timeout.as_millis() as u64))?
            .map_err(|e| ProviderError::http(label, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                label: label.to_string(),
                status: status.as_u16(),
            });
        }

        let body: NearbyResponse = response.json().await.map_err(|e| ProviderError::Json {
            label: label.to_string(),
            message: e.to_string(),
        })?;

        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(body.results),
            _ => Err(ProviderError::Status {
                label: label.to_string(),
                status: body.status,
            }),
        }
    }

    /// Look up details for one place. Any failure is `None`.
    pub async fn place_details(&self, place_id: &str, timeout: Duration) -> Option<PlaceDetails> {
        let key = self.config.api_key.as_deref()?;
        let request = self
            .http
            .get(&self.config.details_url)
            .query(&[
                ("place_id", place_id),
                ("language", "ja"),
                ("fields", "name,formatted_address,types,opening_hours"),
                ("key", key),
            ])
            .send();

        let response = tokio::time::timeout(timeout, request).await.ok()?.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: DetailsResponse = response.json().await.ok()?;
        if body.status != "OK" {
            debug!(place_id, status = %body.status, "place details unavailable");
            return None;
        }
        body.result
    }
}

/// Time left before `deadline`, if any.
fn remaining(deadline: Instant) -> Option<Duration> {
    let left = deadline.saturating_duration_since(Instant::now());
    (!left.is_zero()).then_some(left)
}

/// Places as the second rest-facility source.
#[derive(Debug, Clone)]
pub struct PlacesRestProvider {
    client: PlacesClient,
}

impl PlacesRestProvider {
    pub fn new(client: PlacesClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RestProvider for PlacesRestProvider {
    fn name(&self) -> &str {
        "Google Places"
    }

    fn corridor_km(&self) -> f64 {
        12.0
    }

    async fn fetch_candidates(
        &self,
        ctx: &ProviderContext<'_>,
    ) -> Result<Vec<StopCandidate>, ProviderError> {
        let config = self.client.config();
        if config.api_key.is_none() {
            debug!("no places key; skipping");
            return Ok(Vec::new());
        }

        let step_km = MIN_REST_STEP_KM.max((ctx.route.total_distance_km / 3.0).ceil());
        let points = sample_points(&ctx.route.points, step_km, f64::INFINITY, MAX_REST_SAMPLES);
        let keywords = rest_keywords(ctx);
        let needs_details = ctx.equipment.is_active();
        let deadline = Instant::now() + Duration::from_millis(config.total_budget_ms);
        let nearby_timeout = Duration::from_millis(config.nearby_timeout_ms);
        let details_timeout = Duration::from_millis(config.details_timeout_ms);

        let mut seen = HashSet::new();
        let mut out = Vec::new();

        'search: for point in points {
            for keyword in &keywords {
                if out.len() >= MAX_REST_CANDIDATES {
                    break 'search;
                }
                if remaining(deadline).is_none() {
                    break 'search;
                }
                let results = match self.client.nearby_search(point, keyword, nearby_timeout).await
                {
                    Ok(results) => results,
                    Err(e) if e.is_timeout() => return Err(e),
                    Err(e) => {
                        warn!(error = %e, keyword, "places search failed; skipping");
                        continue;
                    }
                };

                for result in results.into_iter().take(RESULTS_PER_QUERY) {
                    if out.len() >= MAX_REST_CANDIDATES {
                        break;
                    }
                    let Some(position) = result.position() else {
                        continue;
                    };
                    if seen.contains(&result.place_id) || result.is_closed() {
                        continue;
                    }
                    let name_only = classify_place(&result.name, &result.types, None);
                    if !ctx.facility_types.accepts(&name_only.class) {
                        continue;
                    }

                    let details = match remaining(deadline) {
                        Some(left) if needs_details && left > DETAILS_MIN_REMAINING => {
                            self.client
                                .place_details(&result.place_id, details_timeout)
                                .await
                        }
                        _ => None,
                    };
                    let Classification { class, equipment } =
                        classify_place(&result.name, &result.types, details.as_ref());
                    if !ctx.equipment.accepts(&equipment) {
                        continue;
                    }

                    seen.insert(result.place_id.clone());
                    let (name, address) = match details {
                        Some(d) => (
                            d.name.unwrap_or(result.name),
                            d.formatted_address.or(result.vicinity).unwrap_or_default(),
                        ),
                        None => (result.name, result.vicinity.unwrap_or_default()),
                    };
                    let facility = Facility {
                        id: result.place_id,
                        kind: CandidateKind::Rest,
                        name,
                        address,
                        position,
                        source: CandidateSource::Commercial,
                        is_highway: class.is_highway(),
                        equipment,
                        tags: class.tags(),
                        brand: None,
                    };
                    out.extend(ctx.place(facility));
                }
            }
        }

        sort_by_distance_from_start(&mut out);
        Ok(out)
    }
}

/// Places as the live half of the fuel lookup.
#[derive(Debug, Clone)]
pub struct PlacesFuelLookup {
    client: PlacesClient,
    budget_ms: u64,
}

impl PlacesFuelLookup {
    pub fn new(client: PlacesClient, budget_ms: u64) -> Self {
        Self { client, budget_ms }
    }
}

#[async_trait]
impl FuelLookup for PlacesFuelLookup {
    async fn lookup(&self, query: &FuelQuery<'_>) -> Result<Vec<StopCandidate>, ProviderError> {
        let config = self.client.config();
        if config.api_key.is_none() {
            return Ok(Vec::new());
        }

        let reach_km = query.range_km + FUEL_SEARCH_MARGIN_KM;
        let step_km = reach_km / MAX_FUEL_SAMPLES as f64;
        let points = sample_points(&query.route.points, step_km, reach_km, MAX_FUEL_SAMPLES);
        let deadline = Instant::now() + Duration::from_millis(self.budget_ms);
        let nearby_timeout = Duration::from_millis(config.nearby_timeout_ms);

        let mut seen = HashSet::new();
        let mut out = Vec::new();

        'search: for point in points {
            for brand in query.brands {
                if remaining(deadline).is_none() {
                    break 'search;
                }
                let results = match self
                    .client
                    .nearby_search(point, brand.search_keyword(), nearby_timeout)
                    .await
                {
                    Ok(results) => results,
                    Err(e) if e.is_timeout() && out.is_empty() => return Err(e),
                    Err(e) if e.is_timeout() => {
                        warn!(error = %e, "fuel lookup timed out; keeping partial results");
                        break 'search;
                    }
                    Err(e) => {
                        warn!(error = %e, brand = %brand, "fuel search failed; skipping");
                        continue;
                    }
                };

                for result in results.into_iter().take(RESULTS_PER_QUERY) {
                    let Some(position) = result.position() else {
                        continue;
                    };
                    if result.is_closed() || !seen.insert(result.place_id.clone()) {
                        continue;
                    }
                    let found = FuelBrand::infer_from_name(&result.name).unwrap_or(*brand);
                    if !query.brands.contains(&found) {
                        continue;
                    }

                    let Classification { equipment, .. } =
                        classify_place(&result.name, &result.types, None);
                    let is_highway = SA_PA_NAME.is_match(&result.name);
                    let tag = if is_highway {
                        TAG_HIGHWAY_STATION
                    } else {
                        TAG_SURFACE_STATION
                    };
                    let facility = Facility {
                        id: result.place_id,
                        kind: CandidateKind::Fuel,
                        name: result.name,
                        address: result.vicinity.unwrap_or_default(),
                        position,
                        source: CandidateSource::Commercial,
                        is_highway,
                        equipment,
                        tags: vec![tag.to_string()],
                        brand: Some(found),
                    };
                    if let Some(position) = query.route.locate(facility.position) {
                        out.push(facility.place_on_route(&position, query.depart_at));
                    }
                }
            }
        }

        Ok(out)
    }
}
