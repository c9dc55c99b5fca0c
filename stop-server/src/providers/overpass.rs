//! Open geodata rest areas via the Overpass API.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{
    Classification, ProviderContext, ProviderError, RestProvider, SA_PA_NAME, sample_points,
    sort_by_distance_from_start, with_timeout,
};
use crate::domain::{
    CandidateKind, CandidateSource, Equipment, Facility, FacilityClass, LatLng, RoutePoint,
    StopCandidate,
};

/// Hosts tried first, in this order. Anything else comes after.
const PRIORITY_HOSTS: &[&str] = &[
    "overpass.kumi.systems",
    "overpass-api.de",
    "lz4.overpass-api.de",
    "z.overpass-api.de",
];

const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://overpass.kumi.systems/api/interpreter",
    "https://overpass-api.de/api/interpreter",
];

const SAMPLE_STEP_KM: f64 = 35.0;
const MAX_SAMPLES: usize = 25;

const UNNAMED: &str = "名称不明施設";

/// Configuration for the Overpass provider.
#[derive(Debug, Clone)]
pub struct OverpassConfig {
    /// Interpreter endpoints; reordered by host priority before use
    pub endpoints: Vec<String>,
    /// Search radius around each sample point, also the corridor width
    pub buffer_km: f64,
    /// Per-endpoint timeout in milliseconds
    pub timeout_ms: u64,
}

impl OverpassConfig {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            ..Self::default()
        }
    }

    pub fn with_buffer_km(mut self, km: f64) -> Self {
        self.buffer_km = km;
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            buffer_km: 8.0,
            timeout_ms: 8_000,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub element_type: String,
    pub id: i64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub center: Option<OverpassCenter>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct OverpassCenter {
    pub lat: f64,
    pub lon: f64,
}

impl OverpassElement {
    /// Node coordinates, or the centre Overpass computed for a way.
    fn position(&self) -> Option<LatLng> {
        match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => Some(LatLng::new(lat, lon)),
            (_, _, Some(c)) => Some(LatLng::new(c.lat, c.lon)),
            _ => None,
        }
    }

    fn tag(&self, key: &str) -> &str {
        self.tags.get(key).map(String::as_str).unwrap_or_default()
    }

    fn address(&self) -> String {
        ["addr:full", "addr:city", "addr:street"]
            .iter()
            .map(|k| self.tag(k))
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Order endpoints by host priority, keeping configured order within a rank.
///
/// Known hosts first, then unknown hosts, then anything that is not a URL.
pub fn prioritize_endpoints(endpoints: &[String]) -> Vec<String> {
    let rank = |endpoint: &str| -> usize {
        match Url::parse(endpoint) {
            Ok(url) => {
                let host = url.host_str().unwrap_or_default();
                PRIORITY_HOSTS
                    .iter()
                    .position(|p| host.contains(p))
                    .unwrap_or(PRIORITY_HOSTS.len() + 1)
            }
            Err(_) => PRIORITY_HOSTS.len() + 2,
        }
    };

    let mut sorted: Vec<String> = endpoints
        .iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect();
    sorted.sort_by_key(|e| rank(e));
    sorted
}

/// Build one union query covering every sample point.
pub fn build_query(points: &[RoutePoint], radius_m: u32) -> String {
    let clauses: Vec<String> = sample_points(points, SAMPLE_STEP_KM, f64::INFINITY, MAX_SAMPLES)
        .iter()
        .map(|p| {
            let around = format!("around:{radius_m},{},{}", p.lat, p.lng);
            format!(
                "node({around})[\"highway\"~\"services|rest_area\"];\
                 way({around})[\"highway\"~\"services|rest_area\"];\
                 node({around})[\"name\"~\"道の駅\"];\
                 way({around})[\"name\"~\"道の駅\"];"
            )
        })
        .collect();

    format!("[out:json][timeout:40];(\n{}\n);out center tags;", clauses.join("\n"))
}

/// Classify an element from its OSM tags.
pub fn classify_osm_tags(tags: &HashMap<String, String>) -> Classification {
    let tag = |key: &str| tags.get(key).map(String::as_str).unwrap_or_default();
    let raw_name = tag("name");
    let name = raw_name.to_lowercase();
    let highway = tag("highway").to_lowercase();

    let class = FacilityClass {
        is_sa_pa: highway == "services" || SA_PA_NAME.is_match(&name),
        is_expressway_rest: highway == "rest_area" || name.contains("休憩"),
        is_michi_no_eki: raw_name.contains("道の駅"),
    };

    let equipment = Equipment {
        shower: tag("shower") == "yes" || name.contains("シャワー"),
        open24h: tag("opening_hours") == "24/7" || tag("service_times") == "24h",
        convenience: tag("shop") == "convenience"
            || tag("convenience") == "yes"
            || name.contains("コンビニ"),
        large_parking: tag("hgv") == "yes"
            || tag("parking:lane") == "truck"
            || name.contains("大型"),
    };

    Classification { class, equipment }
}

/// Rest provider backed by Overpass interpreters.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    http: reqwest::Client,
    config: OverpassConfig,
}

impl OverpassClient {
    pub fn new(http: reqwest::Client, config: OverpassConfig) -> Self {
        Self { http, config }
    }

    async fn post(&self, endpoint: &str, query: &str) -> Result<OverpassResponse, ProviderError> {
        let label = format!("Overpass ({endpoint})");
        let response = self
            .http
            .post(endpoint)
            .header("Content-Type", "text/plain;charset=UTF-8")
            .body(query.to_string())
            .send()
            .await
            .map_err(|e| ProviderError::http(&label, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                label,
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| ProviderError::Json {
            label,
            message: e.to_string(),
        })
    }

    /// Try endpoints in priority order until one answers.
    async fn query_any(&self, query: &str) -> Result<OverpassResponse, ProviderError> {
        let mut last_error = None;

        for endpoint in prioritize_endpoints(&self.config.endpoints) {
            let label = format!("Overpass ({endpoint})");
            match with_timeout(&label, self.config.timeout_ms, self.post(&endpoint, query)).await {
                Ok(body) => {
                    debug!(endpoint = %endpoint, elements = body.elements.len(), "overpass answered");
                    return Ok(body);
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "overpass endpoint failed");
                    last_error = Some(e);
                }
            }
        }

        Err(ProviderError::AllEndpointsFailed {
            last: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no endpoints configured".to_string()),
        })
    }

    fn to_candidates(
        &self,
        body: OverpassResponse,
        ctx: &ProviderContext<'_>,
    ) -> Vec<StopCandidate> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for element in body.elements {
            let Some(position) = element.position() else {
                continue;
            };
            let id = format!("{}-{}", element.element_type, element.id);
            if !seen.insert(id.clone()) {
                continue;
            }

            let Classification { class, equipment } = classify_osm_tags(&element.tags);
            if !ctx.accepts(&class, &equipment) {
                continue;
            }

            let name = match element.tag("name") {
                "" => UNNAMED.to_string(),
                n => n.to_string(),
            };
            let facility = Facility {
                id,
                kind: CandidateKind::Rest,
                name,
                address: element.address(),
                position,
                source: CandidateSource::OpenData,
                is_highway: class.is_highway(),
                equipment,
                tags: class.tags(),
                brand: None,
            };
            out.extend(ctx.place(facility));
        }

        out
    }
}

#[async_trait]
impl RestProvider for OverpassClient {
    fn name(&self) -> &str {
        "Overpass"
    }

    fn corridor_km(&self) -> f64 {
        self.config.buffer_km
    }

    async fn fetch_candidates(
        &self,
        ctx: &ProviderContext<'_>,
    ) -> Result<Vec<StopCandidate>, ProviderError> {
        let radius_m = (self.config.buffer_km * 1000.0).round().max(0.0) as u32;
        let query = build_query(&ctx.route.points, radius_m);

        let body = self.query_any(&query).await?;
        let mut candidates = self.to_candidates(body, ctx);
        sort_by_distance_from_start(&mut candidates);
        Ok(candidates)
    }
}
