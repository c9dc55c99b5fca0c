//! Server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Errors reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but could not be parsed
    #[error("{name} has an invalid value {value:?}: {message}")]
    Invalid {
        name: &'static str,
        value: String,
        message: String,
    },
}

const DEFAULT_OVERPASS_URLS: &str =
    "https://overpass.kumi.systems/api/interpreter,https://overpass-api.de/api/interpreter";
const DEFAULT_FUEL_SEED_PATHS: &str = "data/station-seed.json,data/station-extra.json";

/// Everything the binary needs to wire up the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub maps_api_key: Option<String>,
    pub places_api_key: Option<String>,
    pub overpass_urls: Vec<String>,
    pub route_buffer_km: f64,
    pub overpass_timeout_ms: u64,
    pub places_nearby_timeout_ms: u64,
    pub places_details_timeout_ms: u64,
    pub places_total_budget_ms: u64,
    pub link_expand_timeout_ms: u64,
    pub routing_timeout_ms: u64,
    pub fuel_budget_ms: u64,
    pub rest_seed_path: PathBuf,
    pub fuel_store_path: PathBuf,
    pub fuel_seed_paths: Vec<PathBuf>,
    pub ew_source_url: Option<String>,
    pub usami_source_url: Option<String>,
    pub route_cache_ttl_secs: u64,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let maps_api_key = get("GOOGLE_MAPS_API_KEY");
        let places_api_key = get("GOOGLE_PLACES_API_KEY").or_else(|| maps_api_key.clone());

        let overpass_urls = split_list(
            &get("OVERPASS_API_URLS")
                .or_else(|| get("OVERPASS_API_URL"))
                .unwrap_or_else(|| DEFAULT_OVERPASS_URLS.to_string()),
        );
        let fuel_seed_paths = split_list(
            &get("FUEL_SEED_PATHS").unwrap_or_else(|| DEFAULT_FUEL_SEED_PATHS.to_string()),
        )
        .into_iter()
        .map(PathBuf::from)
        .collect();

        Ok(Self {
            maps_api_key,
            places_api_key,
            overpass_urls,
            route_buffer_km: parse_or(&get, "ROUTE_BUFFER_KM", 8.0)?,
            overpass_timeout_ms: parse_or(&get, "OVERPASS_TIMEOUT_MS", 8_000)?,
            places_nearby_timeout_ms: parse_or(&get, "PLACES_NEARBY_TIMEOUT_MS", 4_500)?,
            places_details_timeout_ms: parse_or(&get, "PLACES_DETAILS_TIMEOUT_MS", 2_500)?,
            places_total_budget_ms: parse_or(&get, "PLACES_TOTAL_BUDGET_MS", 8_000)?,
            link_expand_timeout_ms: parse_or(&get, "LINK_EXPAND_TIMEOUT_MS", 8_000)?,
            routing_timeout_ms: parse_or(&get, "ROUTING_TIMEOUT_MS", 10_000)?,
            fuel_budget_ms: parse_or(&get, "FUEL_BUDGET_MS", 9_000)?,
            rest_seed_path: get("REST_SEED_PATH")
                .unwrap_or_else(|| "data/rest-seed.json".to_string())
                .into(),
            fuel_store_path: get("FUEL_STORE_PATH")
                .unwrap_or_else(|| "data/fuel-stations.json".to_string())
                .into(),
            fuel_seed_paths,
            ew_source_url: get("EW_SOURCE_URL"),
            usami_source_url: get("USAMI_SOURCE_URL"),
            route_cache_ttl_secs: parse_or(&get, "ROUTE_CACHE_TTL_SECS", 300)?,
            bind_addr: parse_or(&get, "BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
        })
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            message: e.to_string(),
            value,
        }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
