//! Station sources used to fill the master catalog.
//!
//! Seed files ship with the service; official directories are fetched as
//! JSON feeds. Both go through the same normalization and dedup.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use super::FuelStation;
use crate::domain::FuelBrand;
use crate::providers::{ProviderError, SA_PA_NAME};

const MAX_SLUG_CHARS: usize = 80;

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9一-龠ぁ-んァ-ン]+").expect("slug pattern is valid")
});

/// A station record as found in seed files and feeds, before checks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStation {
    pub source_id: Option<String>,
    pub brand: Option<FuelBrand>,
    pub name: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub is_highway: Option<bool>,
    pub service_24h: bool,
    pub shower: bool,
    pub convenience: bool,
    pub large_parking: bool,
}

/// Lowercase, collapse runs of other characters to `-`, trim, cap length.
///
/// ```
/// use stop_server::fuel::slug;
///
/// assert_eq!(slug("ENEOSウイング 環七 SS"), "eneosウイング-環七-ss");
/// ```
pub fn slug(input: &str) -> String {
    let lower = input.to_lowercase();
    NON_SLUG
        .replace_all(&lower, "-")
        .trim_matches('-')
        .chars()
        .take(MAX_SLUG_CHARS)
        .collect()
}

/// Check and tidy a raw record.
///
/// Drops records with a blank name or address, missing or non-finite
/// coordinates, or no determinable brand. A missing `source_id` is derived
/// from brand, name and rounded coordinates.
pub fn normalize(raw: RawStation, fallback_brand: Option<FuelBrand>) -> Option<FuelStation> {
    let name = raw.name.trim().to_string();
    let address = raw.address.trim().to_string();
    if name.is_empty() || address.is_empty() {
        return None;
    }

    let (lat, lng) = (raw.lat?, raw.lng?);
    if !lat.is_finite() || !lng.is_finite() {
        return None;
    }

    let brand = raw
        .brand
        .or(fallback_brand)
        .or_else(|| FuelBrand::infer_from_name(&name))?;

    let source_id = raw
        .source_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| {
            format!(
                "{}-{}-{lat:.3}-{lng:.3}",
                brand.code().to_lowercase(),
                slug(&name)
            )
        });

    let is_highway = raw.is_highway.unwrap_or_else(|| SA_PA_NAME.is_match(&name));

    Some(FuelStation {
        source_id,
        brand,
        name,
        address,
        lat,
        lng,
        is_highway,
        service_24h: raw.service_24h,
        shower: raw.shower,
        convenience: raw.convenience,
        large_parking: raw.large_parking,
    })
}

/// Collapse stations with the same brand, slugged name and rounded position.
///
/// A later record replaces an earlier one in the earlier one's slot.
pub fn dedupe_stations(stations: Vec<FuelStation>) -> Vec<FuelStation> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<FuelStation> = Vec::with_capacity(stations.len());

    for station in stations {
        let key = format!(
            "{}:{}:{:.3}:{:.3}",
            station.brand.code(),
            slug(&station.name),
            station.lat,
            station.lng
        );
        match index.get(&key) {
            Some(&i) => out[i] = station,
            None => {
                index.insert(key, out.len());
                out.push(station);
            }
        }
    }

    out
}

/// Read, normalize and dedupe every seed file. Unreadable files are skipped.
pub async fn load_seed_files(paths: &[PathBuf]) -> Vec<FuelStation> {
    let reads = paths.iter().map(|path| async move {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "seed file unavailable");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<RawStation>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "seed file is not a station list");
                Vec::new()
            }
        }
    });

    let records = futures::future::join_all(reads).await;
    dedupe_stations(
        records
            .into_iter()
            .flatten()
            .filter_map(|r| normalize(r, None))
            .collect(),
    )
}

/// An official station directory for one brand.
#[async_trait]
pub trait StationDirectory: Send + Sync {
    fn brand(&self) -> FuelBrand;

    async fn fetch_stations(&self) -> Result<Vec<FuelStation>, ProviderError>;
}

/// Directory served as a JSON array of station records.
#[derive(Debug, Clone)]
pub struct HttpStationDirectory {
    http: reqwest::Client,
    url: String,
    brand: FuelBrand,
    timeout_ms: u64,
}

impl HttpStationDirectory {
    pub fn new(http: reqwest::Client, url: impl Into<String>, brand: FuelBrand) -> Self {
        Self {
            http,
            url: url.into(),
            brand,
            timeout_ms: 8_000,
        }
    }

    async fn request(&self) -> Result<Vec<RawStation>, ProviderError> {
        let label = format!("{} directory", self.brand);
        let response = self
            .http
            .get(&self.url)
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
}

#[async_trait]
impl StationDirectory for HttpStationDirectory {
    fn brand(&self) -> FuelBrand {
        self.brand
    }

    async fn fetch_stations(&self) -> Result<Vec<FuelStation>, ProviderError> {
        let label = format!("{} directory", self.brand);
        let raw = tokio::time::timeout(Duration::from_millis(self.timeout_ms), self.request())
            .await
            .map_err(|_| ProviderError::timeout(label, self.timeout_ms))??;

        Ok(dedupe_stations(
            raw.into_iter()
                .filter_map(|r| normalize(r, Some(self.brand)))
                .collect(),
        ))
    }
}
