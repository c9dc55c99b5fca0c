//! Fuel station master catalog and candidate ranking.
//!
//! The master catalog is the authoritative list of brand stations. It is
//! filled once per process from seed files and official directories, then
//! read on every plan alongside a live places lookup.

mod bootstrap;
mod directory;
mod rank;
mod store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CandidateKind, CandidateSource, Equipment, Facility, FuelBrand, LatLng, RouteSummary,
    StopCandidate, TAG_HIGHWAY_STATION, TAG_SURFACE_STATION,
};
use crate::providers::ProviderError;

pub use bootstrap::{BootstrapReport, FuelMaster};
pub use directory::{
    HttpStationDirectory, RawStation, StationDirectory, dedupe_stations, load_seed_files,
    normalize, slug,
};
pub use rank::{MAX_FUEL_CANDIDATES, fuel_score, rank_fuel_candidates};
pub use store::{FuelStationStore, JsonFileStore, StoreError};

/// A station in the master catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelStation {
    /// Stable identifier from the source; the upsert key
    pub source_id: String,
    pub brand: FuelBrand,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub is_highway: bool,
    pub service_24h: bool,
    pub shower: bool,
    pub convenience: bool,
    pub large_parking: bool,
}

impl FuelStation {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Returns true for the `(0, 0)` placeholder some sources emit.
    pub fn is_null_island(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }

    /// Route-independent view of this station.
    pub fn to_facility(&self) -> Facility {
        let tag = if self.is_highway {
            TAG_HIGHWAY_STATION
        } else {
            TAG_SURFACE_STATION
        };
        Facility {
            id: self.source_id.clone(),
            kind: CandidateKind::Fuel,
            name: self.name.clone(),
            address: self.address.clone(),
            position: self.position(),
            source: CandidateSource::LocalMaster,
            is_highway: self.is_highway,
            equipment: Equipment {
                shower: self.shower,
                open24h: self.service_24h,
                convenience: self.convenience,
                large_parking: self.large_parking,
            },
            tags: vec![tag.to_string()],
            brand: Some(self.brand),
        }
    }
}

/// Parameters for one fuel lookup.
#[derive(Debug, Clone, Copy)]
pub struct FuelQuery<'a> {
    pub route: &'a RouteSummary,
    pub depart_at: DateTime<Utc>,
    pub brands: &'a [FuelBrand],
    pub range_km: f64,
}

/// A live source of fuel-station candidates.
#[async_trait]
pub trait FuelLookup: Send + Sync {
    async fn lookup(&self, query: &FuelQuery<'_>) -> Result<Vec<StopCandidate>, ProviderError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn station(source_id: &str, brand: FuelBrand, lat: f64, lng: f64) -> FuelStation {
        FuelStation {
            source_id: source_id.to_string(),
            brand,
            name: format!("{source_id} SS"),
            address: "東京都".to_string(),
            lat,
            lng,
            is_highway: false,
            service_24h: false,
            shower: false,
            convenience: false,
            large_parking: false,
        }
    }
}
