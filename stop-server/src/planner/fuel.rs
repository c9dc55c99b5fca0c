//! Fuel candidates: master catalog and live lookup, merged and ranked.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::dedup::{merge_candidates, within_corridor};
use crate::domain::{BrandPreference, RouteSummary, StopCandidate};
use crate::fuel::{FuelLookup, FuelMaster, FuelQuery, rank_fuel_candidates};
use crate::providers::{ProviderError, with_timeout};

/// Fuel candidates further than this from the route are dropped.
pub const FUEL_CORRIDOR_KM: f64 = 10.0;
/// Range used when the request gives neither a range nor a preset.
pub const DEFAULT_FUEL_RANGE_KM: f64 = 100.0;

/// Usable range: an explicit value beats a preset, else the default.
pub fn fuel_range_km(explicit_km: Option<f64>, preset_km: Option<u32>) -> f64 {
    explicit_km
        .or(preset_km.map(f64::from))
        .unwrap_or(DEFAULT_FUEL_RANGE_KM)
}

/// What the driver wants from a fuel stop.
#[derive(Debug, Clone, Copy)]
pub struct FuelPreferences {
    pub brand: BrandPreference,
    pub range_km: f64,
    pub prioritize_highway: bool,
}

/// Ranked fuel candidates and the warnings produced while finding them.
#[derive(Debug, Clone, Default)]
pub struct FuelOutcome {
    pub candidates: Vec<StopCandidate>,
    pub warnings: Vec<String>,
}

/// Queries the master catalog and the live lookup side by side.
///
/// Neither replaces the other: both results are merged, with the catalog
/// record kept when both describe the same station.
pub struct FuelCollector {
    master: Arc<FuelMaster>,
    lookup: Arc<dyn FuelLookup>,
    budget_ms: u64,
    grace_ms: u64,
}

impl FuelCollector {
    pub fn new(master: Arc<FuelMaster>, lookup: Arc<dyn FuelLookup>, budget_ms: u64) -> Self {
        Self {
            master,
            lookup,
            budget_ms,
            grace_ms: 2_500,
        }
    }

    /// Extra time allowed for in-flight lookups after the budget runs out.
    pub fn with_grace_ms(mut self, ms: u64) -> Self {
        self.grace_ms = ms;
        self
    }

    pub async fn collect(
        &self,
        route: &RouteSummary,
        depart_at: DateTime<Utc>,
        prefs: &FuelPreferences,
    ) -> FuelOutcome {
        let brands = prefs.brand.accepted();
        let query = FuelQuery {
            route,
            depart_at,
            brands,
            range_km: prefs.range_km,
        };

        let (from_master, from_live) = tokio::join!(
            with_timeout("fuel station master", self.budget_ms, self.master_candidates(&query)),
            with_timeout(
                "live fuel lookup",
                self.budget_ms + self.grace_ms,
                self.lookup.lookup(&query)
            ),
        );

        let mut warnings = Vec::new();
        let mut all = Vec::new();
        for (half, result) in [("master catalog", from_master), ("live lookup", from_live)] {
            match result {
                Ok(found) => {
                    debug!(source = half, count = found.len(), "fuel candidates");
                    all.extend(found);
                }
                Err(e) => {
                    warn!(source = half, error = %e, "fuel source failed");
                    warnings.push(format!("fuel {half} unavailable: {e}"));
                }
            }
        }

        let nearby = within_corridor(merge_candidates(all), FUEL_CORRIDOR_KM);
        FuelOutcome {
            candidates: rank_fuel_candidates(nearby, prefs.range_km, prefs.prioritize_highway),
            warnings,
        }
    }

    async fn master_candidates(
        &self,
        query: &FuelQuery<'_>,
    ) -> Result<Vec<StopCandidate>, ProviderError> {
        let stations = self
            .master
            .store()
            .stations_for_brands(query.brands)
            .await
            .map_err(|e| ProviderError::Io {
                path: "fuel station master".to_string(),
                message: e.to_string(),
            })?;

        Ok(stations
            .iter()
            .filter(|s| !s.is_null_island())
            .filter_map(|s| {
                let position = query.route.locate(s.position())?;
                Some(s.to_facility().place_on_route(&position, query.depart_at))
            })
            .collect())
    }
}
