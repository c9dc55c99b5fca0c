//! Static local catalog of rest areas.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{ProviderContext, ProviderError, RestProvider, sort_by_distance_from_start};
use crate::domain::{
    CandidateKind, CandidateSource, Equipment, Facility, FacilityClass, LatLng, StopCandidate,
};

/// One rest area in the seed file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub is_highway: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub equipment: Equipment,
}

impl SeedRest {
    fn into_facility(self) -> Facility {
        Facility {
            id: self.id,
            kind: CandidateKind::Rest,
            name: self.name,
            address: self.address,
            position: LatLng::new(self.lat, self.lng),
            source: CandidateSource::LocalMaster,
            is_highway: self.is_highway,
            equipment: self.equipment,
            tags: self.tags,
            brand: None,
        }
    }
}

/// Rest provider reading a JSON file on every request.
#[derive(Debug, Clone)]
pub struct LocalSeedProvider {
    path: PathBuf,
}

impl LocalSeedProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Vec<SeedRest>, ProviderError> {
        let label = self.path.display().to_string();
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ProviderError::Io {
                path: label.clone(),
                message: e.to_string(),
            })?;
        serde_json::from_str(&raw).map_err(|e| ProviderError::Json {
            label,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl RestProvider for LocalSeedProvider {
    fn name(&self) -> &str {
        "local rest catalog"
    }

    fn corridor_km(&self) -> f64 {
        12.0
    }

    async fn fetch_candidates(
        &self,
        ctx: &ProviderContext<'_>,
    ) -> Result<Vec<StopCandidate>, ProviderError> {
        let seed = self.load().await?;
        debug!(path = %self.path.display(), entries = seed.len(), "loaded rest seed");

        let mut out: Vec<StopCandidate> = seed
            .into_iter()
            .filter(|r| LatLng::new(r.lat, r.lng).is_finite())
            .filter(|r| ctx.accepts(&FacilityClass::from_tags(&r.tags), &r.equipment))
            .filter_map(|r| ctx.place(r.into_facility()))
            .collect();

        sort_by_distance_from_start(&mut out);
        Ok(out)
    }
}
