//! One-time fill of the master catalog.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::directory::{StationDirectory, dedupe_stations, load_seed_files};
use super::store::FuelStationStore;

/// What the bootstrap run reported. Shared by every caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub warnings: Vec<String>,
}

/// The master catalog plus its initialization state.
///
/// [`FuelMaster::ensure_ready`] runs the bootstrap at most once per
/// process; concurrent first callers all await the same run.
pub struct FuelMaster {
    store: Arc<dyn FuelStationStore>,
    seed_paths: Vec<PathBuf>,
    directories: Vec<Arc<dyn StationDirectory>>,
    ready: OnceCell<BootstrapReport>,
}

impl FuelMaster {
    pub fn new(
        store: Arc<dyn FuelStationStore>,
        seed_paths: Vec<PathBuf>,
        directories: Vec<Arc<dyn StationDirectory>>,
    ) -> Self {
        Self {
            store,
            seed_paths,
            directories,
            ready: OnceCell::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn FuelStationStore> {
        &self.store
    }

    /// Make sure the catalog has been filled. Never fails; problems are
    /// reported as warnings.
    pub async fn ensure_ready(&self) -> &BootstrapReport {
        self.ready.get_or_init(|| self.bootstrap()).await
    }

    async fn bootstrap(&self) -> BootstrapReport {
        let mut warnings = Vec::new();

        match self.store.count().await {
            Ok(0) => {}
            Ok(n) => {
                info!(stations = n, "fuel master already populated");
                return BootstrapReport { warnings };
            }
            Err(e) => {
                warn!(error = %e, "fuel master unavailable");
                warnings.push(format!("fuel station master unavailable: {e}"));
                return BootstrapReport { warnings };
            }
        }

        let seed = load_seed_files(&self.seed_paths).await;
        if !seed.is_empty() {
            match self.store.upsert(&seed).await {
                Ok(n) => info!(stations = n, "fuel master seeded from files"),
                Err(e) => {
                    warn!(error = %e, "failed to store seed stations");
                    warnings.push(format!("failed to load fuel station seed: {e}"));
                }
            }
        }

        if self.directories.is_empty() {
            return BootstrapReport { warnings };
        }

        let fetches = self.directories.iter().map(|dir| async move {
            match dir.fetch_stations().await {
                Ok(stations) => stations,
                Err(e) => {
                    warn!(brand = %dir.brand(), error = %e, "station directory failed");
                    Vec::new()
                }
            }
        });
        let official = dedupe_stations(
            futures::future::join_all(fetches)
                .await
                .into_iter()
                .flatten()
                .collect(),
        );

        if official.is_empty() {
            warnings.push(
                "official station directories returned no stations; continuing with seed data"
                    .to_string(),
            );
        } else {
            match self.store.upsert(&official).await {
                Ok(n) => info!(stations = n, "fuel master updated from directories"),
                Err(e) => {
                    warn!(error = %e, "failed to store directory stations");
                    warnings.push(format!("failed to update fuel station master: {e}"));
                }
            }
        }

        BootstrapReport { warnings }
    }
}
