//! Persistence for the fuel station master catalog.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::FuelStation;
use crate::domain::FuelBrand;

/// Errors from the station store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// File could not be read or written
    #[error("fuel station store I/O error at {path}: {message}")]
    Io { path: String, message: String },

    /// File exists but is not a station list
    #[error("fuel station store at {path} is not valid JSON: {message}")]
    Corrupt { path: String, message: String },
}

/// Read-mostly catalog of brand stations.
#[async_trait]
pub trait FuelStationStore: Send + Sync {
    /// Number of stations stored.
    async fn count(&self) -> Result<usize, StoreError>;

    /// Every station whose brand is in `brands`.
    async fn stations_for_brands(
        &self,
        brands: &[FuelBrand],
    ) -> Result<Vec<FuelStation>, StoreError>;

    /// Insert or replace stations by `source_id`. Returns how many were written.
    async fn upsert(&self, stations: &[FuelStation]) -> Result<usize, StoreError>;
}

/// Store backed by one JSON file, held in memory.
///
/// The whole file is rewritten after each upsert.
pub struct JsonFileStore {
    path: PathBuf,
    stations: RwLock<Vec<FuelStation>>,
}

impl JsonFileStore {
    /// Open the store, starting empty if the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let stations = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                path: path.display().to_string(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "fuel store file missing; starting empty");
                Vec::new()
            }
            Err(e) => return Err(io_error(&path, e)),
        };

        info!(path = %path.display(), stations = stations.len(), "opened fuel station store");
        Ok(Self {
            path,
            stations: RwLock::new(stations),
        })
    }

    async fn persist(&self, stations: &[FuelStation]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(stations).map_err(|e| StoreError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl FuelStationStore for JsonFileStore {
    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.stations.read().await.len())
    }

    async fn stations_for_brands(
        &self,
        brands: &[FuelBrand],
    ) -> Result<Vec<FuelStation>, StoreError> {
        let stations = self.stations.read().await;
        Ok(stations
            .iter()
            .filter(|s| brands.contains(&s.brand))
            .cloned()
            .collect())
    }

    async fn upsert(&self, incoming: &[FuelStation]) -> Result<usize, StoreError> {
        let mut stations = self.stations.write().await;
        let mut updated = stations.clone();
        for station in incoming {
            match updated.iter_mut().find(|s| s.source_id == station.source_id) {
                Some(existing) => *existing = station.clone(),
                None => updated.push(station.clone()),
            }
        }
        // Memory only changes once the file is written.
        self.persist(&updated).await?;
        *stations = updated;
        Ok(incoming.len())
    }
}
