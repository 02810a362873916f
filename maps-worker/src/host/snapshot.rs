//! Map data oracle backed by a JSON snapshot of the map index.

use std::path::Path;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::MapDataOracle;
use crate::error::Result;
use crate::types::{CountryKey, RegionIndex};

/// Axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&latitude)
            && (self.min_lon..=self.max_lon).contains(&longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryEntry {
    pub name: String,
    pub bounds: GeoBounds,
    pub index: RegionIndex,
    /// Map for this country is already on the device.
    #[serde(default)]
    pub downloaded: bool,
}

/// State of the local map data at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    #[serde(default)]
    pub data_stale: bool,
    #[serde(default)]
    pub outdated_regions: Vec<String>,
    #[serde(default)]
    pub countries: Vec<CountryEntry>,
}

impl MapSnapshot {
    fn country_at(&self, latitude: f64, longitude: f64) -> Option<&CountryEntry> {
        self.countries
            .iter()
            .find(|c| c.bounds.contains(latitude, longitude))
    }
}

/// [`MapDataOracle`] answering from a [`MapSnapshot`].
///
/// Acknowledging the data version clears the stale flag in memory only.
pub struct SnapshotOracle {
    snapshot: Mutex<MapSnapshot>,
}

impl SnapshotOracle {
    pub fn new(snapshot: MapSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&text)?))
    }
}

impl MapDataOracle for SnapshotOracle {
    fn is_data_stale(&self) -> anyhow::Result<bool> {
        Ok(self.snapshot.lock().data_stale)
    }

    fn outdated_regions(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.snapshot.lock().outdated_regions.clone())
    }

    fn acknowledge_data_version(&self) -> anyhow::Result<()> {
        self.snapshot.lock().data_stale = false;
        Ok(())
    }

    fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> anyhow::Result<Option<CountryKey>> {
        Ok(self
            .snapshot
            .lock()
            .country_at(latitude, longitude)
            .filter(|c| !c.downloaded)
            .map(|c| CountryKey::new(c.name.as_str())))
    }

    fn region_index(&self, latitude: f64, longitude: f64) -> anyhow::Result<RegionIndex> {
        self.snapshot
            .lock()
            .country_at(latitude, longitude)
            .map(|c| c.index)
            .ok_or_else(|| anyhow::anyhow!("no region at ({latitude}, {longitude})"))
    }
}
