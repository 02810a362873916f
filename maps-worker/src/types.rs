//! Value types shared between the dispatcher and the host.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

/// A request delivered by the host to the worker.
///
/// The string forms (`check-freshness` etc.) are what the daemon accepts on
/// its command input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum TriggerEvent {
    /// The app was updated or started; map data may be outdated.
    CheckFreshness,

    /// Network became available; suggest maps for the current location.
    CheckLocation,

    /// The pedestrian routing alarm went off.
    PedestrianAlarmFired,
}

/// Opaque country identifier produced by reverse geocoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryKey(String);

impl CountryKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CountryKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Position of a downloadable map in the map index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionIndex {
    pub group: i32,
    pub country: i32,
    pub region: i32,
}

/// A location fix as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    /// When the fix was taken.
    pub captured_at: OffsetDateTime,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, captured_at: OffsetDateTime) -> Self {
        Self {
            latitude,
            longitude,
            captured_at,
        }
    }
}
