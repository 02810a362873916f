//! Interfaces to the host environment.
//!
//! Everything the worker needs from outside (map data queries, location,
//! alarms, timers, wall-clock time, persistence) comes in through these
//! traits, bundled in [`Host`]. The submodules provide implementations for
//! running stand-alone under tokio.

mod runtime;
mod snapshot;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, TimeZone};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::notification::NotificationSink;
use crate::persistence::KeyValueStore;
use crate::tracing::prelude::*;
use crate::types::{CountryKey, LocationSample, RegionIndex};

pub use runtime::{TokioAlarmClock, TokioScheduler};
pub use snapshot::{CountryEntry, GeoBounds, MapSnapshot, SnapshotOracle};

/// Queries against the locally installed map data.
///
/// Calls are synchronous and expected to be cheap.
pub trait MapDataOracle: Send + Sync {
    /// Whether the app ships a newer data version than the one last
    /// acknowledged.
    fn is_data_stale(&self) -> anyhow::Result<bool>;

    /// Names of downloaded regions that need an update. May be empty.
    fn outdated_regions(&self) -> anyhow::Result<Vec<String>>;

    /// Record the current data version as handled.
    fn acknowledge_data_version(&self) -> anyhow::Result<()>;

    /// Country containing the point, or `None` if the point is outside every
    /// known region or that country's map is already downloaded.
    fn reverse_geocode(&self, latitude: f64, longitude: f64)
    -> anyhow::Result<Option<CountryKey>>;

    /// Index of the downloadable map covering the point.
    fn region_index(&self, latitude: f64, longitude: f64) -> anyhow::Result<RegionIndex>;
}

/// Source of passive location fixes.
pub trait LocationProvider: Send + Sync {
    /// Most recent fix obtained by anyone on the device, without requesting
    /// a new one.
    fn last_known_location(&self) -> Option<LocationSample>;
}

/// One-shot wall-clock alarms that deliver
/// [`TriggerEvent::PedestrianAlarmFired`](crate::TriggerEvent::PedestrianAlarmFired).
///
/// There is a single pedestrian alarm. A request replaces any alarm
/// requested earlier, including one requested by a previous process, so
/// the worker may repeat a request after a restart without the prompt
/// firing twice.
pub trait AlarmClock: Send + Sync {
    /// Request delivery at or after `fire_at`, replacing the outstanding
    /// alarm if there is one. An instant in the past fires as soon as
    /// possible.
    fn schedule_one_shot(&self, fire_at: OffsetDateTime) -> anyhow::Result<()>;
}

pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Runs a callback once after a delay. Scheduled callbacks cannot be
/// cancelled.
pub trait DelayScheduler: Send + Sync {
    fn schedule_once(&self, delay: Duration, callback: Callback);
}

/// Local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// UTC offset in effect at the local wall time `local`.
    ///
    /// Differs from the offset of [`now`](Self::now) when a daylight saving
    /// change lies in between. Clocks with a fixed offset keep the default.
    fn offset_at(&self, _local: PrimitiveDateTime) -> UtcOffset {
        self.now().offset()
    }
}

/// Diagnostics about location availability when the network comes up.
pub trait Statistics: Send + Sync {
    /// Result of the immediate location check.
    fn track_location_check(&self, found: bool);

    /// Result of the single delayed re-check.
    fn track_delayed_location_check(&self, found: bool, delay: Duration);
}

/// The host collaborators a [`Dispatcher`](crate::Dispatcher) works with.
#[derive(Clone)]
pub struct Host {
    pub oracle: Arc<dyn MapDataOracle>,
    pub sink: Arc<dyn NotificationSink>,
    pub locations: Arc<dyn LocationProvider>,
    pub alarm_clock: Arc<dyn AlarmClock>,
    pub scheduler: Arc<dyn DelayScheduler>,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub statistics: Arc<dyn Statistics>,
}

/// System time in the local time zone.
///
/// The offset is looked up in the system time zone on every call, so
/// daylight saving changes are followed while the process runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock {
    fixed: Option<UtcOffset>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { fixed: None }
    }

    /// Clock pinned to `offset`, ignoring the system time zone.
    pub fn with_offset(offset: UtcOffset) -> Self {
        Self {
            fixed: Some(offset),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        let offset = match self.fixed {
            Some(offset) => offset,
            None => whole_seconds(Local::now().offset().local_minus_utc()),
        };
        OffsetDateTime::now_utc().to_offset(offset)
    }

    fn offset_at(&self, local: PrimitiveDateTime) -> UtcOffset {
        match self.fixed {
            Some(offset) => offset,
            None => system_offset_at(local),
        }
    }
}

fn system_offset_at(local: PrimitiveDateTime) -> UtcOffset {
    let Some(naive) = NaiveDate::from_ymd_opt(
        local.year(),
        u32::from(u8::from(local.month())),
        u32::from(local.day()),
    )
    .and_then(|date| {
        date.and_hms_opt(
            u32::from(local.hour()),
            u32::from(local.minute()),
            u32::from(local.second()),
        )
    }) else {
        warn!(%local, "Local time out of range, using UTC");
        return UtcOffset::UTC;
    };

    // A wall time skipped by a forward change has no offset of its own; the
    // one in effect at the same UTC reading is close enough.
    let offset = Local
        .offset_from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.offset_from_utc_datetime(&naive));
    whole_seconds(offset.local_minus_utc())
}

fn whole_seconds(seconds: i32) -> UtcOffset {
    UtcOffset::from_whole_seconds(seconds).unwrap_or_else(|e| {
        warn!(error = %e, seconds, "Invalid local UTC offset, using UTC");
        UtcOffset::UTC
    })
}

/// Statistics recorder that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatistics;

impl Statistics for LogStatistics {
    fn track_location_check(&self, found: bool) {
        info!(found, "Location check on network available");
    }

    fn track_delayed_location_check(&self, found: bool, delay: Duration) {
        info!(
            found,
            delay_secs = delay.as_secs(),
            "Delayed location check on network available"
        );
    }
}

/// Location provider returning a fixed position, or nothing.
///
/// Each read reports the fix as just captured.
pub struct FixedLocation {
    position: Option<(f64, f64)>,
    clock: Arc<dyn Clock>,
}

impl FixedLocation {
    pub fn new(position: Option<(f64, f64)>, clock: Arc<dyn Clock>) -> Self {
        Self { position, clock }
    }

    /// Parse a `"lat,lon"` pair.
    pub fn parse_position(text: &str) -> Option<(f64, f64)> {
        let (lat, lon) = text.split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lon: f64 = lon.trim().parse().ok()?;
        ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)).then_some((lat, lon))
    }
}

impl LocationProvider for FixedLocation {
    fn last_known_location(&self) -> Option<LocationSample> {
        self.position
            .map(|(lat, lon)| LocationSample::new(lat, lon, self.clock.now()))
    }
}
