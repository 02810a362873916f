//! Test doubles for the host interfaces.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::Config;
use crate::error::Result;
use crate::host::{
    AlarmClock, Callback, Clock, DelayScheduler, Host, LocationProvider, MapDataOracle, Statistics,
};
use crate::notification::{Notification, NotificationSink};
use crate::persistence::{KeyValueStore, MemoryStore};
use crate::types::{CountryKey, LocationSample, RegionIndex};

pub const START: OffsetDateTime = datetime!(2024-03-10 10:00 +01:00);

pub const ICELAND_INDEX: RegionIndex = RegionIndex {
    group: 0,
    country: 41,
    region: -1,
};

#[derive(Default)]
pub struct FakeOracle {
    pub stale: Mutex<bool>,
    pub outdated: Mutex<Vec<String>>,
    pub country: Mutex<Option<CountryKey>>,
    pub acknowledgements: Mutex<usize>,
    pub region_queries: Mutex<usize>,
    pub unavailable: Mutex<bool>,
}

impl FakeOracle {
    fn check_available(&self) -> anyhow::Result<()> {
        if *self.unavailable.lock() {
            anyhow::bail!("map data unavailable");
        }
        Ok(())
    }
}

impl MapDataOracle for FakeOracle {
    fn is_data_stale(&self) -> anyhow::Result<bool> {
        self.check_available()?;
        Ok(*self.stale.lock())
    }

    fn outdated_regions(&self) -> anyhow::Result<Vec<String>> {
        self.check_available()?;
        Ok(self.outdated.lock().clone())
    }

    fn acknowledge_data_version(&self) -> anyhow::Result<()> {
        self.check_available()?;
        *self.acknowledgements.lock() += 1;
        Ok(())
    }

    fn reverse_geocode(&self, _: f64, _: f64) -> anyhow::Result<Option<CountryKey>> {
        self.check_available()?;
        Ok(self.country.lock().clone())
    }

    fn region_index(&self, _: f64, _: f64) -> anyhow::Result<RegionIndex> {
        self.check_available()?;
        *self.region_queries.lock() += 1;
        Ok(ICELAND_INDEX)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn count(&self) -> usize {
        self.notifications.lock().len()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

pub struct FakeClock {
    now: Mutex<OffsetDateTime>,
}

impl FakeClock {
    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(START),
        }
    }
}

impl Clock for FakeClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock()
    }
}

/// Location provider whose fix is set by the test.
#[derive(Default)]
pub struct FakeLocation {
    pub sample: Mutex<Option<LocationSample>>,
}

impl FakeLocation {
    pub fn set_captured_at(&self, captured_at: OffsetDateTime) {
        *self.sample.lock() = Some(LocationSample::new(64.1, -21.9, captured_at));
    }
}

impl LocationProvider for FakeLocation {
    fn last_known_location(&self) -> Option<LocationSample> {
        *self.sample.lock()
    }
}

#[derive(Default)]
pub struct RecordingAlarmClock {
    pub requests: Mutex<Vec<OffsetDateTime>>,
}

impl AlarmClock for RecordingAlarmClock {
    fn schedule_one_shot(&self, fire_at: OffsetDateTime) -> anyhow::Result<()> {
        self.requests.lock().push(fire_at);
        Ok(())
    }
}

/// Holds scheduled callbacks until the test runs them.
#[derive(Default)]
pub struct ManualScheduler {
    pending: Mutex<Vec<(Duration, Callback)>>,
}

impl ManualScheduler {
    pub fn delays(&self) -> Vec<Duration> {
        self.pending.lock().iter().map(|(d, _)| *d).collect()
    }

    /// Run everything scheduled so far. Callbacks scheduled while running
    /// stay pending.
    pub fn run_pending(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending.lock());
        let count = pending.len();
        for (_, callback) in pending {
            callback();
        }
        count
    }
}

impl DelayScheduler for ManualScheduler {
    fn schedule_once(&self, delay: Duration, callback: Callback) {
        self.pending.lock().push((delay, callback));
    }
}

#[derive(Default)]
pub struct RecordingStatistics {
    pub immediate: Mutex<Vec<bool>>,
    pub delayed: Mutex<Vec<(bool, Duration)>>,
}

impl Statistics for RecordingStatistics {
    fn track_location_check(&self, found: bool) {
        self.immediate.lock().push(found);
    }

    fn track_delayed_location_check(&self, found: bool, delay: Duration) {
        self.delayed.lock().push((found, delay));
    }
}

/// In-memory store whose writes to one key fail.
pub struct FailingStore {
    inner: MemoryStore,
    failing_key: &'static str,
}

impl FailingStore {
    pub fn failing_on(failing_key: &'static str) -> Self {
        Self {
            inner: MemoryStore::new(),
            failing_key,
        }
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        if key == self.failing_key {
            return Err(std::io::Error::other("disk full").into());
        }
        self.inner.put(key, value)
    }
}

/// All doubles, with typed handles kept for assertions.
#[derive(Default)]
pub struct TestHost {
    pub oracle: Arc<FakeOracle>,
    pub sink: Arc<RecordingSink>,
    pub locations: Arc<FakeLocation>,
    pub alarm_clock: Arc<RecordingAlarmClock>,
    pub scheduler: Arc<ManualScheduler>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FakeClock>,
    pub statistics: Arc<RecordingStatistics>,
}

impl TestHost {
    pub fn host(&self) -> Host {
        Host {
            oracle: self.oracle.clone(),
            sink: self.sink.clone(),
            locations: self.locations.clone(),
            alarm_clock: self.alarm_clock.clone(),
            scheduler: self.scheduler.clone(),
            store: self.store.clone(),
            clock: self.clock.clone(),
            statistics: self.statistics.clone(),
        }
    }

    pub fn config() -> Config {
        Config {
            location_expiration: Duration::from_secs(300),
            ..Config::default()
        }
    }
}
