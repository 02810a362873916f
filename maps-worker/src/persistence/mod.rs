//! Persisted worker state: per-country cooldowns and the pedestrian alarm
//! flags, both stored as strings in a host-provided key-value store.

mod alarm_state;
mod cooldown;
mod file;

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::Result;

pub use alarm_state::{AlarmFlags, AlarmState, AlarmStateGuard, ScheduledAlarm};
pub use cooldown::CooldownStore;
pub use file::JsonFileStore;

/// String key-value storage that survives process restarts.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// Non-persistent store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
