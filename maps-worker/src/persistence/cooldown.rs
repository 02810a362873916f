use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use time::OffsetDateTime;

use super::KeyValueStore;
use crate::error::Result;
use crate::tracing::prelude::*;
use crate::types::CountryKey;

const KEY_PREFIX: &str = "download_suggestion.";

/// When each country last got a download suggestion.
///
/// Records are stored as milliseconds since the Unix epoch. A country is
/// in cooldown while its record is younger than the window.
pub struct CooldownStore {
    store: Arc<dyn KeyValueStore>,
    window: Duration,
    locks: Mutex<HashMap<CountryKey, Arc<Mutex<()>>>>,
}

impl CooldownStore {
    pub fn new(store: Arc<dyn KeyValueStore>, window: Duration) -> Self {
        Self {
            store,
            window,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Lock serializing check-notify-record sequences for one country.
    pub fn key_lock(&self, country: &CountryKey) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(country.clone())
            .or_default()
            .clone()
    }

    /// Time of the last suggestion for `country`, if any.
    ///
    /// An unparseable record is logged and treated as absent.
    pub fn last_shown(&self, country: &CountryKey) -> Result<Option<OffsetDateTime>> {
        let Some(value) = self.store.get(&store_key(country))? else {
            return Ok(None);
        };

        let parsed = value
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|millis| {
                OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
            });

        if parsed.is_none() {
            warn!(%country, value = %value, "Ignoring malformed cooldown record");
        }
        Ok(parsed)
    }

    /// Whether a suggestion for `country` must be suppressed at `now`.
    pub fn in_cooldown(&self, country: &CountryKey, now: OffsetDateTime) -> Result<bool> {
        let Some(last) = self.last_shown(country)? else {
            return Ok(false);
        };

        let window = time::Duration::try_from(self.window).unwrap_or(time::Duration::MAX);
        Ok(now - last < window)
    }

    /// Record a suggestion for `country` at `now`, replacing any older one.
    pub fn record(&self, country: &CountryKey, now: OffsetDateTime) -> Result<()> {
        let millis = now.unix_timestamp_nanos() / 1_000_000;
        self.store.put(&store_key(country), &millis.to_string())
    }
}

fn store_key(country: &CountryKey) -> String {
    format!("{KEY_PREFIX}{country}")
}
