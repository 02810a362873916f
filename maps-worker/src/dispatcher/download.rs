use std::sync::Arc;

use time::OffsetDateTime;

use crate::error::Result;
use crate::host::MapDataOracle;
use crate::notification::{Notification, NotificationSink};
use crate::persistence::CooldownStore;
use crate::tracing::prelude::*;
use crate::types::LocationSample;

/// Suggests downloading the map of the country a fix falls in.
pub(super) struct DownloadSuggester {
    oracle: Arc<dyn MapDataOracle>,
    sink: Arc<dyn NotificationSink>,
    cooldowns: CooldownStore,
}

impl DownloadSuggester {
    pub(super) fn new(
        oracle: Arc<dyn MapDataOracle>,
        sink: Arc<dyn NotificationSink>,
        cooldowns: CooldownStore,
    ) -> Self {
        Self {
            oracle,
            sink,
            cooldowns,
        }
    }

    /// Returns whether a suggestion was posted.
    ///
    /// The cooldown check, the notification and the record happen under the
    /// country's lock, so concurrent attempts post at most once.
    pub(super) fn suggest(&self, sample: &LocationSample, now: OffsetDateTime) -> Result<bool> {
        let Some(country) = self
            .oracle
            .reverse_geocode(sample.latitude, sample.longitude)?
        else {
            debug!("No undownloaded country at last known location");
            return Ok(false);
        };

        let lock = self.cooldowns.key_lock(&country);
        let _guard = lock.lock();

        if self.cooldowns.in_cooldown(&country, now)? {
            debug!(%country, "Download suggestion in cooldown");
            return Ok(false);
        }

        let region_index = self
            .oracle
            .region_index(sample.latitude, sample.longitude)?;
        info!(%country, "Posting download suggestion");
        self.sink.notify(Notification::DownloadSuggestion {
            country: country.clone(),
            region_index,
        });
        self.cooldowns.record(&country, now)?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dispatcher::testing::{FakeOracle, ICELAND_INDEX, RecordingSink, START};
    use crate::persistence::{KeyValueStore, MemoryStore};
    use crate::types::CountryKey;

    const WINDOW: Duration = Duration::from_secs(180 * 24 * 60 * 60);

    struct Fixture {
        suggester: DownloadSuggester,
        oracle: Arc<FakeOracle>,
        sink: Arc<RecordingSink>,
        store: Arc<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let oracle = Arc::new(FakeOracle::default());
        *oracle.country.lock() = Some(CountryKey::new("Iceland"));
        let sink = Arc::new(RecordingSink::default());
        let store = Arc::new(MemoryStore::new());
        let suggester = DownloadSuggester::new(
            oracle.clone(),
            sink.clone(),
            CooldownStore::new(store.clone(), WINDOW),
        );
        Fixture {
            suggester,
            oracle,
            sink,
            store,
        }
    }

    fn sample() -> LocationSample {
        LocationSample::new(64.1, -21.9, START)
    }

    #[test]
    fn suggests_and_records_cooldown() {
        let f = fixture();

        assert!(f.suggester.suggest(&sample(), START).unwrap());

        assert_eq!(
            *f.sink.notifications.lock(),
            vec![Notification::DownloadSuggestion {
                country: CountryKey::new("Iceland"),
                region_index: ICELAND_INDEX,
            }]
        );
        assert!(f.store.get("download_suggestion.Iceland").unwrap().is_some());
    }

    #[test]
    fn cooldown_suppresses_repeat_within_window() {
        let f = fixture();
        assert!(f.suggester.suggest(&sample(), START).unwrap());

        let later = START + Duration::from_secs(24 * 60 * 60);
        assert!(!f.suggester.suggest(&sample(), later).unwrap());

        assert_eq!(f.sink.count(), 1);
        // The index is only looked up for suggestions that go out.
        assert_eq!(*f.oracle.region_queries.lock(), 1);
    }

    #[test]
    fn suggests_again_after_window() {
        let f = fixture();
        assert!(f.suggester.suggest(&sample(), START).unwrap());

        assert!(f.suggester.suggest(&sample(), START + WINDOW).unwrap());
        assert_eq!(f.sink.count(), 2);
    }

    #[test]
    fn nothing_to_suggest_outside_undownloaded_countries() {
        let f = fixture();
        *f.oracle.country.lock() = None;

        assert!(!f.suggester.suggest(&sample(), START).unwrap());
        assert_eq!(f.sink.count(), 0);
        assert_eq!(*f.oracle.region_queries.lock(), 0);
    }

    #[test]
    fn concurrent_suggestions_post_once() {
        let f = Arc::new(fixture());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let f = f.clone();
                std::thread::spawn(move || f.suggester.suggest(&sample(), START).unwrap())
            })
            .collect();
        let posted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|posted| *posted)
            .count();

        assert_eq!(posted, 1);
        assert_eq!(f.sink.count(), 1);
    }
}
