use std::sync::Arc;
use std::time::Duration;

use super::download::DownloadSuggester;
use crate::host::{Clock, DelayScheduler, Statistics};
use crate::location::LocationSampler;
use crate::tracing::prelude::*;

/// Reacts to network availability by looking for a usable fix, retrying
/// once after a delay when there is none.
pub(super) struct LocationCheck {
    sampler: LocationSampler,
    suggester: DownloadSuggester,
    scheduler: Arc<dyn DelayScheduler>,
    statistics: Arc<dyn Statistics>,
    clock: Arc<dyn Clock>,
    retry_delay: Duration,
}

impl LocationCheck {
    pub(super) fn new(
        sampler: LocationSampler,
        suggester: DownloadSuggester,
        scheduler: Arc<dyn DelayScheduler>,
        statistics: Arc<dyn Statistics>,
        clock: Arc<dyn Clock>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            sampler,
            suggester,
            scheduler,
            statistics,
            clock,
            retry_delay,
        }
    }

    pub(super) fn handle(self: &Arc<Self>) {
        let found = self.attempt();
        self.statistics.track_location_check(found);
        if found {
            return;
        }

        debug!(
            delay_secs = self.retry_delay.as_secs(),
            "No usable location, checking again later"
        );
        let this = Arc::clone(self);
        self.scheduler.schedule_once(
            self.retry_delay,
            Box::new(move || {
                let found = this.attempt();
                this.statistics
                    .track_delayed_location_check(found, this.retry_delay);
            }),
        );
    }

    /// Returns whether a usable fix was available. Whether a suggestion
    /// followed does not matter; the retry is only for a missing fix.
    fn attempt(&self) -> bool {
        let now = self.clock.now();
        let Some(sample) = self.sampler.usable_sample(now) else {
            return false;
        };

        if let Err(e) = self.suggester.suggest(&sample, now) {
            warn!(error = %e, "Download suggestion failed");
        }
        true
    }
}
