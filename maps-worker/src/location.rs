use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use crate::host::LocationProvider;
use crate::tracing::prelude::*;
use crate::types::LocationSample;

/// Reads the passive location and rejects fixes that are too old.
pub struct LocationSampler {
    provider: Arc<dyn LocationProvider>,
    expiration: Duration,
}

impl LocationSampler {
    pub fn new(provider: Arc<dyn LocationProvider>, expiration: Duration) -> Self {
        Self {
            provider,
            expiration,
        }
    }

    /// The last known fix if it is still usable at `now`.
    pub fn usable_sample(&self, now: OffsetDateTime) -> Option<LocationSample> {
        let Some(sample) = self.provider.last_known_location() else {
            debug!("No last known location");
            return None;
        };

        if !is_fresh(&sample, now, self.expiration) {
            debug!(captured_at = %sample.captured_at, "Last known location expired");
            return None;
        }

        Some(sample)
    }
}

/// A fix is fresh while `now - captured_at` is below `expiration`.
pub fn is_fresh(sample: &LocationSample, now: OffsetDateTime, expiration: Duration) -> bool {
    let expiration = time::Duration::try_from(expiration).unwrap_or(time::Duration::MAX);
    now - sample.captured_at < expiration
}
