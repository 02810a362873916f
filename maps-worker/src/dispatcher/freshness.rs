use std::sync::Arc;

use crate::error::Result;
use crate::host::MapDataOracle;
use crate::notification::{Notification, NotificationSink};
use crate::tracing::prelude::*;

/// Posts the "maps are outdated" notification after a data version change.
pub(super) struct FreshnessHandler {
    oracle: Arc<dyn MapDataOracle>,
    sink: Arc<dyn NotificationSink>,
}

impl FreshnessHandler {
    pub(super) fn new(oracle: Arc<dyn MapDataOracle>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { oracle, sink }
    }

    /// The version is acknowledged once per stale detection, whether or not
    /// any region needed an update. A failed query leaves it unacknowledged
    /// so the next check retries.
    pub(super) fn handle(&self) -> Result<()> {
        if !self.oracle.is_data_stale()? {
            trace!("Map data is current");
            return Ok(());
        }

        let regions = self.oracle.outdated_regions()?;
        if regions.is_empty() {
            debug!("Map data version changed, no downloaded region is outdated");
        } else {
            info!(count = regions.len(), "Posting update notification");
            self.sink.notify(Notification::UpdateAvailable { regions });
        }

        self.oracle.acknowledge_data_version()?;
        Ok(())
    }
}
