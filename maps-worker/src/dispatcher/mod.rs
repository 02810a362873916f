//! Routing of host triggers to the notification decisions.
//!
//! The [`Dispatcher`] is the single entry point for the host. Each trigger
//! is handled synchronously on the calling thread; the only deferred work is
//! the location retry, which runs through the host's
//! [`DelayScheduler`](crate::host::DelayScheduler). Handler failures are
//! logged and never reach the caller, so a trigger can always be delivered
//! again.

mod download;
mod freshness;
mod location;
mod pedestrian;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::Config;
use crate::alarm::AlarmScheduler;
use crate::host::{Clock, Host};
use crate::location::LocationSampler;
use crate::persistence::{AlarmState, CooldownStore};
use crate::tracing::prelude::*;
use crate::types::TriggerEvent;

use download::DownloadSuggester;
use freshness::FreshnessHandler;
use location::LocationCheck;
use pedestrian::PedestrianPrompt;

pub struct Dispatcher {
    clock: Arc<dyn Clock>,
    alarms: AlarmScheduler,
    freshness: FreshnessHandler,
    location: Arc<LocationCheck>,
    pedestrian: PedestrianPrompt,
}

impl Dispatcher {
    pub fn new(config: &Config, host: Host) -> Self {
        let alarm_state = Arc::new(AlarmState::new(host.store.clone()));
        let suggester = DownloadSuggester::new(
            host.oracle.clone(),
            host.sink.clone(),
            CooldownStore::new(host.store.clone(), config.cooldown_window),
        );
        let location = LocationCheck::new(
            LocationSampler::new(host.locations, config.location_expiration),
            suggester,
            host.scheduler,
            host.statistics,
            host.clock.clone(),
            config.location_retry_delay,
        );

        Self {
            alarms: AlarmScheduler::new(
                alarm_state.clone(),
                host.alarm_clock,
                host.clock.clone(),
                config.pedestrian_alarm_hour,
            ),
            clock: host.clock,
            freshness: FreshnessHandler::new(host.oracle, host.sink.clone()),
            location: Arc::new(location),
            pedestrian: PedestrianPrompt::new(alarm_state, host.sink),
        }
    }

    /// Handle one trigger from the host.
    ///
    /// Every trigger other than the alarm itself first re-requests a
    /// pedestrian alarm that an earlier process armed but lost.
    pub fn handle(&self, event: TriggerEvent) {
        debug!(%event, "Handling trigger");

        if event != TriggerEvent::PedestrianAlarmFired {
            if let Err(e) = self.alarms.recover_missed(self.clock.now()) {
                warn!(error = %e, "Failed to recover pedestrian alarm");
            }
        }

        let result = match event {
            TriggerEvent::CheckFreshness => self.freshness.handle(),
            TriggerEvent::CheckLocation => {
                self.location.handle();
                Ok(())
            }
            TriggerEvent::PedestrianAlarmFired => self.pedestrian.handle(),
        };

        if let Err(e) = result {
            warn!(%event, error = %e, "Trigger handling failed");
        }
    }

    pub fn check_freshness(&self) {
        self.handle(TriggerEvent::CheckFreshness);
    }

    pub fn check_location(&self) {
        self.handle(TriggerEvent::CheckLocation);
    }

    pub fn pedestrian_alarm_fired(&self) {
        self.handle(TriggerEvent::PedestrianAlarmFired);
    }

    /// Arm the pedestrian routing prompt for today's (or tomorrow's) alarm
    /// hour. Has no effect once armed.
    pub fn queue_pedestrian_notification(&self) {
        match self.alarms.arm(self.clock.now()) {
            Ok(true) => {}
            Ok(false) => trace!("Pedestrian notification already queued"),
            Err(e) => warn!(error = %e, "Failed to queue pedestrian notification"),
        }
    }
}
