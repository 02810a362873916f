use std::sync::Arc;

use crate::error::Result;
use crate::notification::{Notification, NotificationSink};
use crate::persistence::AlarmState;
use crate::tracing::prelude::*;

/// Shows the pedestrian routing prompt when its alarm fires, at most once
/// per installation.
pub(super) struct PedestrianPrompt {
    state: Arc<AlarmState>,
    sink: Arc<dyn NotificationSink>,
}

impl PedestrianPrompt {
    pub(super) fn new(state: Arc<AlarmState>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { state, sink }
    }

    pub(super) fn handle(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.flags()?.shown {
            state.take_pending();
            debug!("Pedestrian routing prompt already shown");
            return Ok(());
        }

        info!("Posting pedestrian routing prompt");
        self.sink.notify(Notification::PedestrianRoutingAvailable);

        // The handle stays until `shown` is stored, so a failed write does
        // not look like a lost alarm to recovery.
        state.set_shown()?;
        state.take_pending();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::dispatcher::testing::{FailingStore, RecordingSink};
    use crate::persistence::{KeyValueStore, MemoryStore, ScheduledAlarm};

    #[test]
    fn prompt_is_shown_once() {
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AlarmState::new(store.clone()));
        let sink = Arc::new(RecordingSink::default());
        let prompt = PedestrianPrompt::new(state.clone(), sink.clone());

        prompt.handle().unwrap();
        prompt.handle().unwrap();

        assert_eq!(
            *sink.notifications.lock(),
            vec![Notification::PedestrianRoutingAvailable]
        );
        assert_eq!(
            store.get("pedestrian_notification.shown").unwrap().as_deref(),
            Some("true")
        );
    }

    #[test]
    fn firing_releases_the_pending_handle() {
        let state = Arc::new(AlarmState::new(Arc::new(MemoryStore::new())));
        state.lock().set_pending(ScheduledAlarm {
            fire_at: datetime!(2024-03-10 18:00 UTC),
        });
        let prompt = PedestrianPrompt::new(state.clone(), Arc::new(RecordingSink::default()));

        prompt.handle().unwrap();

        assert_eq!(state.lock().pending(), None);
    }

    #[test]
    fn shown_by_earlier_process_stays_silent() {
        let store = Arc::new(MemoryStore::new());
        store.put("pedestrian_notification.shown", "true").unwrap();
        let sink = Arc::new(RecordingSink::default());
        let prompt = PedestrianPrompt::new(Arc::new(AlarmState::new(store)), sink.clone());

        prompt.handle().unwrap();

        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn failed_shown_write_keeps_the_handle() {
        let store = Arc::new(FailingStore::failing_on("pedestrian_notification.shown"));
        let state = Arc::new(AlarmState::new(store));
        let alarm = ScheduledAlarm {
            fire_at: datetime!(2024-03-10 18:00 UTC),
        };
        state.lock().set_pending(alarm);
        let prompt = PedestrianPrompt::new(state.clone(), Arc::new(RecordingSink::default()));

        assert!(prompt.handle().is_err());

        let guard = state.lock();
        assert_eq!(guard.pending(), Some(alarm));
        assert!(!guard.flags().unwrap().shown);
    }
}
