use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use time::OffsetDateTime;

use super::KeyValueStore;
use crate::error::Result;
use crate::tracing::prelude::*;

const ARMED_KEY: &str = "pedestrian_notification.alarm_set";
const SHOWN_KEY: &str = "pedestrian_notification.shown";

/// Persisted flags of the pedestrian routing prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmFlags {
    /// An alarm was requested at some point.
    pub armed: bool,
    /// The prompt was shown. Never cleared.
    pub shown: bool,
}

/// The alarm this process requested and has not seen fire yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledAlarm {
    pub fire_at: OffsetDateTime,
}

/// Pedestrian prompt state: the persisted [`AlarmFlags`] plus the alarm
/// handle held by this process.
///
/// All access goes through [`lock`](Self::lock), so read-then-write
/// sequences on the flags cannot interleave.
pub struct AlarmState {
    store: Arc<dyn KeyValueStore>,
    pending: Mutex<Option<ScheduledAlarm>>,
}

impl AlarmState {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            pending: Mutex::new(None),
        }
    }

    pub fn lock(&self) -> AlarmStateGuard<'_> {
        AlarmStateGuard {
            store: self.store.as_ref(),
            pending: self.pending.lock(),
        }
    }
}

/// Exclusive access to [`AlarmState`].
pub struct AlarmStateGuard<'a> {
    store: &'a dyn KeyValueStore,
    pending: MutexGuard<'a, Option<ScheduledAlarm>>,
}

impl AlarmStateGuard<'_> {
    pub fn flags(&self) -> Result<AlarmFlags> {
        Ok(AlarmFlags {
            armed: self.read_flag(ARMED_KEY)?,
            shown: self.read_flag(SHOWN_KEY)?,
        })
    }

    pub fn set_armed(&mut self) -> Result<()> {
        self.store.put(ARMED_KEY, "true")
    }

    pub fn set_shown(&mut self) -> Result<()> {
        self.store.put(SHOWN_KEY, "true")
    }

    pub fn pending(&self) -> Option<ScheduledAlarm> {
        *self.pending
    }

    pub fn set_pending(&mut self, alarm: ScheduledAlarm) {
        *self.pending = Some(alarm);
    }

    pub fn take_pending(&mut self) -> Option<ScheduledAlarm> {
        self.pending.take()
    }

    fn read_flag(&self, key: &str) -> Result<bool> {
        Ok(match self.store.get(key)?.as_deref() {
            None | Some("false") => false,
            Some("true") => true,
            Some(other) => {
                warn!(key, value = other, "Ignoring malformed alarm flag");
                false
            }
        })
    }
}
