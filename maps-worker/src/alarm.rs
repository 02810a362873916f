//! Arming the one-shot alarm behind the pedestrian routing prompt.
//!
//! # State Machine
//!
//! ```text
//!              arm()                    alarm fires
//!  Unarmed ─────────────► Armed ───────────────────────► Shown
//!                          │  ▲                         (terminal)
//!      process restart     │  │ recover_missed()
//!      (handle lost)       ▼  │
//!                     Armed, no handle
//! ```
//!
//! `armed` and `shown` are persisted; the alarm handle lives only in this
//! process. [`AlarmScheduler::arm`] never schedules twice once `armed` is
//! set. [`AlarmScheduler::recover_missed`] re-requests the alarm only when
//! the prompt is still owed and no handle is held, which is the situation
//! after a restart lost the platform alarm.

use std::sync::Arc;

use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::Result;
use crate::host::{AlarmClock, Clock};
use crate::persistence::{AlarmState, AlarmStateGuard, ScheduledAlarm};
use crate::tracing::prelude::*;

/// Fire instant for an alarm requested at `now`.
///
/// Minutes and seconds are cleared and the hour set to `hour`. When `now` is
/// already past that hour the day of month is rolled forward first, and the
/// roll stays within the month: from the last day it wraps to the 1st of the
/// same month, yielding an instant in the past.
///
/// The resulting wall time is placed in the zone through `offset_at`, so a
/// daylight saving change between `now` and the fire day still fires at
/// `hour` local time.
pub fn next_fire_time(
    now: OffsetDateTime,
    hour: u8,
    offset_at: impl FnOnce(PrimitiveDateTime) -> UtcOffset,
) -> Result<OffsetDateTime> {
    let mut date = now.date();
    if now.hour() > hour {
        date = date
            .replace_day(date.day() + 1)
            .or_else(|_| date.replace_day(1))?;
    }

    let local = date.with_hms(hour, 0, 0)?;
    Ok(local.assume_offset(offset_at(local)))
}

pub struct AlarmScheduler {
    state: Arc<AlarmState>,
    alarm_clock: Arc<dyn AlarmClock>,
    clock: Arc<dyn Clock>,
    hour: u8,
}

impl AlarmScheduler {
    pub fn new(
        state: Arc<AlarmState>,
        alarm_clock: Arc<dyn AlarmClock>,
        clock: Arc<dyn Clock>,
        hour: u8,
    ) -> Self {
        Self {
            state,
            alarm_clock,
            clock,
            hour,
        }
    }

    /// Request the pedestrian alarm unless it was armed before.
    ///
    /// Returns whether an alarm was requested.
    pub fn arm(&self, now: OffsetDateTime) -> Result<bool> {
        let mut state = self.state.lock();
        if state.flags()?.armed {
            trace!("Pedestrian alarm already armed");
            return Ok(false);
        }

        self.schedule(&mut state, now)?;
        state.set_armed()?;
        Ok(true)
    }

    /// Re-request an armed alarm whose prompt was not shown and which this
    /// process holds no handle for.
    ///
    /// Returns whether an alarm was requested.
    pub fn recover_missed(&self, now: OffsetDateTime) -> Result<bool> {
        let mut state = self.state.lock();
        let flags = state.flags()?;
        if !flags.armed || flags.shown || state.pending().is_some() {
            return Ok(false);
        }

        info!("Re-arming pedestrian alarm lost before it fired");
        self.schedule(&mut state, now)?;
        Ok(true)
    }

    fn schedule(&self, state: &mut AlarmStateGuard<'_>, now: OffsetDateTime) -> Result<()> {
        let fire_at = next_fire_time(now, self.hour, |local| self.clock.offset_at(local))?;
        self.alarm_clock.schedule_one_shot(fire_at)?;
        state.set_pending(ScheduledAlarm { fire_at });
        info!(%fire_at, "Pedestrian alarm requested");
        Ok(())
    }
}
