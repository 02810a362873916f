//! Timer and alarm implementations on top of the tokio runtime.

use std::time::Duration;

use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{AlarmClock, Callback, DelayScheduler};
use crate::error::{Error, Result};
use crate::tracing::prelude::*;
use crate::types::TriggerEvent;

/// [`DelayScheduler`] that runs each callback on its own tokio task.
pub struct TokioScheduler {
    handle: Handle,
    /// Outstanding tasks, so shutdown can wait for pending retries.
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TokioScheduler {
    /// Bind to the runtime of the calling context.
    pub fn new() -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self {
            handle,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Number of callbacks that have not run yet.
    pub fn pending(&self) -> usize {
        self.tasks.lock().iter().filter(|t| !t.is_finished()).count()
    }

    /// Wait until every callback scheduled so far has run.
    pub async fn wait_idle(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Delayed callback task failed");
            }
        }
    }
}

impl DelayScheduler for TokioScheduler {
    fn schedule_once(&self, delay: Duration, callback: Callback) {
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });

        let mut tasks = self.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }
}

/// [`AlarmClock`] that sleeps on a tokio task and then feeds
/// [`TriggerEvent::PedestrianAlarmFired`] into the service event channel.
///
/// A new request aborts the outstanding one. Alarms do not survive the
/// process; the dispatcher's missed-alarm recovery re-requests them after a
/// restart.
pub struct TokioAlarmClock {
    handle: Handle,
    events: mpsc::Sender<TriggerEvent>,
    outstanding: Mutex<Option<JoinHandle<()>>>,
}

impl TokioAlarmClock {
    pub fn new(events: mpsc::Sender<TriggerEvent>) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self {
            handle,
            events,
            outstanding: Mutex::new(None),
        })
    }
}

impl AlarmClock for TokioAlarmClock {
    fn schedule_one_shot(&self, fire_at: OffsetDateTime) -> anyhow::Result<()> {
        if self.events.is_closed() {
            anyhow::bail!("event channel closed");
        }

        // Negative remaining time (fire instant already passed) means fire now.
        let delay = Duration::try_from(fire_at - OffsetDateTime::now_utc()).unwrap_or_default();
        debug!(%fire_at, delay_secs = delay.as_secs(), "Alarm scheduled");

        let events = self.events.clone();
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(TriggerEvent::PedestrianAlarmFired).await.is_err() {
                debug!("Event channel closed before alarm fired");
            }
        });

        if let Some(previous) = self.outstanding.lock().replace(task) {
            if !previous.is_finished() {
                debug!("Replacing outstanding alarm");
                previous.abort();
            }
        }

        Ok(())
    }
}
