//! Event loop feeding host triggers to the [`Dispatcher`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::Dispatcher;
use crate::tracing::prelude::*;
use crate::types::TriggerEvent;

/// Hand every received trigger to `dispatcher` until the channel closes or
/// `cancellation` fires.
pub async fn run(
    dispatcher: Arc<Dispatcher>,
    mut events: mpsc::Receiver<TriggerEvent>,
    cancellation: CancellationToken,
) {
    trace!("Service task started.");

    loop {
        tokio::select! {
            // Drain queued triggers before honoring shutdown.
            biased;

            event = events.recv() => {
                let Some(event) = event else {
                    debug!("Event channel closed");
                    break;
                };
                dispatcher.handle(event);
            }
            _ = cancellation.cancelled() => {
                info!("Service shutdown requested");
                break;
            }
        }
    }

    trace!("Service task stopped.");
}
