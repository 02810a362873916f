//! Notifications emitted by the worker and the sink that displays them.

use serde::Serialize;

use crate::tracing::prelude::*;
use crate::types::{CountryKey, RegionIndex};

/// A user-facing prompt. Rendering and localization belong to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Downloaded maps are older than the installed app's data version.
    UpdateAvailable { regions: Vec<String> },

    /// The user is in a country whose map is not downloaded.
    DownloadSuggestion {
        country: CountryKey,
        region_index: RegionIndex,
    },

    /// Pedestrian routing is available; invite the user to try it.
    PedestrianRoutingAvailable,
}

/// Displays notifications. Fire-and-forget: the worker never learns
/// whether the user saw or dismissed the prompt.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Sink that writes every notification to the log as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: Notification) {
        match serde_json::to_string(&notification) {
            Ok(json) => info!(notification = %json, "Notification posted"),
            Err(e) => warn!(error = %e, ?notification, "Failed to encode notification"),
        }
    }
}
