//! Background notification scheduler for an offline maps application.
//!
//! The worker reacts to three host triggers (a data freshness check, a
//! network-availability signal, and a wall-clock alarm) and decides whether
//! to show "maps are outdated", "download maps for your location" or "try
//! pedestrian routing".
//!
//! The host supplies its environment through the traits in [`host`]; the
//! [`dispatcher::Dispatcher`] owns the scheduling and suppression state.

pub mod alarm;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod location;
pub mod notification;
pub mod persistence;
pub mod service;
pub mod tracing;
pub mod types;

pub use config::Config;
pub use dispatcher::Dispatcher;
pub use types::TriggerEvent;
