//! Logging setup and the macro prelude used throughout the crate.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
}

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber.
///
/// Under systemd (`JOURNAL_STREAM` is set) events go straight to the
/// journal. Otherwise they are printed to stdout with local timestamps,
/// filtered by `RUST_LOG`.
pub fn init_journald_or_stdout() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if std::env::var_os("JOURNAL_STREAM").is_some() {
        match tracing_journald::layer() {
            Ok(journald) => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(journald)
                    .init();
                return;
            }
            Err(e) => {
                eprintln!("journald unavailable, logging to stdout: {e}");
            }
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_timer(fmt::time::LocalTime::rfc_3339()))
        .init();
}
