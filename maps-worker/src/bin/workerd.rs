//! Stand-alone notification worker.
//!
//! Triggers are read from stdin, one per line:
//!
//! ```text
//! check-freshness          map data version check
//! check-location           network became available
//! pedestrian-alarm-fired   deliver the pedestrian alarm now
//! queue-pedestrian         arm the pedestrian routing prompt
//! quit                     shut down
//! ```
//!
//! Environment:
//!
//! ```text
//! MAPS_WORKER_STATE     state file (default ./maps-worker-state.json)
//! MAPS_WORKER_SNAPSHOT  JSON map data snapshot (default: empty, current data)
//! MAPS_WORKER_LOCATION  current position as "lat,lon" (default: unknown)
//! ```
//!
//! plus the `MAPS_WORKER_*` settings read by `Config::from_env`.

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use maps_worker::host::{
    FixedLocation, Host, LogStatistics, MapSnapshot, SnapshotOracle, SystemClock, TokioAlarmClock,
    TokioScheduler,
};
use maps_worker::notification::LogSink;
use maps_worker::persistence::JsonFileStore;
use maps_worker::tracing::{init_journald_or_stdout, prelude::*};
use maps_worker::{Config, Dispatcher, TriggerEvent, service};

const DEFAULT_STATE_PATH: &str = "./maps-worker-state.json";

#[tokio::main]
async fn main() -> Result<()> {
    init_journald_or_stdout();

    let config = Config::from_env()?;
    debug!(?config, "Configuration loaded");

    let state_path = env::var("MAPS_WORKER_STATE").unwrap_or_else(|_| DEFAULT_STATE_PATH.into());
    let store = Arc::new(
        JsonFileStore::open(&state_path)
            .with_context(|| format!("failed to open state file {state_path}"))?,
    );

    let oracle = match env::var("MAPS_WORKER_SNAPSHOT") {
        Ok(path) => SnapshotOracle::load(&path)
            .with_context(|| format!("failed to load map snapshot {path}"))?,
        Err(_) => SnapshotOracle::new(MapSnapshot::default()),
    };

    let position = match env::var("MAPS_WORKER_LOCATION") {
        Ok(text) => Some(
            FixedLocation::parse_position(&text)
                .with_context(|| format!("invalid MAPS_WORKER_LOCATION {text:?}"))?,
        ),
        Err(_) => None,
    };

    let clock = Arc::new(SystemClock::new());
    let (event_tx, event_rx) = mpsc::channel(16);
    let scheduler = Arc::new(TokioScheduler::new()?);
    let host = Host {
        oracle: Arc::new(oracle),
        sink: Arc::new(LogSink),
        locations: Arc::new(FixedLocation::new(position, clock.clone())),
        alarm_clock: Arc::new(TokioAlarmClock::new(event_tx.clone())?),
        scheduler: scheduler.clone(),
        store,
        clock,
        statistics: Arc::new(LogStatistics),
    };
    let dispatcher = Arc::new(Dispatcher::new(&config, host));

    let running = CancellationToken::new();
    let service = tokio::spawn(service::run(
        dispatcher.clone(),
        event_rx,
        running.clone(),
    ));

    info!(state = %state_path, "Worker started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Stdin closed");
                    break;
                };
                match line.trim() {
                    "" => {}
                    "quit" => break,
                    "queue-pedestrian" => dispatcher.queue_pedestrian_notification(),
                    command => match TriggerEvent::from_str(command) {
                        Ok(event) => event_tx.send(event).await?,
                        Err(_) => warn!(command, "Unknown command"),
                    },
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    if scheduler.pending() > 0 {
        info!(
            pending = scheduler.pending(),
            "Waiting for delayed location checks"
        );
    }
    scheduler.wait_idle().await;

    running.cancel();
    service.await?;

    info!("Worker stopped");
    Ok(())
}
