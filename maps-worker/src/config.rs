use std::time::Duration;

use crate::error::{Error, Result};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum time between two download suggestions for the same country.
    pub cooldown_window: Duration,

    /// Maximum age of a passive location fix before it is ignored.
    pub location_expiration: Duration,

    /// Delay before the single retry when no usable location was found.
    pub location_retry_delay: Duration,

    /// Local hour (0--23) at which the pedestrian routing prompt fires.
    pub pedestrian_alarm_hour: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cooldown_window: Duration::from_secs(180 * SECS_PER_DAY),
            location_expiration: Duration::from_secs(6 * 60 * 60),
            location_retry_delay: Duration::from_secs(60),
            pedestrian_alarm_hour: 18,
        }
    }
}

impl Config {
    /// Defaults, overridden by any `MAPS_WORKER_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(days) = env_u64("MAPS_WORKER_COOLDOWN_DAYS")? {
            config.cooldown_window = Duration::from_secs(days * SECS_PER_DAY);
        }
        if let Some(secs) = env_u64("MAPS_WORKER_LOCATION_EXPIRATION_SECS")? {
            config.location_expiration = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("MAPS_WORKER_RETRY_DELAY_SECS")? {
            config.location_retry_delay = Duration::from_secs(secs);
        }
        if let Some(hour) = env_u64("MAPS_WORKER_ALARM_HOUR")? {
            if hour > 23 {
                return Err(Error::Config(format!(
                    "MAPS_WORKER_ALARM_HOUR must be 0-23, got {hour}"
                )));
            }
            config.pedestrian_alarm_hour = hour as u8;
        }

        Ok(config)
    }
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{name}={value:?}: {e}"))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(Error::Config(format!("{name}: {e}"))),
    }
}
