//! Crate-wide error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Persistent store could not be read or written.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Persistent store contents are not valid JSON.
    #[error("store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Calendar arithmetic produced an invalid date or time.
    #[error("invalid calendar value: {0}")]
    Calendar(#[from] time::error::ComponentRange),

    /// A host collaborator (map data, alarm clock) reported a failure.
    #[error("host request failed: {0}")]
    Host(#[from] anyhow::Error),

    /// A tokio-backed host component was created outside a runtime.
    #[error("no tokio runtime available")]
    NoRuntime,

    #[error("invalid configuration: {0}")]
    Config(String),
}
