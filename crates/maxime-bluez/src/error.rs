//! BlueZ error types.

use std::time::Duration;

use thiserror::Error;

/// BlueZ error type.
#[derive(Debug, Error)]
pub enum BluezError {
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("Unexpected output from {command}: {output}")]
    UnexpectedOutput { command: String, output: String },
}

/// Result type for BlueZ operations.
pub type BluezResult<T> = Result<T, BluezError>;

impl From<BluezError> for maxime_core::Error {
    fn from(e: BluezError) -> Self {
        Self::ControlTool(e.to_string())
    }
}
