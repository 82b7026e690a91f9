//! PulseAudio error types.

use thiserror::Error;

/// PulseAudio error type.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("pactl {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Unexpected pactl output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for PulseAudio operations.
pub type PulseResult<T> = Result<T, PulseError>;

impl From<PulseError> for maxime_core::Error {
    fn from(e: PulseError) -> Self {
        Self::Backend(e.to_string())
    }
}
