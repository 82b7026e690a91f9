//! Error types for Maxime core.

use thiserror::Error;

/// Core error type for Maxime operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Audio endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("Managed stream not found: {0}")]
    StreamNotFound(String),

    #[error("Audio card not found: {0}")]
    CardNotFound(String),

    #[error("Bluetooth control tool error: {0}")]
    ControlTool(String),

    #[error("Audio backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Whether this error is a lookup miss rather than a failed command.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EndpointNotFound(_) | Self::StreamNotFound(_) | Self::CardNotFound(_)
        )
    }
}

/// Result type alias for Maxime core operations.
pub type Result<T> = std::result::Result<T, Error>;
