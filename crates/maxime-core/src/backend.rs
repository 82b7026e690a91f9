//! Collaborator interfaces the core drives.
//!
//! Implementations live in the backend crates (`maxime-pulse`, `maxime-bluez`)
//! and the daemon; they are constructed once at startup and handed to the
//! routing engine and command functions.

use std::time::Duration;

use crate::endpoint::{Card, Endpoint, Stream};
use crate::error::Result;

/// Audio server operations.
#[cfg_attr(test, mockall::automock)]
pub trait AudioBackend {
    /// List output endpoints.
    ///
    /// # Errors
    /// Returns [`crate::Error::Backend`] if the server cannot be queried.
    fn list_sinks(&self) -> Result<Vec<Endpoint>>;

    /// List input endpoints.
    ///
    /// # Errors
    /// Returns [`crate::Error::Backend`] if the server cannot be queried.
    fn list_sources(&self) -> Result<Vec<Endpoint>>;

    /// List playback streams.
    ///
    /// # Errors
    /// Returns [`crate::Error::Backend`] if the server cannot be queried.
    fn list_sink_inputs(&self) -> Result<Vec<Stream>>;

    /// List hardware cards.
    ///
    /// # Errors
    /// Returns [`crate::Error::Backend`] if the server cannot be queried.
    fn list_cards(&self) -> Result<Vec<Card>>;

    /// Move a stream to a sink.
    ///
    /// # Errors
    /// Returns [`crate::Error::Backend`] if the move is rejected.
    fn move_stream(&self, stream: u32, sink: u32) -> Result<()>;

    /// Mute or unmute a stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::Backend`] if the change is rejected.
    fn set_stream_mute(&self, stream: u32, muted: bool) -> Result<()>;

    /// Make a source the default input.
    ///
    /// # Errors
    /// Returns [`crate::Error::Backend`] if the change is rejected.
    fn set_default_source(&self, name: &str) -> Result<()>;

    /// Switch a card's active profile.
    ///
    /// # Errors
    /// Returns [`crate::Error::Backend`] if the change is rejected.
    fn set_card_profile(&self, card: u32, profile: &str) -> Result<()>;
}

/// Bluetooth device control.
#[cfg_attr(test, mockall::automock)]
pub trait BluetoothControl {
    /// Whether the device is currently connected.
    ///
    /// # Errors
    /// Returns [`crate::Error::ControlTool`] if the tool does not answer as expected.
    fn connection_state(&self, address: &str) -> Result<bool>;

    /// Connect the device. Returns whether the tool confirmed the connection.
    ///
    /// # Errors
    /// Returns [`crate::Error::ControlTool`] if the tool does not answer as expected.
    fn connect(&self, address: &str) -> Result<bool>;

    /// Disconnect the device. Returns whether the tool confirmed the disconnection.
    ///
    /// # Errors
    /// Returns [`crate::Error::ControlTool`] if the tool does not answer as expected.
    fn disconnect(&self, address: &str) -> Result<bool>;
}

/// Icon shown next to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    /// Audio output changed
    Audio,
    /// Bluetooth activity
    Bluetooth,
    /// Something went wrong
    Error,
}

impl Icon {
    /// Freedesktop icon name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Audio => "audio-headphones",
            Self::Bluetooth => "bluetooth",
            Self::Error => "dialog-error",
        }
    }
}

/// User-visible notifications.
///
/// Delivery is fire-and-forget: implementations log their own failures.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn notify(&self, text: &str, icon: Icon, ttl: Duration);
}

/// Blocking waits (retry intervals, settle delays).
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn notify(&self, text: &str, icon: Icon, ttl: Duration) {
        (**self).notify(text, icon, ttl);
    }
}
