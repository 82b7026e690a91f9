//! Maxime PulseAudio - Audio backend driven through `pactl`.
//!
//! Works against PulseAudio 16+ and `pipewire-pulse`, both of which support
//! `pactl --format=json`.

pub mod error;
pub mod pactl;
pub mod parse;

pub use error::{PulseError, PulseResult};
pub use pactl::PactlBackend;
