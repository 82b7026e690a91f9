//! Maxime BlueZ - Bluetooth device control and connectivity signals.
//!
//! This crate covers both directions of talking to BlueZ:
//! - Driving `bluetoothctl` to query, connect, and disconnect the device
//! - Subscribing to the device's `PropertiesChanged` signals on the system bus

pub mod control;
pub mod error;
pub mod monitor;

pub use control::BluetoothCtl;
pub use error::{BluezError, BluezResult};
pub use monitor::SignalMonitor;
