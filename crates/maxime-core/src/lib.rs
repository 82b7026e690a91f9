//! Maxime Core - Connectivity classification, endpoint resolution, and routing.
//!
//! This crate holds the decision logic shared by the `maxime` binary. It never
//! talks to the audio server or the Bluetooth stack directly; those are reached
//! through the traits in [`backend`].

pub mod backend;
pub mod command;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod event;
pub mod mode;
pub mod resolver;
pub mod target;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{AudioBackend, BluetoothControl, Icon, Notifier, Sleeper, ThreadSleeper};
pub use command::{Command, DeviceCommand, DeviceControl, RoutingCommand};
pub use endpoint::{Card, Descriptor, Endpoint, MatchPolicy, Stream};
pub use engine::{CardProfiles, EngineSettings, Routed, RoutingEngine};
pub use error::{Error, Result};
pub use event::{ConnectivityEvent, IgnoreReason, PropertyValue, SignalPayload, classify};
pub use mode::{ConflictError, Flag, Mode, ModeRequest};
pub use resolver::{DeviceResolver, Lookup, RetryPolicy};
pub use target::{
    BluetoothDevice, DEVICE_INTERFACE, RouteTarget, TargetEndpoints, TargetMap, is_valid_address,
};
