//! Connectivity event classification.
//!
//! BlueZ reports device state changes as `PropertiesChanged` signals. The bus
//! layer decodes each signal once into a [`SignalPayload`]; [`classify`] turns
//! that into either a connectivity transition or a reason to ignore it.

use std::collections::HashMap;

use crate::target::DEVICE_INTERFACE;

const CONNECTED: &str = "Connected";
const SERVICES_RESOLVED: &str = "ServicesResolved";

/// A decoded property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Boolean property
    Bool(bool),
    /// Any other value, kept as text for diagnostics
    Other(String),
}

/// A property-change signal as delivered by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalPayload {
    /// Interface whose properties changed
    pub interface: String,
    /// Changed property names and their new values
    pub changed: HashMap<String, PropertyValue>,
}

impl SignalPayload {
    /// Create a payload from an interface name and changed properties.
    #[must_use]
    pub fn new<I, K>(interface: &str, changed: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyValue)>,
        K: Into<String>,
    {
        Self {
            interface: interface.to_string(),
            changed: changed.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Why a payload did not produce a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Signal was for an interface other than the device interface
    WrongInterface(String),
    /// Benign companion signal sent alongside connection changes
    ServicesResolved,
    /// Neither a known key nor a well-formed value
    Unrecognized(String),
}

impl IgnoreReason {
    /// Whether this reason points at an unexpected payload.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::Unrecognized(_))
    }
}

/// Outcome of classifying a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// The device connected (`true`) or disconnected (`false`)
    Connected(bool),
    /// Nothing to act on
    Ignored(IgnoreReason),
}

/// Classify a signal payload.
///
/// Pure and deterministic; the caller decides how to log an
/// [`IgnoreReason::Unrecognized`] result.
#[must_use]
pub fn classify(payload: &SignalPayload) -> ConnectivityEvent {
    if payload.interface != DEVICE_INTERFACE {
        return ConnectivityEvent::Ignored(IgnoreReason::WrongInterface(payload.interface.clone()));
    }

    match payload.changed.get(CONNECTED) {
        Some(PropertyValue::Bool(connected)) => ConnectivityEvent::Connected(*connected),
        Some(PropertyValue::Other(value)) => ConnectivityEvent::Ignored(IgnoreReason::Unrecognized(
            format!("non-boolean {CONNECTED} value: {value}"),
        )),
        None if payload.changed.contains_key(SERVICES_RESOLVED) => {
            ConnectivityEvent::Ignored(IgnoreReason::ServicesResolved)
        }
        None => {
            let mut keys: Vec<_> = payload.changed.keys().map(String::as_str).collect();
            keys.sort_unstable();
            ConnectivityEvent::Ignored(IgnoreReason::Unrecognized(format!(
                "changed properties: [{}]",
                keys.join(", ")
            )))
        }
    }
}
