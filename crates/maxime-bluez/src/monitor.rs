//! Connectivity signal subscription.
//!
//! Listens for `PropertiesChanged` on the device object and forwards each
//! signal, decoded once, to the daemon loop.

use std::collections::HashMap;

use futures::StreamExt;
use maxime_core::{BluetoothDevice, PropertyValue, SignalPayload};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zbus::Connection;
use zbus::fdo::PropertiesProxy;
use zbus::zvariant::Value;

use crate::error::BluezResult;

const BLUEZ_SERVICE: &str = "org.bluez";

/// Forwards BlueZ property changes for one device.
pub struct SignalMonitor {
    object_path: String,
    event_tx: mpsc::Sender<SignalPayload>,
}

impl SignalMonitor {
    /// Create a monitor for the given device.
    #[must_use]
    pub fn new(device: &BluetoothDevice, event_tx: mpsc::Sender<SignalPayload>) -> Self {
        Self { object_path: device.object_path(), event_tx }
    }

    /// Subscribe on the system bus and forward signals until the receiver is
    /// dropped or the bus closes the stream.
    ///
    /// # Errors
    /// Returns an error if the bus connection or subscription fails.
    pub async fn run(self) -> BluezResult<()> {
        let connection = Connection::system().await?;
        let proxy = PropertiesProxy::builder(&connection)
            .destination(BLUEZ_SERVICE)?
            .path(self.object_path.as_str())?
            .build()
            .await?;
        let mut changes = proxy.receive_properties_changed().await?;

        info!(path = %self.object_path, "Subscribed to device property changes");

        while let Some(signal) = changes.next().await {
            let args = match signal.args() {
                Ok(args) => args,
                Err(e) => {
                    warn!(error = %e, "Dropping undecodable PropertiesChanged signal");
                    continue;
                }
            };

            let payload = decode(args.interface_name().as_str(), args.changed_properties());
            debug!(
                interface = %payload.interface,
                keys = payload.changed.len(),
                "Property change received"
            );

            if self.event_tx.send(payload).await.is_err() {
                debug!("Signal receiver dropped, stopping monitor");
                return Ok(());
            }
        }

        info!(path = %self.object_path, "Property change stream ended");
        Ok(())
    }
}

/// Decode a bus property map into a payload.
#[must_use]
pub fn decode(interface: &str, changed: &HashMap<&str, Value<'_>>) -> SignalPayload {
    SignalPayload::new(
        interface,
        changed.iter().map(|(name, value)| {
            let value = match value {
                Value::Bool(b) => PropertyValue::Bool(*b),
                other => PropertyValue::Other(other.to_string()),
            };
            (*name, value)
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use maxime_core::{ConnectivityEvent, DEVICE_INTERFACE, classify};

    #[test]
    fn test_decode_bool_properties() {
        let changed = HashMap::from([
            ("Connected", Value::Bool(true)),
            ("ServicesResolved", Value::Bool(false)),
        ]);

        let payload = decode(DEVICE_INTERFACE, &changed);

        assert_eq!(payload.interface, DEVICE_INTERFACE);
        assert_eq!(payload.changed.get("Connected"), Some(&PropertyValue::Bool(true)));
        assert_eq!(classify(&payload), ConnectivityEvent::Connected(true));
    }

    #[test]
    fn test_decode_non_bool_properties() {
        let changed = HashMap::from([("RSSI", Value::I16(-60)), ("Connected", Value::from("yes"))]);

        let payload = decode(DEVICE_INTERFACE, &changed);

        assert!(matches!(payload.changed.get("RSSI"), Some(PropertyValue::Other(_))));
        assert!(matches!(
            payload.changed.get("Connected"),
            Some(PropertyValue::Other(v)) if v.contains("yes")
        ));
    }

    #[test]
    fn test_monitor_targets_device_path() {
        let device = BluetoothDevice::new("00:1b:66:aa:bb:cc", "hci0", "Bose QC35");
        let (tx, _rx) = mpsc::channel(4);

        let monitor = SignalMonitor::new(&device, tx);

        assert_eq!(monitor.object_path, "/org/bluez/hci0/dev_00_1B_66_AA_BB_CC");
    }
}
