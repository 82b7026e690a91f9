//! Desktop notifications.

use std::collections::HashMap;
use std::time::Duration;

use maxime_core::{Icon, Notifier};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use zbus::blocking::{Connection, Proxy};
use zbus::zvariant::Value;

use crate::config::NotificationsConfig;

const APP_NAME: &str = "Maxime";
const SERVICE: &str = "org.freedesktop.Notifications";
const PATH: &str = "/org/freedesktop/Notifications";
const INTERFACE: &str = "org.freedesktop.Notifications";

/// Build the notifier selected by configuration.
#[must_use]
pub fn from_config(config: &NotificationsConfig) -> Box<dyn Notifier + Send + Sync> {
    if config.enabled {
        Box::new(DesktopNotifier::new())
    } else {
        Box::new(LogNotifier)
    }
}

/// Sends notifications through the freedesktop notification service.
///
/// The session bus connection is opened on first use and dropped after a
/// failure so the next notification reconnects.
#[derive(Default)]
pub struct DesktopNotifier {
    connection: Mutex<Option<Connection>>,
}

impl DesktopNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn connection(&self) -> zbus::Result<Connection> {
        let mut guard = self.connection.lock();
        if let Some(connection) = guard.as_ref() {
            return Ok(connection.clone());
        }
        let connection = Connection::session()?;
        *guard = Some(connection.clone());
        Ok(connection)
    }

    fn send(&self, text: &str, icon: Icon, ttl: Duration) -> zbus::Result<u32> {
        let connection = self.connection()?;
        let proxy = Proxy::new(&connection, SERVICE, PATH, INTERFACE)?;

        let actions: Vec<&str> = Vec::new();
        let hints: HashMap<&str, Value<'_>> = HashMap::new();
        let expire_timeout = i32::try_from(ttl.as_millis()).unwrap_or(i32::MAX);

        proxy.call(
            "Notify",
            &(APP_NAME, 0u32, icon.name(), APP_NAME, text, actions, hints, expire_timeout),
        )
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, text: &str, icon: Icon, ttl: Duration) {
        match self.send(text, icon, ttl) {
            Ok(id) => debug!(id, text, "Notification sent"),
            Err(e) => {
                warn!(error = %e, text, "Failed to send notification");
                *self.connection.lock() = None;
            }
        }
    }
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, text: &str, icon: Icon, _ttl: Duration) {
        info!(icon = icon.name(), "{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_notifications_do_not_touch_the_bus() {
        let notifier = from_config(&NotificationsConfig { enabled: false, ttl_ms: 1000 });

        notifier.notify("Routed LADSPA Stream to Bose QC35", Icon::Audio, Duration::from_secs(1));
    }

    #[test]
    fn test_desktop_notifier_connects_lazily() {
        let notifier = DesktopNotifier::new();

        assert!(notifier.connection.lock().is_none());
    }
}
