//! One-shot commands.
//!
//! Every mode other than `Listen` and `Daemon` runs a single command and
//! exits. Routing commands go through the [`RoutingEngine`]; device commands
//! talk to the Bluetooth control tool directly.

use std::time::Duration;

use tracing::{error, info};

use crate::backend::{AudioBackend, BluetoothControl, Icon, Notifier, Sleeper};
use crate::engine::RoutingEngine;
use crate::error::{Error, Result};
use crate::mode::Mode;
use crate::target::{BluetoothDevice, RouteTarget};

/// A one-shot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Needs the routing engine
    Routing(RoutingCommand),
    /// Needs only the Bluetooth control tool
    Device(DeviceCommand),
}

impl Command {
    /// The command a mode runs, or `None` for long-running modes.
    #[must_use]
    pub fn for_mode(mode: Mode) -> Option<Self> {
        match mode {
            Mode::Route(target) => Some(Self::Routing(RoutingCommand::Route(target))),
            Mode::Toggle => Some(Self::Routing(RoutingCommand::Toggle)),
            Mode::Resync => Some(Self::Routing(RoutingCommand::Resync)),
            Mode::Status => Some(Self::Routing(RoutingCommand::Status)),
            Mode::Connect => Some(Self::Device(DeviceCommand::Connect)),
            Mode::Disconnect => Some(Self::Device(DeviceCommand::Disconnect)),
            Mode::Reconnect => Some(Self::Device(DeviceCommand::Reconnect)),
            Mode::Listen | Mode::Daemon => None,
        }
    }
}

/// Commands executed by the routing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingCommand {
    Route(RouteTarget),
    Toggle,
    Resync,
    Status,
}

impl RoutingCommand {
    /// Run the command. Returns the status line for [`RoutingCommand::Status`].
    ///
    /// # Errors
    /// Returns the engine error; the engine has already notified the user.
    pub fn execute<B, N, S>(self, engine: &RoutingEngine<B, N, S>) -> Result<Option<String>>
    where
        B: AudioBackend,
        N: Notifier,
        S: Sleeper,
    {
        match self {
            Self::Route(target) => engine.route(target).map(|_| None),
            Self::Toggle => engine.toggle().map(|_| None),
            Self::Resync => engine.resync().map(|_| None),
            Self::Status => engine.status().map(Some),
        }
    }
}

/// Commands executed against the Bluetooth control tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Connect,
    Disconnect,
    Reconnect,
}

impl DeviceCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns [`Error::ControlTool`] if the tool fails or does not confirm.
    pub fn execute(self, control: &DeviceControl<'_>) -> Result<()> {
        match self {
            Self::Connect => control.connect(),
            Self::Disconnect => control.disconnect(),
            Self::Reconnect => control.reconnect(),
        }
    }
}

/// Connects and disconnects the paired device.
pub struct DeviceControl<'a> {
    control: &'a dyn BluetoothControl,
    notifier: &'a dyn Notifier,
    sleeper: &'a dyn Sleeper,
    device: &'a BluetoothDevice,
    settle_delay: Duration,
    notify_ttl: Duration,
}

impl<'a> DeviceControl<'a> {
    #[must_use]
    pub fn new(
        control: &'a dyn BluetoothControl,
        notifier: &'a dyn Notifier,
        sleeper: &'a dyn Sleeper,
        device: &'a BluetoothDevice,
        settle_delay: Duration,
        notify_ttl: Duration,
    ) -> Self {
        Self { control, notifier, sleeper, device, settle_delay, notify_ttl }
    }

    /// Connect the device unless it already is.
    ///
    /// # Errors
    /// Returns [`Error::ControlTool`] if the connection is not confirmed.
    pub fn connect(&self) -> Result<()> {
        let result = self.try_connect();
        self.report("connect", result)
    }

    /// Disconnect the device unless it already is.
    ///
    /// # Errors
    /// Returns [`Error::ControlTool`] if the disconnection is not confirmed.
    pub fn disconnect(&self) -> Result<()> {
        let result = self.try_disconnect();
        self.report("disconnect", result)
    }

    /// Disconnect (if connected), wait for the device to settle, then connect.
    ///
    /// # Errors
    /// Returns [`Error::ControlTool`] if either step is not confirmed.
    pub fn reconnect(&self) -> Result<()> {
        let result = self.try_disconnect().and_then(|()| {
            self.sleeper.sleep(self.settle_delay);
            self.try_connect()
        });
        self.report("reconnect", result)
    }

    fn try_connect(&self) -> Result<()> {
        let address = &self.device.address;
        if self.control.connection_state(address)? {
            info!(address = %address, "Device already connected");
            return Ok(());
        }

        self.notifier.notify(
            &format!("Connecting to {}...", self.device.output),
            Icon::Bluetooth,
            self.notify_ttl,
        );
        if !self.control.connect(address)? {
            return Err(Error::ControlTool(format!("connection to {address} was not confirmed")));
        }

        info!(address = %address, "Device connected");
        Ok(())
    }

    fn try_disconnect(&self) -> Result<()> {
        let address = &self.device.address;
        if !self.control.connection_state(address)? {
            info!(address = %address, "Device already disconnected");
            return Ok(());
        }

        if !self.control.disconnect(address)? {
            return Err(Error::ControlTool(format!("disconnection of {address} was not confirmed")));
        }

        info!(address = %address, "Device disconnected");
        Ok(())
    }

    fn report(&self, action: &str, result: Result<()>) -> Result<()> {
        if let Err(e) = &result {
            error!(action, address = %self.device.address, error = %e, "Device command failed");
            self.notifier.notify(
                &format!("Unable to {action} {}: {e}", self.device.output),
                Icon::Error,
                self.notify_ttl,
            );
        }
        result
    }
}
