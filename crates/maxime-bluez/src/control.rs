//! Device control through `bluetoothctl`.
//!
//! `bluetoothctl` can hang for a long time when the adapter is busy, so every
//! invocation runs under a deadline and the child is killed once it passes.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use maxime_core::BluetoothControl;
use tracing::{debug, warn};

use crate::error::{BluezError, BluezResult};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// `bluetoothctl` wrapper.
#[derive(Debug, Clone)]
pub struct BluetoothCtl {
    program: String,
    timeout: Duration,
}

impl BluetoothCtl {
    /// Create a wrapper around `bluetoothctl` with the given per-command timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("bluetoothctl", timeout)
    }

    /// Create a wrapper around a specific executable.
    #[must_use]
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self { program: program.into(), timeout }
    }

    fn run(&self, args: &[&str]) -> BluezResult<String> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!(command = %command, "Running control tool");

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| BluezError::Spawn { program: self.program.clone(), source })?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let exited = child
                .try_wait()
                .map_err(|source| BluezError::Spawn { program: self.program.clone(), source })?;
            if exited.is_some() {
                break;
            }
            if Instant::now() >= deadline {
                kill(&mut child);
                warn!(command = %command, timeout = ?self.timeout, "Control tool timed out");
                return Err(BluezError::Timeout { command, timeout: self.timeout });
            }
            thread::sleep(POLL_INTERVAL);
        }

        let mut stdout = String::new();
        if let Some(mut pipe) = child.stdout.take() {
            pipe.read_to_string(&mut stdout)
                .map_err(|source| BluezError::Spawn { program: self.program.clone(), source })?;
        }
        Ok(stdout)
    }
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!(error = %e, "Failed to kill control tool");
    }
    // Reap so the child does not linger as a zombie
    let _ = child.wait();
}

/// Read the `Connected:` line of `bluetoothctl info`.
fn parse_connected(output: &str) -> Option<bool> {
    output.lines().find_map(|line| {
        let value = line.split_once("Connected:")?.1.trim();
        match value {
            "yes" => Some(true),
            "no" => Some(false),
            _ => None,
        }
    })
}

fn confirms(output: &str, confirmation: &str) -> bool {
    output.lines().any(|line| line.contains(confirmation))
}

impl BluetoothControl for BluetoothCtl {
    fn connection_state(&self, address: &str) -> maxime_core::Result<bool> {
        let output = self.run(&["info", address])?;
        let connected = parse_connected(&output).ok_or_else(|| BluezError::UnexpectedOutput {
            command: format!("info {address}"),
            output: output.trim().to_string(),
        })?;
        debug!(address = %address, connected, "Queried connection state");
        Ok(connected)
    }

    fn connect(&self, address: &str) -> maxime_core::Result<bool> {
        let output = self.run(&["connect", address])?;
        Ok(confirms(&output, "Connection successful"))
    }

    fn disconnect(&self, address: &str) -> maxime_core::Result<bool> {
        let output = self.run(&["disconnect", address])?;
        Ok(confirms(&output, "Successful disconnected"))
    }
}
