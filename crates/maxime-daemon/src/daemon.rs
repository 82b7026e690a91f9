//! Long-running modes.
//!
//! Connectivity signals arrive on a single channel and are handled one at a
//! time, in delivery order. Shutdown is only observed between signals.

use anyhow::{Context, Result, bail};
use maxime_bluez::SignalMonitor;
use maxime_core::{
    AudioBackend, BluetoothDevice, ConnectivityEvent, Notifier, RoutingEngine, SignalPayload,
    Sleeper, classify,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::signals;

/// Bound on signals queued while a transition is being handled.
const SIGNAL_QUEUE: usize = 32;

/// Why the event loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// SIGINT or SIGTERM
    Shutdown,
    /// The signal subscription went away
    SubscriptionClosed,
}

/// Watch the device and, with an engine, reroute on every transition.
///
/// Without an engine (listen mode) transitions are only logged.
///
/// # Errors
/// Returns an error if signal handlers cannot be installed or the
/// subscription fails or ends.
pub async fn watch<B, N, S>(
    device: &BluetoothDevice,
    engine: Option<&RoutingEngine<B, N, S>>,
) -> Result<()>
where
    B: AudioBackend,
    N: Notifier,
    S: Sleeper,
{
    let shutdown_rx = signals::setup_signal_handlers()?;
    let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_QUEUE);
    let monitor = tokio::spawn(SignalMonitor::new(device, signal_tx).run());

    info!(
        address = %device.address,
        path = %device.object_path(),
        "Watching device. Press Ctrl+C to exit."
    );

    let exit = match engine {
        Some(engine) => {
            run_event_loop(signal_rx, shutdown_rx, |connected| {
                tokio::task::block_in_place(|| reroute(engine, connected));
            })
            .await
        }
        None => {
            run_event_loop(signal_rx, shutdown_rx, |connected| {
                info!(connected, "Connectivity changed; listen mode, not rerouting");
            })
            .await
        }
    };

    match exit {
        LoopExit::Shutdown => {
            monitor.abort();
            info!("Maxime stopped");
            Ok(())
        }
        LoopExit::SubscriptionClosed => {
            monitor
                .await
                .context("Signal monitor task failed")?
                .context("Connectivity signal subscription failed")?;
            bail!("Connectivity signal subscription ended")
        }
    }
}

/// Move the managed stream after a transition.
fn reroute<B, N, S>(engine: &RoutingEngine<B, N, S>, connected: bool)
where
    B: AudioBackend,
    N: Notifier,
    S: Sleeper,
{
    // Failures are already logged and notified by the engine
    let _ = engine.manage_connection(connected);
}

/// Drain signals until shutdown or until the subscription closes.
pub async fn run_event_loop<F>(
    mut signal_rx: mpsc::Receiver<SignalPayload>,
    mut shutdown_rx: mpsc::Receiver<()>,
    mut on_transition: F,
) -> LoopExit
where
    F: FnMut(bool),
{
    loop {
        tokio::select! {
            payload = signal_rx.recv() => {
                let Some(payload) = payload else {
                    warn!("Signal subscription closed");
                    return LoopExit::SubscriptionClosed;
                };
                match classify(&payload) {
                    ConnectivityEvent::Connected(connected) => {
                        info!(connected, "Device connectivity changed");
                        on_transition(connected);
                    }
                    ConnectivityEvent::Ignored(reason) if reason.is_unexpected() => {
                        error!(
                            ?reason,
                            interface = %payload.interface,
                            "Unrecognized device signal"
                        );
                    }
                    ConnectivityEvent::Ignored(reason) => {
                        debug!(?reason, "Ignoring device signal");
                    }
                }
            }

            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received");
                return LoopExit::Shutdown;
            }
        }
    }
}
