//! Signal handling for graceful shutdown.

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::info;

/// Set up signal handlers for graceful shutdown.
///
/// Returns a receiver that will receive a message when a shutdown
/// signal (SIGTERM, SIGINT) is received. Must be called inside a runtime.
///
/// # Errors
/// Returns an error if a handler cannot be registered.
pub fn setup_signal_handlers() -> Result<mpsc::Receiver<()>> {
    let (tx, rx) = mpsc::channel(1);

    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
    let mut interrupt =
        signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = terminate.recv() => info!("Received SIGTERM"),
            _ = interrupt.recv() => info!("Received SIGINT"),
        }
        let _ = tx.send(()).await;
    });

    Ok(rx)
}
