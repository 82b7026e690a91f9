//! Maxime - Bluetooth-aware audio routing.
//!
//! Moves a managed playback stream to wireless headphones when they connect
//! and back to the speakers when they disconnect. One-shot flags route,
//! toggle, resync, or query the stream, or drive the headphones directly.

use anyhow::{Context, Result};
use clap::Parser;
use maxime_bluez::BluetoothCtl;
use maxime_core::{
    Command, DeviceCommand, DeviceControl, Mode, ModeRequest, Notifier, RoutingCommand,
    RoutingEngine, ThreadSleeper,
};
use maxime_pulse::PactlBackend;
use tracing::{error, info};

mod cli;
mod config;
mod daemon;
mod logging;
mod notify;
mod signals;

use cli::Args;
use config::Config;

type BoxedNotifier = Box<dyn Notifier + Send + Sync>;

fn main() -> Result<()> {
    let args = Args::parse();
    let (request, config) = load_invocation(&args)?;

    let level = if args.debug { "debug" } else { config.daemon.log_level.as_str() };
    logging::init(level, config.daemon.log_format, args.logfile.as_deref())?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Maxime");

    let mode = request.resolve().inspect_err(|e| error!(error = %e, "Invalid flags"))?;
    info!(mode = %mode, "Mode selected");

    let notifier = notify::from_config(&config.notifications);

    match Command::for_mode(mode) {
        Some(Command::Routing(command)) => run_routing(command, &config, notifier),
        Some(Command::Device(command)) => run_device(command, &config, notifier.as_ref()),
        None => run_watch(mode, &config, notifier),
    }
}

/// Check the flags, then read the configuration they run against.
fn load_invocation(args: &Args) -> Result<(ModeRequest, Config)> {
    let request = args.mode_request();
    request.check().context("Invalid command-line flags")?;

    let config = config::load_config(args.config.as_deref())?;
    Ok((request, config))
}

fn build_engine(
    config: &Config,
    notifier: BoxedNotifier,
) -> Result<RoutingEngine<PactlBackend, BoxedNotifier>> {
    RoutingEngine::new(PactlBackend::default(), notifier, config.engine_settings())
        .context("Failed to set up routing for the managed stream")
}

fn run_routing(command: RoutingCommand, config: &Config, notifier: BoxedNotifier) -> Result<()> {
    let engine = build_engine(config, notifier)?;

    if let Some(status) = command.execute(&engine)? {
        println!("{status}");
    }
    Ok(())
}

fn run_device(command: DeviceCommand, config: &Config, notifier: &dyn Notifier) -> Result<()> {
    let control = BluetoothCtl::new(config.control_timeout());
    let device = config.device();
    let controller = DeviceControl::new(
        &control,
        notifier,
        &ThreadSleeper,
        &device,
        config.settle_delay(),
        config.notify_ttl(),
    );

    command.execute(&controller)?;
    Ok(())
}

fn run_watch(mode: Mode, config: &Config, notifier: BoxedNotifier) -> Result<()> {
    let engine = if mode.needs_engine() { Some(build_engine(config, notifier)?) } else { None };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(daemon::watch(&config.device(), engine.as_ref()))
}
