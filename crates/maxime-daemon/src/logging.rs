//! Logging setup.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use crate::config::LogFormat;

/// Install the global subscriber.
///
/// `level` is the default directive; `RUST_LOG` directives are layered on
/// top. With a log file, output is appended there without ANSI colors.
///
/// # Errors
/// Returns an error if the directive is invalid, the log file cannot be
/// opened, or a subscriber is already installed.
pub fn init(level: &str, format: LogFormat, logfile: Option<&Path>) -> Result<()> {
    let directive: Directive =
        level.parse().with_context(|| format!("Invalid log level: {level}"))?;
    let filter = EnvFilter::builder().with_default_directive(directive).from_env_lossy();

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match logfile {
        None => match format {
            LogFormat::Text => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        },
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {path:?}"))?;
            let builder = builder.with_ansi(false).with_writer(Mutex::new(file));
            match format {
                LogFormat::Text => builder.try_init(),
                LogFormat::Json => builder.json().try_init(),
            }
        }
    };

    result.map_err(|e| anyhow!(e))
}
