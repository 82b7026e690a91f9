//! `pactl` command wrapper.

use std::process::Command;

use maxime_core::{AudioBackend, Card, Endpoint, Stream};
use tracing::{debug, trace};

use crate::error::{PulseError, PulseResult};
use crate::parse;

/// Audio backend that shells out to `pactl`.
#[derive(Debug, Clone)]
pub struct PactlBackend {
    program: String,
}

impl Default for PactlBackend {
    fn default() -> Self {
        Self::new("pactl")
    }
}

impl PactlBackend {
    /// Create a backend that runs the given `pactl` executable.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    fn run(&self, args: &[&str]) -> PulseResult<String> {
        trace!(program = %self.program, ?args, "Running pactl");

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| PulseError::Spawn { program: self.program.clone(), source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PulseError::CommandFailed {
                command: args.join(" "),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn list(&self, kind: &str) -> PulseResult<String> {
        self.run(&["--format=json", "list", kind])
    }
}

impl AudioBackend for PactlBackend {
    fn list_sinks(&self) -> maxime_core::Result<Vec<Endpoint>> {
        Ok(parse::endpoints(&self.list("sinks")?)?)
    }

    fn list_sources(&self) -> maxime_core::Result<Vec<Endpoint>> {
        Ok(parse::endpoints(&self.list("sources")?)?)
    }

    fn list_sink_inputs(&self) -> maxime_core::Result<Vec<Stream>> {
        Ok(parse::sink_inputs(&self.list("sink-inputs")?)?)
    }

    fn list_cards(&self) -> maxime_core::Result<Vec<Card>> {
        Ok(parse::cards(&self.list("cards")?)?)
    }

    fn move_stream(&self, stream: u32, sink: u32) -> maxime_core::Result<()> {
        self.run(&["move-sink-input", &stream.to_string(), &sink.to_string()])?;
        debug!(stream, sink, "Sink input moved");
        Ok(())
    }

    fn set_stream_mute(&self, stream: u32, muted: bool) -> maxime_core::Result<()> {
        let state = if muted { "1" } else { "0" };
        self.run(&["set-sink-input-mute", &stream.to_string(), state])?;
        debug!(stream, muted, "Sink input mute set");
        Ok(())
    }

    fn set_default_source(&self, name: &str) -> maxime_core::Result<()> {
        self.run(&["set-default-source", name])?;
        debug!(source = %name, "Default source set");
        Ok(())
    }

    fn set_card_profile(&self, card: u32, profile: &str) -> maxime_core::Result<()> {
        self.run(&["set-card-profile", &card.to_string(), profile])?;
        debug!(card, profile = %profile, "Card profile set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_missing_program_is_a_spawn_error() {
        let backend = PactlBackend::new("/nonexistent/pactl");

        assert_matches!(
            backend.run(&["info"]),
            Err(PulseError::Spawn { program, .. }) if program == "/nonexistent/pactl"
        );
    }

    #[test]
    fn test_failures_surface_as_backend_errors() {
        let backend = PactlBackend::new("/nonexistent/pactl");

        assert_matches!(
            backend.list_sinks(),
            Err(maxime_core::Error::Backend(msg)) if msg.contains("/nonexistent/pactl")
        );
    }

    #[test]
    fn test_nonzero_exit_is_command_failure() {
        // `false` ignores its arguments and exits 1 without output
        let backend = PactlBackend::new("false");

        assert_matches!(
            backend.run(&["move-sink-input", "1", "2"]),
            Err(PulseError::CommandFailed { command, .. }) if command == "move-sink-input 1 2"
        );
    }
}
