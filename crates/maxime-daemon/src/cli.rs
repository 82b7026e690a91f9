//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use maxime_core::{ModeRequest, RouteTarget};

/// Command-line arguments for maxime
#[derive(Parser, Debug)]
#[command(name = "maxime")]
#[command(about = "Bluetooth/PulseAudio routing manager")]
#[command(version)]
#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    /// Path to the configuration file (defaults to ~/.config/maxime/config.toml)
    #[arg(short, long, value_name = "PATH", env = "MAXIME_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Append logs to this file instead of standard output
    #[arg(short, long, value_name = "PATH")]
    pub logfile: Option<PathBuf>,

    /// Send audio to a target (wireless, headset, speakers) and exit
    #[arg(long, value_name = "TARGET")]
    pub route: Option<RouteTarget>,

    /// Connect the wireless device and exit
    #[arg(long)]
    pub connect: bool,

    /// Disconnect the wireless device and exit
    #[arg(long)]
    pub disconnect: bool,

    /// Switch between wireless and speakers and exit
    #[arg(long)]
    pub toggle: bool,

    /// Cycle the wireless card profile to clear stale buffering and exit
    #[arg(long)]
    pub resync: bool,

    /// Disconnect and reconnect the wireless device and exit
    #[arg(long)]
    pub reconnect: bool,

    /// Print the output currently playing the managed stream and exit
    #[arg(long)]
    pub status: bool,

    /// Listen for connectivity events but do not act on them
    #[arg(long)]
    pub listen: bool,
}

impl Args {
    /// The mode flags of this invocation.
    #[must_use]
    pub fn mode_request(&self) -> ModeRequest {
        ModeRequest {
            route: self.route,
            connect: self.connect,
            disconnect: self.disconnect,
            toggle: self.toggle,
            resync: self.resync,
            reconnect: self.reconnect,
            status: self.status,
            listen: self.listen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use maxime_core::{Flag, Mode};

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_no_flags_runs_daemon() {
        let args = Args::try_parse_from(["maxime"]).unwrap();

        assert_eq!(args.mode_request().resolve(), Ok(Mode::Daemon));
        assert!(!args.debug);
        assert!(args.logfile.is_none());
    }

    #[test]
    fn test_route_target_is_parsed() {
        let args = Args::try_parse_from(["maxime", "--route", "Headset", "-d"]).unwrap();

        assert_eq!(args.route, Some(RouteTarget::Headset));
        assert!(args.debug);
        assert_eq!(args.mode_request().resolve(), Ok(Mode::Route(RouteTarget::Headset)));
    }

    #[test]
    fn test_unknown_route_target_is_rejected() {
        assert!(Args::try_parse_from(["maxime", "--route", "bathroom"]).is_err());
    }

    #[test]
    fn test_conflicting_flags_parse_but_do_not_resolve() {
        let args = Args::try_parse_from(["maxime", "--route", "headset", "--toggle"]).unwrap();

        let err = args.mode_request().resolve().unwrap_err();
        assert!(err.involves(Flag::Route) && err.involves(Flag::Toggle));
    }

    #[test]
    fn test_paths() {
        let args = Args::try_parse_from([
            "maxime",
            "-c",
            "/tmp/maxime.toml",
            "--logfile",
            "/tmp/maxime.log",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("/tmp/maxime.toml")));
        assert_eq!(args.logfile, Some(PathBuf::from("/tmp/maxime.log")));
    }
}
