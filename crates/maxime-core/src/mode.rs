//! Operating mode selection.
//!
//! Every invocation runs exactly one [`Mode`]. [`ModeRequest::resolve`] picks
//! it from the requested flags and rejects incompatible combinations before
//! any bus or backend connection is opened.

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::target::RouteTarget;

/// A requested flag, as named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Route,
    Connect,
    Disconnect,
    Toggle,
    Resync,
    Reconnect,
    Status,
    Listen,
}

impl Flag {
    /// Flag name without the leading dashes.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Toggle => "toggle",
            Self::Resync => "resync",
            Self::Reconnect => "reconnect",
            Self::Status => "status",
            Self::Listen => "listen",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}", self.as_str())
    }
}

/// Mutually exclusive flag pairs.
const EXCLUSIVE: &[(Flag, Flag)] = &[
    (Flag::Status, Flag::Route),
    (Flag::Status, Flag::Connect),
    (Flag::Status, Flag::Disconnect),
    (Flag::Status, Flag::Toggle),
    (Flag::Status, Flag::Resync),
    (Flag::Status, Flag::Reconnect),
    (Flag::Status, Flag::Listen),
    (Flag::Route, Flag::Toggle),
    (Flag::Route, Flag::Connect),
    (Flag::Route, Flag::Disconnect),
    (Flag::Route, Flag::Listen),
    (Flag::Route, Flag::Resync),
    (Flag::Route, Flag::Reconnect),
    (Flag::Connect, Flag::Disconnect),
    (Flag::Connect, Flag::Toggle),
    (Flag::Connect, Flag::Resync),
    (Flag::Connect, Flag::Reconnect),
    (Flag::Disconnect, Flag::Toggle),
    (Flag::Disconnect, Flag::Resync),
    (Flag::Disconnect, Flag::Reconnect),
    (Flag::Resync, Flag::Reconnect),
];

/// Two requested flags that cannot be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("You cannot specify both {first} and {second}")]
pub struct ConflictError {
    pub first: Flag,
    pub second: Flag,
}

impl ConflictError {
    /// Whether the conflict names the given flag.
    #[must_use]
    pub fn involves(&self, flag: Flag) -> bool {
        self.first == flag || self.second == flag
    }
}

/// The single mode an invocation runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Route the managed stream to a target and exit
    Route(RouteTarget),
    /// Connect the wireless device and exit
    Connect,
    /// Disconnect the wireless device and exit
    Disconnect,
    /// Switch between wireless and speakers and exit
    Toggle,
    /// Cycle the wireless card profile and exit
    Resync,
    /// Disconnect then connect the wireless device and exit
    Reconnect,
    /// Report the current output and exit
    Status,
    /// Watch connectivity signals without acting on them
    Listen,
    /// Watch connectivity signals and reroute on transitions
    Daemon,
}

impl Mode {
    /// Whether the mode drives the routing engine.
    #[must_use]
    pub fn needs_engine(&self) -> bool {
        matches!(self, Self::Route(_) | Self::Toggle | Self::Resync | Self::Status | Self::Daemon)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route(target) => write!(f, "route({target})"),
            Self::Connect => f.write_str("connect"),
            Self::Disconnect => f.write_str("disconnect"),
            Self::Toggle => f.write_str("toggle"),
            Self::Resync => f.write_str("resync"),
            Self::Reconnect => f.write_str("reconnect"),
            Self::Status => f.write_str("status"),
            Self::Listen => f.write_str("listen"),
            Self::Daemon => f.write_str("daemon"),
        }
    }
}

/// Flags requested for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ModeRequest {
    pub route: Option<RouteTarget>,
    pub connect: bool,
    pub disconnect: bool,
    pub toggle: bool,
    pub resync: bool,
    pub reconnect: bool,
    pub status: bool,
    pub listen: bool,
}

impl ModeRequest {
    fn is_set(&self, flag: Flag) -> bool {
        match flag {
            Flag::Route => self.route.is_some(),
            Flag::Connect => self.connect,
            Flag::Disconnect => self.disconnect,
            Flag::Toggle => self.toggle,
            Flag::Resync => self.resync,
            Flag::Reconnect => self.reconnect,
            Flag::Status => self.status,
            Flag::Listen => self.listen,
        }
    }

    /// Flags that were requested, in precedence order.
    fn requested(&self) -> Vec<Flag> {
        [
            Flag::Status,
            Flag::Route,
            Flag::Connect,
            Flag::Disconnect,
            Flag::Toggle,
            Flag::Resync,
            Flag::Reconnect,
            Flag::Listen,
        ]
        .into_iter()
        .filter(|flag| self.is_set(*flag))
        .collect()
    }

    /// Check the request against the exclusivity table.
    ///
    /// # Errors
    /// Returns a [`ConflictError`] naming the first incompatible pair.
    pub fn check(&self) -> Result<(), ConflictError> {
        match EXCLUSIVE.iter().find(|(a, b)| self.is_set(*a) && self.is_set(*b)) {
            Some(&(first, second)) => Err(ConflictError { first, second }),
            None => Ok(()),
        }
    }

    /// Select the mode for this request.
    ///
    /// # Errors
    /// Returns a [`ConflictError`] naming the first incompatible pair.
    pub fn resolve(&self) -> Result<Mode, ConflictError> {
        self.check()?;

        let requested = self.requested();
        let mode = match requested.first() {
            Some(Flag::Status) => Mode::Status,
            Some(Flag::Route) => Mode::Route(self.route.unwrap_or(RouteTarget::Speakers)),
            Some(Flag::Connect) => Mode::Connect,
            Some(Flag::Disconnect) => Mode::Disconnect,
            Some(Flag::Toggle) => Mode::Toggle,
            Some(Flag::Resync) => Mode::Resync,
            Some(Flag::Reconnect) => Mode::Reconnect,
            Some(Flag::Listen) => Mode::Listen,
            None => Mode::Daemon,
        };

        for ignored in requested.iter().skip(1) {
            warn!(
                flag = %ignored,
                mode = %mode,
                "Ignoring flag that does not apply to the selected mode"
            );
        }
        debug!(mode = %mode, "Mode resolved");

        Ok(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn set(request: &mut ModeRequest, flag: Flag) {
        match flag {
            Flag::Route => request.route = Some(RouteTarget::Headset),
            Flag::Connect => request.connect = true,
            Flag::Disconnect => request.disconnect = true,
            Flag::Toggle => request.toggle = true,
            Flag::Resync => request.resync = true,
            Flag::Reconnect => request.reconnect = true,
            Flag::Status => request.status = true,
            Flag::Listen => request.listen = true,
        }
    }

    #[test]
    fn test_no_flags_is_daemon() {
        assert_eq!(ModeRequest::default().resolve(), Ok(Mode::Daemon));
    }

    #[test]
    fn test_listen_alone_is_listen() {
        let request = ModeRequest { listen: true, ..Default::default() };
        assert_eq!(request.resolve(), Ok(Mode::Listen));
    }

    #[test]
    fn test_route_headset_with_toggle_conflicts() {
        let request =
            ModeRequest { route: Some(RouteTarget::Headset), toggle: true, ..Default::default() };

        let err = request.resolve().unwrap_err();
        assert!(err.involves(Flag::Route));
        assert!(err.involves(Flag::Toggle));
        assert_eq!(err.to_string(), "You cannot specify both --route and --toggle");
    }

    #[test]
    fn test_status_with_connect_conflicts() {
        let request = ModeRequest { status: true, connect: true, ..Default::default() };

        assert_matches!(
            request.resolve(),
            Err(e) if e.involves(Flag::Status) && e.involves(Flag::Connect)
        );
    }

    #[test]
    fn test_every_exclusive_pair_conflicts_in_both_orders() {
        for &(a, b) in EXCLUSIVE {
            for (first, second) in [(a, b), (b, a)] {
                let mut request = ModeRequest::default();
                set(&mut request, first);
                set(&mut request, second);

                let err = request.resolve().expect_err("pair should conflict");
                assert!(
                    err.involves(first) && err.involves(second),
                    "{first} + {second} reported as {err}"
                );
            }
        }
    }

    #[test]
    fn test_single_flags_select_their_mode() {
        let cases = [
            (
                ModeRequest { route: Some(RouteTarget::Speakers), ..Default::default() },
                Mode::Route(RouteTarget::Speakers),
            ),
            (ModeRequest { connect: true, ..Default::default() }, Mode::Connect),
            (ModeRequest { disconnect: true, ..Default::default() }, Mode::Disconnect),
            (ModeRequest { toggle: true, ..Default::default() }, Mode::Toggle),
            (ModeRequest { resync: true, ..Default::default() }, Mode::Resync),
            (ModeRequest { reconnect: true, ..Default::default() }, Mode::Reconnect),
            (ModeRequest { status: true, ..Default::default() }, Mode::Status),
        ];

        for (request, expected) in cases {
            assert_eq!(request.resolve(), Ok(expected));
        }
    }

    #[test]
    fn test_unlisted_combination_uses_precedence() {
        let request = ModeRequest { connect: true, listen: true, ..Default::default() };
        assert_eq!(request.resolve(), Ok(Mode::Connect));

        let request = ModeRequest { toggle: true, resync: true, ..Default::default() };
        assert_eq!(request.resolve(), Ok(Mode::Toggle));
    }

    #[test]
    fn test_check_agrees_with_resolve() {
        let request = ModeRequest { status: true, toggle: true, ..Default::default() };
        assert_eq!(
            request.check(),
            Err(ConflictError { first: Flag::Status, second: Flag::Toggle })
        );

        let request = ModeRequest { toggle: true, resync: true, ..Default::default() };
        assert_eq!(request.check(), Ok(()));
    }

    #[test]
    fn test_mode_classification() {
        assert!(Mode::Daemon.needs_engine());
        assert!(!Mode::Listen.needs_engine());
        assert!(!Mode::Reconnect.needs_engine());
        assert!(Mode::Route(RouteTarget::Wireless).needs_engine());
    }
}
