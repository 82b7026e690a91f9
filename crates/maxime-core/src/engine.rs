//! Routing engine.
//!
//! Moves the managed stream between the configured targets. Every public
//! operation returns a `Result`; a terminal failure is also reported to the
//! user exactly once through the notifier.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::backend::{AudioBackend, Icon, Notifier, Sleeper, ThreadSleeper};
use crate::endpoint::{Endpoint, Stream};
use crate::error::{Error, Result};
use crate::resolver::{DeviceResolver, Lookup, RetryPolicy};
use crate::target::{BluetoothDevice, RouteTarget, TargetMap};

/// Card profiles cycled by a resync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardProfiles {
    /// High quality playback profile
    pub a2dp: String,
    /// Headset (microphone) profile
    pub hands_free: String,
}

impl Default for CardProfiles {
    fn default() -> Self {
        Self { a2dp: "a2dp_sink".to_string(), hands_free: "headset_head_unit".to_string() }
    }
}

/// Everything the engine needs to know about the local setup.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Media name of the managed stream
    pub stream_name: String,
    /// Endpoint descriptors per target
    pub targets: TargetMap,
    /// The paired wireless device
    pub device: BluetoothDevice,
    /// Profiles used by resync
    pub profiles: CardProfiles,
    /// Retry schedule for the wireless sink after a connection
    pub retry: RetryPolicy,
    /// Pause between the two profile switches of a resync
    pub settle_delay: Duration,
    /// Prefix stripped from status output
    pub label_prefix: Option<String>,
    /// How long notifications stay on screen
    pub notify_ttl: Duration,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub target: RouteTarget,
    pub endpoint: Endpoint,
}

/// Mute handling around a move triggered by a connectivity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MuteGuard {
    None,
    MuteBefore,
    UnmuteAfter,
}

impl MuteGuard {
    fn for_transition(target: RouteTarget, is_connection_event: bool) -> Self {
        match (target, is_connection_event) {
            (RouteTarget::Speakers, true) => Self::MuteBefore,
            (RouteTarget::Wireless, true) => Self::UnmuteAfter,
            _ => Self::None,
        }
    }
}

/// Routes the managed stream.
pub struct RoutingEngine<B, N, S = ThreadSleeper> {
    backend: B,
    notifier: N,
    sleeper: S,
    settings: EngineSettings,
    stream: Stream,
}

impl<B: AudioBackend, N: Notifier> RoutingEngine<B, N, ThreadSleeper> {
    /// Create an engine that sleeps the calling thread while waiting.
    ///
    /// # Errors
    /// Returns [`Error::StreamNotFound`] if the managed stream does not exist.
    pub fn new(backend: B, notifier: N, settings: EngineSettings) -> Result<Self> {
        Self::with_sleeper(backend, notifier, ThreadSleeper, settings)
    }
}

impl<B: AudioBackend, N: Notifier, S: Sleeper> RoutingEngine<B, N, S> {
    /// Create an engine with a custom sleeper.
    ///
    /// The managed stream is resolved once here; a missing stream is fatal.
    ///
    /// # Errors
    /// Returns [`Error::StreamNotFound`] if the managed stream does not exist,
    /// or [`Error::Backend`] if streams cannot be listed.
    pub fn with_sleeper(
        backend: B,
        notifier: N,
        sleeper: S,
        settings: EngineSettings,
    ) -> Result<Self> {
        let resolver =
            DeviceResolver::new(&backend, &notifier, &sleeper, settings.retry, settings.notify_ttl);
        let stream = resolver.resolve_stream(&settings.stream_name)?;
        info!(
            stream = %stream.name,
            index = stream.index,
            sink = stream.sink,
            "Managed stream found"
        );

        Ok(Self { backend, notifier, sleeper, settings, stream })
    }

    /// Move the managed stream to a target.
    ///
    /// On a connection event the wireless sink is awaited, the stream is muted
    /// before moving to speakers and unmuted after moving to wireless.
    ///
    /// # Errors
    /// Returns the lookup or backend error that stopped the move.
    pub fn activate(&self, target: RouteTarget, is_connection_event: bool) -> Result<Routed> {
        let lookup = if target == RouteTarget::Wireless && is_connection_event {
            Lookup::AwaitConnection
        } else {
            Lookup::Immediate
        };
        let guard = MuteGuard::for_transition(target, is_connection_event);

        let result = self.try_activate(target, lookup, guard);
        self.report(&format!("route audio to {target}"), result)
    }

    /// React to a connectivity transition of the wireless device.
    ///
    /// # Errors
    /// See [`Self::activate`].
    pub fn manage_connection(&self, connected: bool) -> Result<Routed> {
        let target = if connected { RouteTarget::Wireless } else { RouteTarget::Speakers };
        info!(connected, target = %target, "Handling connectivity change");
        self.activate(target, true)
    }

    /// Route to a target on explicit request. Never mutes.
    ///
    /// # Errors
    /// See [`Self::activate`].
    pub fn route(&self, target: RouteTarget) -> Result<Routed> {
        self.activate(target, false)
    }

    /// Switch between wireless and speakers.
    ///
    /// # Errors
    /// Returns the lookup or backend error that stopped the move.
    pub fn toggle(&self) -> Result<Routed> {
        let result = self.try_toggle();
        self.report("toggle audio output", result)
    }

    /// Cycle the wireless card through its hands-free profile and back to
    /// A2DP, then route to wireless once the recreated sink shows up.
    /// Never mutes.
    ///
    /// # Errors
    /// Returns [`Error::CardNotFound`] if the wireless card is absent, or the
    /// error of the failing profile switch or move.
    pub fn resync(&self) -> Result<Routed> {
        let result = self.try_resync();
        self.report("resync wireless audio", result)
    }

    /// Describe the endpoint currently hosting the managed stream.
    ///
    /// # Errors
    /// Returns [`Error::StreamNotFound`] if the stream is gone or
    /// [`Error::EndpointNotFound`] if its sink is not listed.
    pub fn status(&self) -> Result<String> {
        let result = self.try_status();
        self.report("read audio status", result)
    }

    fn resolver(&self) -> DeviceResolver<'_> {
        DeviceResolver::new(
            &self.backend,
            &self.notifier,
            &self.sleeper,
            self.settings.retry,
            self.settings.notify_ttl,
        )
    }

    fn notify(&self, text: &str, icon: Icon) {
        self.notifier.notify(text, icon, self.settings.notify_ttl);
    }

    fn report<T>(&self, action: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            error!(action, error = %e, "Routing operation failed");
            self.notify(&format!("Unable to {action}: {e}"), Icon::Error);
        }
        result
    }

    fn set_mute(&self, muted: bool) {
        if let Err(e) = self.backend.set_stream_mute(self.stream.index, muted) {
            warn!(muted, error = %e, "Failed to change stream mute state");
        }
    }

    fn try_activate(
        &self,
        target: RouteTarget,
        lookup: Lookup,
        guard: MuteGuard,
    ) -> Result<Routed> {
        let endpoints = self.settings.targets.get(target);

        let resolver = self.resolver();
        let output = resolver.resolve_output(&endpoints.output, lookup)?;
        let input = endpoints.input.as_ref().map(|d| resolver.resolve_input(d)).transpose()?;

        if guard == MuteGuard::MuteBefore {
            self.set_mute(true);
        }

        debug!(stream = self.stream.index, sink = output.index, "Moving stream");
        self.backend.move_stream(self.stream.index, output.index)?;

        if guard == MuteGuard::UnmuteAfter {
            self.set_mute(false);
        }

        if let Some(source) = input {
            self.backend.set_default_source(&source.name)?;
            debug!(source = %source.name, "Default source set");
        }

        info!(target = %target, endpoint = %output.description, "Routed managed stream");
        self.notify(&format!("Routed {} to {}", self.stream.name, output.description), Icon::Audio);

        Ok(Routed { target, endpoint: output })
    }

    fn try_toggle(&self) -> Result<Routed> {
        let resolver = self.resolver();
        let stream = resolver.resolve_stream(&self.stream.name)?;

        let wireless = &self.settings.targets.wireless.output;
        let on_wireless = match resolver.resolve_output(wireless, Lookup::Immediate) {
            Ok(wireless) => wireless.index == stream.sink,
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e),
        };

        let target = if on_wireless { RouteTarget::Speakers } else { RouteTarget::Wireless };
        debug!(on_wireless, target = %target, "Toggling output");
        self.try_activate(target, Lookup::Immediate, MuteGuard::None)
    }

    fn try_resync(&self) -> Result<Routed> {
        let profiles = &self.settings.profiles;
        let card = self.resolver().resolve_card(&self.settings.device.card_fragment())?;

        for profile in [&profiles.hands_free, &profiles.a2dp] {
            if !card.has_profile(profile) {
                warn!(card = %card.name, profile = %profile, "Card does not advertise profile");
            }
        }

        self.notify(&format!("Resyncing {}...", self.settings.device.output), Icon::Bluetooth);
        info!(card = %card.name, "Resyncing wireless card");

        self.backend.set_card_profile(card.index, &profiles.hands_free)?;
        self.sleeper.sleep(self.settings.settle_delay);
        self.backend.set_card_profile(card.index, &profiles.a2dp)?;

        // The profile switch recreates the sink
        self.try_activate(RouteTarget::Wireless, Lookup::AwaitConnection, MuteGuard::None)
    }

    fn try_status(&self) -> Result<String> {
        let stream = self.resolver().resolve_stream(&self.stream.name)?;
        let sink = self
            .backend
            .list_sinks()?
            .into_iter()
            .find(|s| s.index == stream.sink)
            .ok_or_else(|| Error::EndpointNotFound(format!("sink #{}", stream.sink)))?;

        let label = strip_label(&sink.description, self.settings.label_prefix.as_deref());
        self.notify(&label, Icon::Audio);
        Ok(label)
    }
}

fn strip_label(description: &str, prefix: Option<&str>) -> String {
    prefix
        .filter(|p| !p.is_empty())
        .and_then(|p| description.strip_prefix(p))
        .unwrap_or(description)
        .trim()
        .to_string()
}
