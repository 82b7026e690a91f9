//! Endpoint resolution.
//!
//! The audio server creates the Bluetooth sink a few seconds after BlueZ
//! reports the device as connected, so an immediate lookup right after a
//! connection almost always misses. Connection-triggered lookups therefore
//! retry on a fixed interval up to a bounded number of attempts, telling the
//! user once that the device is on its way.

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::backend::{AudioBackend, Icon, Notifier, Sleeper};
use crate::endpoint::{Card, Descriptor, Endpoint, Stream};
use crate::error::{Error, Result};

/// Retry schedule for connection-triggered lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait between attempts
    pub interval: Duration,
    /// Total number of attempts, including the first
    pub attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { interval: Duration::from_secs(1), attempts: 30 }
    }
}

/// How hard to look for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// One scan; a miss is an error
    Immediate,
    /// The endpoint is expected to appear shortly; retry per [`RetryPolicy`]
    AwaitConnection,
}

/// Maps configured descriptors to live backend objects.
pub struct DeviceResolver<'a> {
    backend: &'a dyn AudioBackend,
    notifier: &'a dyn Notifier,
    sleeper: &'a dyn Sleeper,
    retry: RetryPolicy,
    notify_ttl: Duration,
}

impl<'a> DeviceResolver<'a> {
    /// Create a resolver over the given collaborators.
    #[must_use]
    pub fn new(
        backend: &'a dyn AudioBackend,
        notifier: &'a dyn Notifier,
        sleeper: &'a dyn Sleeper,
        retry: RetryPolicy,
        notify_ttl: Duration,
    ) -> Self {
        Self { backend, notifier, sleeper, retry, notify_ttl }
    }

    /// Find an output endpoint.
    ///
    /// # Errors
    /// Returns [`Error::EndpointNotFound`] if nothing matches (after the retry
    /// ceiling for [`Lookup::AwaitConnection`]), or [`Error::Backend`] if an
    /// immediate listing fails.
    pub fn resolve_output(&self, descriptor: &Descriptor, lookup: Lookup) -> Result<Endpoint> {
        match lookup {
            Lookup::Immediate => find(self.backend.list_sinks()?, descriptor)
                .ok_or_else(|| Error::EndpointNotFound(descriptor.text.clone())),
            Lookup::AwaitConnection => self.await_output(descriptor),
        }
    }

    fn await_output(&self, descriptor: &Descriptor) -> Result<Endpoint> {
        let attempts = self.retry.attempts.max(1);

        for attempt in 1..=attempts {
            match self.backend.list_sinks() {
                Ok(sinks) => {
                    if let Some(endpoint) = find(sinks, descriptor) {
                        debug!(
                            attempt,
                            endpoint = %endpoint.description,
                            "Output endpoint appeared"
                        );
                        return Ok(endpoint);
                    }
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Listing sinks failed while waiting for endpoint");
                }
            }

            if attempt == 1 {
                self.notifier.notify(
                    &format!("Connecting to {descriptor}..."),
                    Icon::Bluetooth,
                    self.notify_ttl,
                );
            }

            if attempt < attempts {
                debug!(
                    attempt,
                    attempts,
                    descriptor = %descriptor,
                    "Output endpoint not present yet, retrying"
                );
                self.sleeper.sleep(self.retry.interval);
            }
        }

        error!(descriptor = %descriptor, attempts, "Output endpoint never appeared");
        Err(Error::EndpointNotFound(descriptor.text.clone()))
    }

    /// Find an input endpoint. Inputs are not expected to race, so there is no retry.
    ///
    /// # Errors
    /// Returns [`Error::EndpointNotFound`] if nothing matches.
    pub fn resolve_input(&self, descriptor: &Descriptor) -> Result<Endpoint> {
        find(self.backend.list_sources()?, descriptor)
            .ok_or_else(|| Error::EndpointNotFound(descriptor.text.clone()))
    }

    /// Find a playback stream by exact media name.
    ///
    /// # Errors
    /// Returns [`Error::StreamNotFound`] if no stream carries the name.
    pub fn resolve_stream(&self, name: &str) -> Result<Stream> {
        self.backend
            .list_sink_inputs()?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::StreamNotFound(name.to_string()))
    }

    /// Find a card whose name contains `fragment`.
    ///
    /// # Errors
    /// Returns [`Error::CardNotFound`] if no card matches.
    pub fn resolve_card(&self, fragment: &str) -> Result<Card> {
        self.backend
            .list_cards()?
            .into_iter()
            .find(|c| c.name.contains(fragment))
            .ok_or_else(|| Error::CardNotFound(fragment.to_string()))
    }
}

fn find(endpoints: Vec<Endpoint>, descriptor: &Descriptor) -> Option<Endpoint> {
    endpoints.into_iter().find(|e| descriptor.matches(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockAudioBackend, MockNotifier};
    use crate::testing::{
        Call, FakeBackend, HEADSET_IN, HEADSET_IN_NAME, Journal, RecordingNotifier,
        RecordingSleeper, SPEAKERS, SPEAKERS_INDEX, STREAM, STREAM_INDEX, WIRELESS, WIRELESS_INDEX,
    };
    use assert_matches::assert_matches;

    const TTL: Duration = Duration::from_secs(5);

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy { interval: Duration::from_millis(250), attempts }
    }

    #[test]
    fn test_immediate_lookup_finds_exact_match() {
        let journal = Journal::default();
        let backend = FakeBackend::desktop(&journal);
        let notifier = RecordingNotifier(journal.clone());
        let sleeper = RecordingSleeper(journal.clone());
        let resolver = DeviceResolver::new(&backend, &notifier, &sleeper, policy(3), TTL);

        let speakers =
            resolver.resolve_output(&Descriptor::exact(SPEAKERS), Lookup::Immediate).unwrap();

        assert_eq!(speakers.index, SPEAKERS_INDEX);
        assert!(journal.calls().is_empty());
    }

    #[test]
    fn test_immediate_lookup_does_not_retry() {
        let journal = Journal::default();
        let backend = FakeBackend::desktop(&journal).with_wireless(1);
        let notifier = RecordingNotifier(journal.clone());
        let sleeper = RecordingSleeper(journal.clone());
        let resolver = DeviceResolver::new(&backend, &notifier, &sleeper, policy(3), TTL);

        let result = resolver.resolve_output(&Descriptor::prefix(WIRELESS), Lookup::Immediate);

        assert_matches!(result, Err(Error::EndpointNotFound(d)) if d == WIRELESS);
        assert_eq!(backend.sink_listings(), 1);
        assert!(journal.calls().is_empty());
    }

    #[test]
    fn test_awaited_lookup_notifies_once_across_retries() {
        let journal = Journal::default();
        let backend = FakeBackend::desktop(&journal).with_wireless(4);
        let sleeper = RecordingSleeper(journal.clone());
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|text, icon, _| {
                text.starts_with("Connecting to Bose QC35") && *icon == Icon::Bluetooth
            })
            .times(1)
            .return_const(());
        let resolver = DeviceResolver::new(&backend, &notifier, &sleeper, policy(10), TTL);

        let endpoint = resolver
            .resolve_output(&Descriptor::prefix(WIRELESS), Lookup::AwaitConnection)
            .unwrap();

        assert_eq!(endpoint.index, WIRELESS_INDEX);
        assert_eq!(backend.sink_listings(), 5);
        assert_eq!(journal.calls(), vec![Call::Sleep(Duration::from_millis(250)); 4]);
    }

    #[test]
    fn test_awaited_lookup_found_first_time_is_silent() {
        let journal = Journal::default();
        let backend = FakeBackend::desktop(&journal).with_wireless(0);
        let notifier = RecordingNotifier(journal.clone());
        let sleeper = RecordingSleeper(journal.clone());
        let resolver = DeviceResolver::new(&backend, &notifier, &sleeper, policy(10), TTL);

        let endpoint = resolver
            .resolve_output(&Descriptor::prefix(WIRELESS), Lookup::AwaitConnection)
            .unwrap();

        assert_eq!(endpoint.description, WIRELESS);
        assert!(journal.calls().is_empty());
    }

    #[test]
    fn test_awaited_lookup_gives_up_at_ceiling() {
        let journal = Journal::default();
        let backend = FakeBackend::desktop(&journal);
        let notifier = RecordingNotifier(journal.clone());
        let sleeper = RecordingSleeper(journal.clone());
        let resolver = DeviceResolver::new(&backend, &notifier, &sleeper, policy(3), TTL);

        let result =
            resolver.resolve_output(&Descriptor::prefix(WIRELESS), Lookup::AwaitConnection);

        assert_matches!(result, Err(Error::EndpointNotFound(_)));
        assert_eq!(backend.sink_listings(), 3);
        assert_eq!(journal.notifications().len(), 1);
        let sleeps = journal.calls().iter().filter(|c| matches!(c, Call::Sleep(_))).count();
        assert_eq!(sleeps, 2);
    }

    #[test]
    fn test_awaited_lookup_treats_listing_errors_as_misses() {
        let journal = Journal::default();
        let backend = FakeBackend::desktop(&journal).failing();
        let notifier = RecordingNotifier(journal.clone());
        let sleeper = RecordingSleeper(journal.clone());
        let resolver = DeviceResolver::new(&backend, &notifier, &sleeper, policy(2), TTL);

        let result =
            resolver.resolve_output(&Descriptor::prefix(WIRELESS), Lookup::AwaitConnection);

        assert_matches!(result, Err(Error::EndpointNotFound(_)));
        assert_eq!(backend.sink_listings(), 2);
    }

    #[test]
    fn test_resolve_input_and_stream() {
        let journal = Journal::default();
        let backend = FakeBackend::desktop(&journal);
        let notifier = RecordingNotifier(journal.clone());
        let sleeper = RecordingSleeper(journal.clone());
        let resolver = DeviceResolver::new(&backend, &notifier, &sleeper, policy(3), TTL);

        let input = resolver.resolve_input(&Descriptor::exact(HEADSET_IN)).unwrap();
        assert_eq!(input.name, HEADSET_IN_NAME);
        assert_matches!(
            resolver.resolve_input(&Descriptor::exact("Webcam Mic")),
            Err(Error::EndpointNotFound(_))
        );

        let stream = resolver.resolve_stream(STREAM).unwrap();
        assert_eq!(stream.index, STREAM_INDEX);
        assert_matches!(resolver.resolve_stream("ladspa stream"), Err(Error::StreamNotFound(_)));
    }

    #[test]
    fn test_resolve_card_by_substring() {
        let mut backend = MockAudioBackend::new();
        backend.expect_list_cards().times(2).returning(|| {
            Ok(vec![Card {
                index: 7,
                name: "bluez_card.00_1B_66_AA_BB_CC".into(),
                profiles: vec![],
            }])
        });
        let notifier = RecordingNotifier::default();
        let sleeper = RecordingSleeper::default();
        let resolver = DeviceResolver::new(&backend, &notifier, &sleeper, policy(3), TTL);

        assert_eq!(resolver.resolve_card("00_1B_66_AA_BB_CC").unwrap().index, 7);
        assert_matches!(resolver.resolve_card("bluez_card.11_22"), Err(Error::CardNotFound(_)));
    }
}
