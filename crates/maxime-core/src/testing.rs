//! Scripted collaborators for tests.
//!
//! Also available to dependent crates through the `testing` feature.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::backend::{AudioBackend, Icon, Notifier, Sleeper};
use crate::endpoint::{Card, Endpoint, Stream};
use crate::error::{Error, Result};

pub const STREAM: &str = "LADSPA Stream";
pub const STREAM_INDEX: u32 = 42;
pub const SPEAKERS: &str = "Built-in Audio Analog Stereo";
pub const SPEAKERS_INDEX: u32 = 1;
pub const HEADSET_OUT: &str = "USB Headset Analog Stereo";
pub const HEADSET_OUT_INDEX: u32 = 2;
pub const HEADSET_IN: &str = "USB Headset Mono";
pub const HEADSET_IN_NAME: &str = "alsa_input.usb-headset.mono-fallback";
pub const WIRELESS: &str = "Bose QC35";
pub const WIRELESS_INDEX: u32 = 9;
pub const ADDRESS: &str = "00:1B:66:AA:BB:CC";
pub const CARD_INDEX: u32 = 7;

/// Side effects observed by the fakes, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Move { stream: u32, sink: u32 },
    Mute { stream: u32, muted: bool },
    DefaultSource(String),
    CardProfile { card: u32, profile: String },
    Sleep(Duration),
    Notify { text: String, icon: Icon },
}

/// Shared, ordered log of side effects.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Call>>>);

impl Journal {
    fn record(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Notify { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn mutes(&self) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Mute { muted, .. } => Some(muted),
                _ => None,
            })
            .collect()
    }

    pub fn moves(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Move { sink, .. } => Some(sink),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct FakeState {
    sinks: Vec<Endpoint>,
    /// Sinks that only show up after the given number of listings
    pending: Vec<(Endpoint, u32)>,
    sources: Vec<Endpoint>,
    streams: Vec<Stream>,
    cards: Vec<Card>,
    sink_listings: u32,
    fail_listings: bool,
}

/// In-memory audio server.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Rc<RefCell<FakeState>>,
    journal: Journal,
}

fn endpoint(index: u32, name: &str, description: &str) -> Endpoint {
    Endpoint { index, name: name.into(), description: description.into() }
}

impl FakeBackend {
    /// Speakers, a wired headset, the managed stream on speakers, and the
    /// Bluetooth card. The wireless sink is absent.
    pub fn desktop(journal: &Journal) -> Self {
        let backend = Self { state: Rc::default(), journal: journal.clone() };
        {
            let mut state = backend.state.borrow_mut();
            state.sinks = vec![
                endpoint(SPEAKERS_INDEX, "alsa_output.pci-0000_00_1f.3.analog-stereo", SPEAKERS),
                endpoint(HEADSET_OUT_INDEX, "alsa_output.usb-headset.analog-stereo", HEADSET_OUT),
            ];
            state.sources = vec![
                endpoint(
                    4,
                    "alsa_output.pci-0000_00_1f.3.analog-stereo.monitor",
                    "Monitor of Built-in Audio",
                ),
                endpoint(5, HEADSET_IN_NAME, HEADSET_IN),
            ];
            state.streams = vec![Stream {
                index: STREAM_INDEX,
                name: STREAM.into(),
                sink: SPEAKERS_INDEX,
            }];
            state.cards = vec![
                Card {
                    index: 0,
                    name: "alsa_card.pci-0000_00_1f.3".into(),
                    profiles: vec!["output:analog-stereo".into(), "off".into()],
                },
                Card {
                    index: CARD_INDEX,
                    name: "bluez_card.00_1B_66_AA_BB_CC".into(),
                    profiles: vec!["a2dp_sink".into(), "headset_head_unit".into(), "off".into()],
                },
            ];
        }
        backend
    }

    /// Add the wireless sink, hidden for the first `misses` sink listings.
    pub fn with_wireless(self, misses: u32) -> Self {
        self.state.borrow_mut().pending.push((
            endpoint(WIRELESS_INDEX, "bluez_sink.00_1B_66_AA_BB_CC.a2dp_sink", WIRELESS),
            misses,
        ));
        self
    }

    /// Drop the managed stream.
    pub fn without_stream(self) -> Self {
        self.state.borrow_mut().streams.clear();
        self
    }

    /// Make every listing fail.
    pub fn failing(self) -> Self {
        self.state.borrow_mut().fail_listings = true;
        self
    }

    /// Place the managed stream on a sink without journaling it.
    pub fn place_stream(&self, sink: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(stream) = state.streams.iter_mut().find(|s| s.index == STREAM_INDEX) {
            stream.sink = sink;
        }
    }

    pub fn stream_sink(&self) -> Option<u32> {
        self.state.borrow().streams.iter().find(|s| s.index == STREAM_INDEX).map(|s| s.sink)
    }

    pub fn sink_listings(&self) -> u32 {
        self.state.borrow().sink_listings
    }

    fn check(&self) -> Result<()> {
        if self.state.borrow().fail_listings {
            return Err(Error::Backend("connection refused".into()));
        }
        Ok(())
    }
}

impl AudioBackend for FakeBackend {
    fn list_sinks(&self) -> Result<Vec<Endpoint>> {
        self.state.borrow_mut().sink_listings += 1;
        self.check()?;

        let mut state = self.state.borrow_mut();
        let mut sinks = state.sinks.clone();
        for (sink, misses) in &mut state.pending {
            if *misses == 0 {
                sinks.push(sink.clone());
            } else {
                *misses -= 1;
            }
        }
        Ok(sinks)
    }

    fn list_sources(&self) -> Result<Vec<Endpoint>> {
        self.check()?;
        Ok(self.state.borrow().sources.clone())
    }

    fn list_sink_inputs(&self) -> Result<Vec<Stream>> {
        self.check()?;
        Ok(self.state.borrow().streams.clone())
    }

    fn list_cards(&self) -> Result<Vec<Card>> {
        self.check()?;
        Ok(self.state.borrow().cards.clone())
    }

    fn move_stream(&self, stream: u32, sink: u32) -> Result<()> {
        self.journal.record(Call::Move { stream, sink });
        if let Some(s) = self.state.borrow_mut().streams.iter_mut().find(|s| s.index == stream) {
            s.sink = sink;
        }
        Ok(())
    }

    fn set_stream_mute(&self, stream: u32, muted: bool) -> Result<()> {
        self.journal.record(Call::Mute { stream, muted });
        Ok(())
    }

    fn set_default_source(&self, name: &str) -> Result<()> {
        self.journal.record(Call::DefaultSource(name.into()));
        Ok(())
    }

    fn set_card_profile(&self, card: u32, profile: &str) -> Result<()> {
        self.journal.record(Call::CardProfile { card, profile: profile.into() });
        Ok(())
    }
}

/// Notifier that journals every message.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier(pub Journal);

impl Notifier for RecordingNotifier {
    fn notify(&self, text: &str, icon: Icon, _ttl: Duration) {
        self.0.record(Call::Notify { text: text.into(), icon });
    }
}

/// Sleeper that journals instead of sleeping.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper(pub Journal);

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.0.record(Call::Sleep(duration));
    }
}
