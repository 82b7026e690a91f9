//! Audio endpoints, streams, and cards as reported by the audio backend.

use std::fmt;

/// How a configured descriptor is compared against backend endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Description or name must equal the descriptor
    Exact,
    /// Description or name must start with the descriptor
    Prefix,
}

/// A configured endpoint description plus the policy used to find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Text to look for (usually the human-readable description)
    pub text: String,
    /// Matching policy
    pub policy: MatchPolicy,
}

impl Descriptor {
    /// Descriptor for a statically named endpoint.
    #[must_use]
    pub fn exact(text: impl Into<String>) -> Self {
        Self { text: text.into(), policy: MatchPolicy::Exact }
    }

    /// Descriptor for an endpoint whose name carries a changing suffix.
    #[must_use]
    pub fn prefix(text: impl Into<String>) -> Self {
        Self { text: text.into(), policy: MatchPolicy::Prefix }
    }

    /// Check whether an endpoint satisfies this descriptor.
    #[must_use]
    pub fn matches(&self, endpoint: &Endpoint) -> bool {
        match self.policy {
            MatchPolicy::Exact => endpoint.description == self.text || endpoint.name == self.text,
            MatchPolicy::Prefix => {
                endpoint.description.starts_with(&self.text)
                    || endpoint.name.starts_with(&self.text)
            }
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An audio sink or source.
///
/// Indices are reassigned by the backend whenever its device list churns, so
/// an `Endpoint` is only meaningful for the operation that fetched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Backend index
    pub index: u32,
    /// Stable backend name (e.g. `bluez_sink.00_1B_66_AA_BB_CC.a2dp_sink`)
    pub name: String,
    /// Human-readable description
    pub description: String,
}

/// A playback stream (sink input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    /// Backend index
    pub index: u32,
    /// Media name of the stream
    pub name: String,
    /// Index of the sink currently hosting the stream
    pub sink: u32,
}

/// A hardware card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Backend index
    pub index: u32,
    /// Card name (e.g. `bluez_card.00_1B_66_AA_BB_CC`)
    pub name: String,
    /// Profiles the card offers
    pub profiles: Vec<String>,
}

impl Card {
    /// Check whether the card offers a profile.
    #[must_use]
    pub fn has_profile(&self, profile: &str) -> bool {
        self.profiles.iter().any(|p| p == profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(name: &str, description: &str) -> Endpoint {
        Endpoint { index: 1, name: name.into(), description: description.into() }
    }

    #[test]
    fn test_exact_descriptor_matches_description_or_name() {
        let descriptor = Descriptor::exact("Built-in Audio Analog Stereo");

        assert!(descriptor.matches(&endpoint("alsa_output.pci", "Built-in Audio Analog Stereo")));
        assert!(
            !descriptor.matches(&endpoint("alsa_output.pci", "Built-in Audio Analog Stereo 2"))
        );

        let by_name = Descriptor::exact("alsa_output.pci");
        assert!(by_name.matches(&endpoint("alsa_output.pci", "Speakers")));
    }

    #[test]
    fn test_prefix_descriptor_tolerates_suffix() {
        let descriptor = Descriptor::prefix("Bose QC35");

        assert!(descriptor.matches(&endpoint("bluez_sink.00_1B", "Bose QC35 II")));
        assert!(descriptor.matches(&endpoint("bluez_sink.00_1B", "Bose QC35")));
        assert!(!descriptor.matches(&endpoint("bluez_sink.00_1B", "My Bose QC35")));
    }

    #[test]
    fn test_card_profiles() {
        let card = Card {
            index: 3,
            name: "bluez_card.00_1B_66_AA_BB_CC".into(),
            profiles: vec!["a2dp_sink".into(), "headset_head_unit".into(), "off".into()],
        };

        assert!(card.has_profile("headset_head_unit"));
        assert!(!card.has_profile("handsfree_head_unit"));
    }
}
