//! Route targets and the paired wireless device.

use std::fmt;
use std::str::FromStr;

use crate::endpoint::Descriptor;

/// BlueZ interface carrying device properties.
pub const DEVICE_INTERFACE: &str = "org.bluez.Device1";

/// One of the configured destinations audio can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteTarget {
    /// The paired Bluetooth device
    Wireless,
    /// A wired headset (output plus microphone)
    Headset,
    /// Static speaker output
    Speakers,
}

impl RouteTarget {
    /// Lowercase name as used on the command line and in configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wireless => "wireless",
            Self::Headset => "headset",
            Self::Speakers => "speakers",
        }
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wireless" => Ok(Self::Wireless),
            "headset" => Ok(Self::Headset),
            "speakers" => Ok(Self::Speakers),
            other => Err(format!(
                "unknown route target '{other}' (expected speakers, headset, or wireless)"
            )),
        }
    }
}

/// Endpoints a target resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEndpoints {
    /// Output sink
    pub output: Descriptor,
    /// Input source made default on activation (headset only)
    pub input: Option<Descriptor>,
}

/// Endpoint descriptors for every route target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMap {
    pub speakers: TargetEndpoints,
    pub headset: TargetEndpoints,
    pub wireless: TargetEndpoints,
}

impl TargetMap {
    /// Build the map from configured descriptions.
    ///
    /// Speakers and headset are matched exactly. The wireless sink is matched
    /// by prefix since the backend appends a changing suffix to it.
    #[must_use]
    pub fn new(speakers: &str, headset_output: &str, headset_input: &str, wireless: &str) -> Self {
        Self {
            speakers: TargetEndpoints { output: Descriptor::exact(speakers), input: None },
            headset: TargetEndpoints {
                output: Descriptor::exact(headset_output),
                input: Some(Descriptor::exact(headset_input)),
            },
            wireless: TargetEndpoints { output: Descriptor::prefix(wireless), input: None },
        }
    }

    /// Endpoints for a target.
    #[must_use]
    pub fn get(&self, target: RouteTarget) -> &TargetEndpoints {
        match target {
            RouteTarget::Wireless => &self.wireless,
            RouteTarget::Headset => &self.headset,
            RouteTarget::Speakers => &self.speakers,
        }
    }
}

/// The paired wireless audio device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BluetoothDevice {
    /// Hardware address (`AA:BB:CC:DD:EE:FF`)
    pub address: String,
    /// Adapter identifier (e.g. `hci0`)
    pub adapter: String,
    /// Description of the wireless output this device materializes as
    pub output: String,
}

impl BluetoothDevice {
    /// Create a device, normalizing the address to uppercase.
    #[must_use]
    pub fn new(address: &str, adapter: &str, output: &str) -> Self {
        Self {
            address: address.to_ascii_uppercase(),
            adapter: adapter.to_string(),
            output: output.to_string(),
        }
    }

    /// Address with colons replaced by underscores, as used in BlueZ paths
    /// and audio backend names.
    #[must_use]
    pub fn address_token(&self) -> String {
        self.address.replace(':', "_")
    }

    /// D-Bus object path of the device.
    #[must_use]
    pub fn object_path(&self) -> String {
        format!("/org/bluez/{}/dev_{}", self.adapter, self.address_token())
    }

    /// Fragment identifying the device's card in the audio backend.
    #[must_use]
    pub fn card_fragment(&self) -> String {
        format!("bluez_card.{}", self.address_token())
    }
}

/// Check that an address has the `AA:BB:CC:DD:EE:FF` shape.
#[must_use]
pub fn is_valid_address(address: &str) -> bool {
    let octets: Vec<_> = address.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::MatchPolicy;

    #[test]
    fn test_route_target_parse() {
        assert_eq!("speakers".parse::<RouteTarget>(), Ok(RouteTarget::Speakers));
        assert_eq!("Headset".parse::<RouteTarget>(), Ok(RouteTarget::Headset));
        assert_eq!("wireless".parse::<RouteTarget>(), Ok(RouteTarget::Wireless));
        assert!("hdmi".parse::<RouteTarget>().is_err());
    }

    #[test]
    fn test_target_map_policies() {
        let map = TargetMap::new("Speakers", "Headset Out", "Headset Mic", "Bose QC35");

        assert_eq!(map.get(RouteTarget::Speakers).output.policy, MatchPolicy::Exact);
        assert_eq!(map.get(RouteTarget::Wireless).output.policy, MatchPolicy::Prefix);
        assert!(map.get(RouteTarget::Speakers).input.is_none());
        assert_eq!(
            map.get(RouteTarget::Headset).input.as_ref().map(|d| d.text.as_str()),
            Some("Headset Mic")
        );
    }

    #[test]
    fn test_device_paths() {
        let device = BluetoothDevice::new("00:1b:66:aa:bb:cc", "hci0", "Bose QC35");

        assert_eq!(device.address, "00:1B:66:AA:BB:CC");
        assert_eq!(device.object_path(), "/org/bluez/hci0/dev_00_1B_66_AA_BB_CC");
        assert_eq!(device.card_fragment(), "bluez_card.00_1B_66_AA_BB_CC");
    }

    #[test]
    fn test_address_validation() {
        assert!(is_valid_address("00:1B:66:AA:BB:CC"));
        assert!(is_valid_address("e4:17:d8:27:2d:f0"));
        assert!(!is_valid_address("00:1B:66:AA:BB"));
        assert!(!is_valid_address("00-1B-66-AA-BB-CC"));
        assert!(!is_valid_address("00:1B:66:AA:BB:ZZ"));
    }
}
