//! Decoding of `pactl --format=json list ...` output.

use std::collections::{BTreeMap, HashMap};

use maxime_core::{Card, Endpoint, Stream};
use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::error::PulseResult;

const MEDIA_NAME: &str = "media.name";

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    index: u32,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawSinkInput {
    index: u32,
    sink: u32,
    #[serde(default)]
    properties: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawCard {
    index: u32,
    name: String,
    #[serde(default)]
    profiles: BTreeMap<String, IgnoredAny>,
}

/// Parse `list sinks` or `list sources`.
///
/// # Errors
/// Returns [`crate::PulseError::Parse`] on malformed output.
pub fn endpoints(json: &str) -> PulseResult<Vec<Endpoint>> {
    let raw: Vec<RawEndpoint> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|e| Endpoint { index: e.index, name: e.name, description: e.description })
        .collect())
}

/// Parse `list sink-inputs`. The stream name is its `media.name` property.
///
/// # Errors
/// Returns [`crate::PulseError::Parse`] on malformed output.
pub fn sink_inputs(json: &str) -> PulseResult<Vec<Stream>> {
    let raw: Vec<RawSinkInput> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|s| Stream {
            index: s.index,
            name: s
                .properties
                .get(MEDIA_NAME)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
            sink: s.sink,
        })
        .collect())
}

/// Parse `list cards`.
///
/// # Errors
/// Returns [`crate::PulseError::Parse`] on malformed output.
pub fn cards(json: &str) -> PulseResult<Vec<Card>> {
    let raw: Vec<RawCard> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|c| Card {
            index: c.index,
            name: c.name,
            profiles: c.profiles.into_keys().collect(),
        })
        .collect())
}
