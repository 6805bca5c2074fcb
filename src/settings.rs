//! # Settings Encoding
//!
//! Serializes the key-value settings map for transmission. Devices running
//! the legacy firmware app decode settings with short keys to fit the map
//! into their tiny receive buffer, so a static alias table rewrites the
//! long-form keys before serialization when the target app id matches.
//! Unmapped keys pass through unchanged; any other app id gets the map
//! verbatim.

use crate::wire::{WireError, WireValue};
use serde_json::{Map, Value};

/// App identifier of the legacy firmware generation that expects
/// short-alias setting keys.
pub const LEGACY_APP_ID: &str = "com.wristmap.classic";

/// Long-form key → short alias, frozen with the legacy firmware decoder.
/// Append-only: renaming an entry would orphan settings already stored on
/// deployed devices.
const ALIAS_TABLE: &[(&str, &str)] = &[
    ("colourPalette", "cp"),
    ("tileEncoding", "te"),
    ("tileServerUrl", "ts"),
    ("routeColour", "rc"),
    ("routeWidth", "rw"),
    ("showDirections", "sd"),
    ("backlightTimeout", "bt"),
    ("unitsMetric", "um"),
];

fn alias_for<'t>(key: &str, table: &'t [(&str, &str)]) -> Option<&'t str> {
    // Table is tiny; a linear scan beats building a map per call.
    table
        .iter()
        .find(|(long, _)| *long == key)
        .map(|(_, short)| *short)
}

/// Rewrite map keys through `table`, preserving entry order.
fn rewrite_keys(settings: &Map<String, Value>, table: &[(&str, &str)]) -> Map<String, Value> {
    let mut rewritten = Map::with_capacity(settings.len());
    for (key, value) in settings {
        match alias_for(key, table) {
            Some(short) => rewritten.insert(short.to_string(), value.clone()),
            None => rewritten.insert(key.clone(), value.clone()),
        };
    }
    rewritten
}

/// Apply legacy alias rewriting if `app_id` names the legacy app.
pub fn apply_aliases(settings: &Map<String, Value>, app_id: &str) -> Map<String, Value> {
    if app_id == LEGACY_APP_ID {
        rewrite_keys(settings, ALIAS_TABLE)
    } else {
        settings.clone()
    }
}

/// Build the save-settings payload: one wire map, aliased when needed.
///
/// Fails with [`WireError::UnsupportedValueKind`] if any setting value has
/// no wire representation (null, bool, 64-bit integer); the failure happens
/// here, before a send is attempted.
pub fn payload(settings: &Map<String, Value>, app_id: &str) -> Result<Vec<WireValue>, WireError> {
    let aliased = apply_aliases(settings, app_id);
    Ok(vec![WireValue::from_json(&Value::Object(aliased))?])
}
