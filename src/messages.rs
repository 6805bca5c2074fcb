//! # Device Message Registry
//!
//! One enum variant per outbound wire message, each rendering to
//! `[u8 tag, ...payload]` through the wire encoder. Tags are stable and
//! append-only — tag 1 was retired long before this codebase and is never
//! reused.
//!
//! Inbound traffic is a short list too: `[tag, ...payload]` with only two
//! live tags. Unknown inbound tags decode soft — logged and swallowed —
//! because a firmware newer than the phone app must not crash the receive
//! loop.

use crate::colour::ColourPalette;
use crate::route;
use crate::settings;
use crate::wire::{self, WireError, WireValue};
use crate::Route;
use serde_json::{Map, Value};
use tracing::warn;

/// Outbound message type tags. Append-only; these values are baked into
/// every deployed firmware build.
pub mod tag {
    pub const ROUTE: u8 = 0;
    pub const REQUEST_LOCATION_LOAD: u8 = 2;
    pub const RETURN_TO_USER: u8 = 3;
    pub const REQUEST_SETTINGS: u8 = 4;
    pub const SAVE_SETTINGS: u8 = 5;
    pub const TILE_SERVER_CHANGED: u8 = 6;
    pub const ROUTE_V2: u8 = 7;
    pub const CACHE_CURRENT_AREA: u8 = 8;
    pub const ROUTE_V3: u8 = 9;
}

/// Every message the phone can send to the device.
///
/// A closed union instead of an open trait: the set of wire messages only
/// changes with a firmware release, and the encoder stays generic over the
/// variants without any subclassing.
#[derive(Clone, Debug)]
pub enum DeviceMessage {
    /// Legacy raw lat/lon route (tag 0)
    Route(Route),
    /// Projected planar route (tag 7)
    RouteV2(Route),
    /// Projected planar route with elevation (tag 9)
    RouteV3(Route),
    /// Ask the device to load map data around a location (tag 2)
    RequestLocationLoad { lat: f32, lon: f32, radius_m: i32 },
    /// Point the device back toward the user's position (tag 3)
    ReturnToUser,
    /// Ask the device to report its settings (tag 4)
    RequestSettings,
    /// Push a settings map, alias-rewritten for the legacy app (tag 5)
    SaveSettings {
        settings: Map<String, Value>,
        app_id: String,
    },
    /// Announce a tile-source change and the palette now in effect (tag 6)
    TileServerChanged {
        min_zoom: u8,
        max_zoom: u8,
        palette: ColourPalette,
    },
    /// Ask the device to cache tiles for the current area (tag 8)
    CacheCurrentArea,
}

impl DeviceMessage {
    /// The wire tag this message is prefixed with.
    pub fn tag(&self) -> u8 {
        match self {
            DeviceMessage::Route(_) => tag::ROUTE,
            DeviceMessage::RouteV2(_) => tag::ROUTE_V2,
            DeviceMessage::RouteV3(_) => tag::ROUTE_V3,
            DeviceMessage::RequestLocationLoad { .. } => tag::REQUEST_LOCATION_LOAD,
            DeviceMessage::ReturnToUser => tag::RETURN_TO_USER,
            DeviceMessage::RequestSettings => tag::REQUEST_SETTINGS,
            DeviceMessage::SaveSettings { .. } => tag::SAVE_SETTINGS,
            DeviceMessage::TileServerChanged { .. } => tag::TILE_SERVER_CHANGED,
            DeviceMessage::CacheCurrentArea => tag::CACHE_CURRENT_AREA,
        }
    }

    /// Encode to the transport value list: `[tag, ...payload]`.
    ///
    /// The only fallible variant is [`DeviceMessage::SaveSettings`], whose
    /// map may hold values with no wire representation; the error surfaces
    /// here so nothing malformed is ever handed to the transport.
    pub fn encode(&self) -> Result<Vec<Value>, WireError> {
        let payload = match self {
            DeviceMessage::Route(route) => route::payload_v1(route),
            DeviceMessage::RouteV2(route) => route::payload_v2(route),
            DeviceMessage::RouteV3(route) => route::payload_v3(route),
            DeviceMessage::RequestLocationLoad { lat, lon, radius_m } => vec![
                WireValue::F32(*lat),
                WireValue::F32(*lon),
                WireValue::I32(*radius_m),
            ],
            DeviceMessage::ReturnToUser => vec![],
            DeviceMessage::RequestSettings => vec![],
            DeviceMessage::SaveSettings { settings, app_id } => {
                settings::payload(settings, app_id)?
            }
            DeviceMessage::TileServerChanged {
                min_zoom,
                max_zoom,
                palette,
            } => {
                let colours = palette
                    .colours
                    .iter()
                    .map(|c| WireValue::I32(c.packed_rgb() as i32))
                    .collect();
                vec![
                    WireValue::U8(*min_zoom),
                    WireValue::U8(*max_zoom),
                    WireValue::List(vec![
                        WireValue::U8(palette.id as u8),
                        WireValue::List(colours),
                    ]),
                ]
            }
            DeviceMessage::CacheCurrentArea => vec![],
        };
        Ok(wire::encode_message(self.tag(), &payload))
    }
}

/// Inbound response tags.
const RESPONSE_OPEN_APP: i64 = 0;
const RESPONSE_SETTINGS: i64 = 1;

/// A decoded device-to-phone message.
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceResponse {
    /// The user opened the map app on the device (empty payload)
    OpenApp,
    /// The device reported its settings map
    Settings(Map<String, Value>),
}

/// Decode an inbound `[tag, ...payload]` list.
///
/// Fails soft: anything unrecognized — missing tag, unknown tag, wrong
/// payload shape — logs a warning and yields `None`. The receive loop
/// never sees an error from here.
pub fn decode_response(values: &[Value]) -> Option<DeviceResponse> {
    let Some(tag) = values.first().and_then(Value::as_i64) else {
        warn!("inbound message without a numeric tag, ignoring");
        return None;
    };
    match tag {
        RESPONSE_OPEN_APP => Some(DeviceResponse::OpenApp),
        RESPONSE_SETTINGS => match values.get(1).and_then(Value::as_object) {
            Some(map) => Some(DeviceResponse::Settings(map.clone())),
            None => {
                warn!("settings response without a map payload, ignoring");
                None
            }
        },
        other => {
            warn!(tag = other, "unknown inbound message tag, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;
    use serde_json::json;

    #[test]
    fn every_message_leads_with_its_tag() {
        let mut route = Route::new("r");
        route.points.push(Point::new(1.0, 2.0, 3.0));
        let settings = json!({"a": 1}).as_object().unwrap().clone();

        let cases: Vec<(DeviceMessage, u8)> = vec![
            (DeviceMessage::Route(route.clone()), 0),
            (
                DeviceMessage::RequestLocationLoad {
                    lat: 1.0,
                    lon: 2.0,
                    radius_m: 500,
                },
                2,
            ),
            (DeviceMessage::ReturnToUser, 3),
            (DeviceMessage::RequestSettings, 4),
            (
                DeviceMessage::SaveSettings {
                    settings,
                    app_id: "other".into(),
                },
                5,
            ),
            (
                DeviceMessage::TileServerChanged {
                    min_zoom: 6,
                    max_zoom: 16,
                    palette: ColourPalette::black_white(),
                },
                6,
            ),
            (DeviceMessage::RouteV2(route.clone()), 7),
            (DeviceMessage::CacheCurrentArea, 8),
            (DeviceMessage::RouteV3(route), 9),
        ];
        for (message, expected_tag) in cases {
            let encoded = message.encode().expect("encodable");
            assert_eq!(
                encoded[0],
                json!(expected_tag),
                "wrong tag for {message:?}"
            );
        }
    }

    #[test]
    fn empty_payload_messages_are_tag_only() {
        let encoded = DeviceMessage::ReturnToUser.encode().unwrap();
        assert_eq!(encoded, vec![json!(3)]);
    }

    #[test]
    fn tile_server_changed_carries_palette_colours() {
        let encoded = DeviceMessage::TileServerChanged {
            min_zoom: 6,
            max_zoom: 16,
            palette: ColourPalette::black_white(),
        }
        .encode()
        .unwrap();
        assert_eq!(encoded[1], json!(6));
        assert_eq!(encoded[2], json!(16));
        // [paletteId, [black, white]] with 24-bit packed colours.
        assert_eq!(encoded[3], json!([0, [0, 0xFFFFFF]]));
    }

    #[test]
    fn inbound_open_app_decodes() {
        assert_eq!(
            decode_response(&[json!(0)]),
            Some(DeviceResponse::OpenApp)
        );
    }

    #[test]
    fn inbound_settings_decodes_map_payload() {
        let decoded = decode_response(&[json!(1), json!({"um": 1})]);
        let DeviceResponse::Settings(map) = decoded.expect("settings decode") else {
            panic!("expected settings variant");
        };
        assert_eq!(map["um"], json!(1));
    }

    #[test]
    fn unknown_inbound_tags_fail_soft() {
        assert_eq!(decode_response(&[json!(42)]), None);
        assert_eq!(decode_response(&[]), None);
        assert_eq!(decode_response(&[json!("not a tag")]), None);
        // Settings with a malformed payload is also swallowed.
        assert_eq!(decode_response(&[json!(1), json!(5)]), None);
    }
}
