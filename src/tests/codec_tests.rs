//! # End-to-End Codec Tests
//!
//! These tests exercise whole encode paths the way the companion app uses
//! them — geometry in, transport values out — rather than individual
//! modules. They are the closest thing to a firmware-compatibility suite
//! that can run without a device on the desk.

use serde_json::json;
use wristmap_lib::colour::{Colour, ColourPalette};
use wristmap_lib::messages::{DeviceMessage, DeviceResponse};
use wristmap_lib::packer;
use wristmap_lib::route::MAX_WIRE_POINTS;
use wristmap_lib::tile::{encode_tile, TileEncoding};
use wristmap_lib::{Point, Route};

/// A long route must reach the wire with at most the device point cap,
/// thinned by stride sampling rather than cropped.
#[test]
fn oversized_route_encodes_within_the_device_cap() {
    let mut route = Route::new("alps traverse");
    route.points = (0..3000)
        .map(|i| Point::new(46.0 + i as f32 * 1e-5, 9.0, 1500.0))
        .collect();

    let encoded = DeviceMessage::RouteV3(route).encode().expect("encodable");

    // [tag, name, count, ...triples, dirCount]
    assert_eq!(encoded[0], json!(9));
    assert_eq!(encoded[1], json!("alps traverse"));
    let count = encoded[2].as_i64().expect("point count") as usize;
    assert!(
        count <= MAX_WIRE_POINTS,
        "encoded {count} points, cap is {MAX_WIRE_POINTS}"
    );
    assert!(count > 0, "thinning must not empty a valid route");
    // Three floats per point, then the direction count terminator.
    assert_eq!(encoded.len(), 3 + count * 3 + 1);
}

/// The v1 legacy route round-trips raw coordinates through the wire
/// values without projection.
#[test]
fn legacy_route_carries_raw_coordinates() {
    let mut route = Route::new("short walk");
    route.points = vec![Point::new(-27.297514, 152.753860, 12.0)];

    let encoded = DeviceMessage::Route(route).encode().expect("encodable");
    assert_eq!(encoded[0], json!(0));
    let lat = encoded[3].as_f64().expect("lat") as f32;
    assert!((lat - (-27.297514)).abs() < 1e-4, "raw latitude on the wire");
}

/// A near-white pixel through the black/white tile path produces the
/// canonical 0x41 single-character payload.
#[test]
fn near_white_pixel_tile_is_the_canonical_0x41() {
    let palette = ColourPalette::black_white();
    let (tag, data) = encode_tile(
        &[Colour::new(240, 240, 240)],
        TileEncoding::BlackWhite,
        &palette,
    );
    assert_eq!(tag, 0);
    assert_eq!(data.as_bytes(), &[0x41]);
}

/// Every encoding of a full 64×64 tile stays within the transport's
/// printable-byte constraint (the full-colour mode via base64).
#[test]
fn encoded_tiles_never_contain_forbidden_bytes() {
    let palette = ColourPalette::device64();
    let pixels: Vec<Colour> = (0..64 * 64)
        .map(|i| Colour::new((i % 256) as u8, (i / 16 % 256) as u8, 200))
        .collect();

    for encoding in [
        TileEncoding::BlackWhite,
        TileEncoding::Palette64,
        TileEncoding::FullColour,
    ] {
        let (_, data) = encode_tile(&pixels, encoding, &palette);
        assert!(!data.is_empty());
        for byte in data.bytes() {
            assert!(
                byte != 0 && byte < 0x80,
                "byte {byte:#04x} in {encoding:?} output breaks the transport"
            );
        }
    }
}

/// Palette indices survive the pack/unpack cycle and match what a device
/// holding the same palette would resolve.
#[test]
fn palette_tile_indices_are_recoverable() {
    let palette = ColourPalette::device64();
    let pixels = [
        Colour::BLACK,
        Colour::WHITE,
        Colour::new(85, 0, 0),
        Colour::new(0, 85, 0),
    ];
    let (_, data) = encode_tile(&pixels, TileEncoding::Palette64, &palette);
    assert_eq!(packer::unpack_indices(&data), vec![0, 63, 16, 4]);
}

/// Settings for the legacy app id are alias-rewritten on the wire;
/// everyone else gets verbatim keys.
#[test]
fn settings_aliasing_depends_on_the_target_app() {
    let settings = json!({"tileEncoding": 1, "volume": 3})
        .as_object()
        .unwrap()
        .clone();

    let legacy = DeviceMessage::SaveSettings {
        settings: settings.clone(),
        app_id: wristmap_lib::settings::LEGACY_APP_ID.to_string(),
    }
    .encode()
    .expect("encodable");
    assert_eq!(legacy[0], json!(5));
    assert_eq!(legacy[1], json!({"te": 1, "volume": 3}));

    let modern = DeviceMessage::SaveSettings {
        settings,
        app_id: "com.wristmap.next".to_string(),
    }
    .encode()
    .expect("encodable");
    assert_eq!(modern[1], json!({"tileEncoding": 1, "volume": 3}));
}

/// The inbound decoder tolerates firmware newer than the phone app.
#[test]
fn inbound_decoding_is_forward_compatible() {
    use wristmap_lib::messages::decode_response;

    assert_eq!(decode_response(&[json!(0)]), Some(DeviceResponse::OpenApp));
    assert_eq!(decode_response(&[json!(77), json!("future payload")]), None);
}
