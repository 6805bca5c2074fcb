//! # Wristmap Core Library
//!
//! This library prepares route and map-tile data on the phone and encodes it
//! into the compact wire messages a bandwidth-constrained wearable device can
//! decode. The device talks a low-throughput text transport that forbids a
//! handful of byte values, so every payload leaving this crate is either
//! plain numbers/strings or a printable-packed pixel string.
//!
//! ## Design Philosophy
//!
//! ### Firmware compatibility first
//! The device firmware independently reimplements the inverse of everything
//! encoded here: the Mercator-style projection, the printable bit packing,
//! the palette index order and the close-to-white threshold. Those formulas
//! and constants are frozen — any change is a breaking wire-format change
//! that needs a new message type tag.
//!
//! ### Pure codecs, one I/O edge
//! Every codec module ([`wire`], [`packer`], [`colour`], [`projection`],
//! [`route`], [`tile`], [`settings`], [`messages`]) is a synchronous pure
//! transform over immutable inputs and is safe to call from any task. The
//! only component performing I/O is the tile transcoding pipeline
//! ([`pipeline`]), which fetches source rasters with a bounded timeout, and
//! the loopback HTTP server ([`server`]) the device requests tiles through.
//!
//! ### Data Flow
//! 1. **Routes**: user geometry → truncate to the device cap → project →
//!    [`messages::DeviceMessage`] → transport
//! 2. **Tiles**: device HTTP request → fetch/resample/slice source raster →
//!    colour-encode → `{type, data}` response
//! 3. **Settings**: key-value map → alias rewriting → settings message

use serde::{Deserialize, Serialize};

// Module declarations
pub mod colour;
pub mod config;
pub mod messages;
pub mod packer;
pub mod pipeline;
pub mod projection;
pub mod route;
pub mod server;
pub mod settings;
pub mod tile;
pub mod wire;

/// A geographic track point as supplied by the user, a GPX import or a URL.
///
/// Inputs arrive with float64 precision but are stored as `f32`: the device
/// renders routes with 32-bit floats, so any extra precision would be lost
/// on the wire anyway, and halving the footprint matters for 10k-point
/// tracks held in memory during encoding.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Latitude in degrees, positive north
    pub lat: f32,
    /// Longitude in degrees, positive east
    pub lon: f32,
    /// Altitude in meters above sea level
    pub altitude: f32,
}

impl Point {
    pub fn new(lat: f32, lon: f32, altitude: f32) -> Self {
        Point { lat, lon, altitude }
    }
}

/// Like [`Point`] but carries a heading instead of an altitude.
///
/// Direction points mark turn instructions along a route; the angle is the
/// heading in degrees the device draws the instruction arrow at.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionPoint {
    pub lat: f32,
    pub lon: f32,
    /// Heading in degrees, clockwise from north
    pub angle: f32,
}

impl DirectionPoint {
    pub fn new(lat: f32, lon: f32, angle: f32) -> Self {
        DirectionPoint { lat, lon, angle }
    }
}

/// A named, ordered route ready for encoding.
///
/// Constructed once per send and discarded after encoding. The wire cap of
/// [`route::MAX_WIRE_POINTS`] points is applied during encoding, not here —
/// a `Route` may hold an arbitrarily long track.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Route {
    /// Display name shown in the device route list
    pub name: String,
    /// Ordered track geometry
    pub points: Vec<Point>,
    /// Ordered turn instructions
    pub direction_points: Vec<DirectionPoint>,
}

impl Route {
    pub fn new(name: impl Into<String>) -> Self {
        Route {
            name: name.into(),
            points: Vec::new(),
            direction_points: Vec::new(),
        }
    }
}
