//! # Map Tile Encoding
//!
//! State-free functions turning a tile's pixel colours into the compact
//! `(type, data)` pair the device decodes. Three encodings exist, picked by
//! the caller's configured [`TileEncoding`]:
//!
//! - black/white: 1 bit per pixel through the printable packer
//! - 64-colour: one printable character per pixel, palette-indexed
//! - full-colour: base64 of raw 3-byte RGB
//!
//! Pixel order is caller-supplied and must match the firmware's unpacking
//! loop: row-major within a tile, tile-major within a batch. The pipeline
//! in [`crate::pipeline`] upholds that ordering when it extracts slices.

use crate::colour::{Colour, ColourPalette};
use crate::packer;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Wire tag for each tile colour encoding. Stable; the device echoes the
/// value it was configured with when requesting tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TileEncoding {
    /// 1-bit, close-to-white test per pixel
    BlackWhite,
    /// 6-bit palette index per pixel
    Palette64,
    /// Base64-encoded 24-bit RGB
    FullColour,
}

impl TileEncoding {
    /// The `type` value used in tile messages and HTTP responses.
    pub fn tag(&self) -> u8 {
        match self {
            TileEncoding::BlackWhite => 0,
            TileEncoding::Palette64 => 1,
            TileEncoding::FullColour => 2,
        }
    }
}

/// Encode one tile's pixels (row-major) into `(type tag, colour string)`.
///
/// The palette is only consulted for [`TileEncoding::Palette64`]; passing
/// the active palette unconditionally keeps the call site uniform.
pub fn encode_tile(
    pixels: &[Colour],
    encoding: TileEncoding,
    palette: &ColourPalette,
) -> (u8, String) {
    let data = match encoding {
        TileEncoding::BlackWhite => {
            packer::pack_bits(pixels.iter().map(Colour::is_close_to_white))
        }
        TileEncoding::Palette64 => {
            packer::pack_indices(pixels.iter().map(|c| palette.nearest_index(*c) as u8))
        }
        TileEncoding::FullColour => {
            let mut raw = Vec::with_capacity(pixels.len() * 3);
            for pixel in pixels {
                raw.extend_from_slice(&[pixel.r, pixel.g, pixel.b]);
            }
            BASE64.encode(raw)
        }
    };
    (encoding.tag(), data)
}
