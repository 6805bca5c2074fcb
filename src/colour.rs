//! # Colour Model and Palette Matching
//!
//! An 8-bit-per-channel RGB value type plus the quantization the tile
//! encoders need: a close-to-white test for the black/white mode and a
//! nearest-palette-entry search for the 64-colour mode.
//!
//! Palette entries are referenced by positional index on the wire. The
//! device firmware holds its own copy of each deployed palette, so the
//! built-in orderings below are frozen: reordering a deployed palette is a
//! breaking change, appending entries is the only compatible mutation.

use serde::{Deserialize, Serialize};

/// An opaque RGB colour. Pure value type; derived encodings (palette index,
/// packed integers, the white test) are computed on demand, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Channel sum at or above which a colour counts as white on a 1-bit
/// display (average channel ≥ 128). The firmware applies the inverse test
/// when unpacking black/white tiles, so the threshold is frozen.
const WHITE_CHANNEL_SUM: u16 = 384;

impl Colour {
    pub const BLACK: Colour = Colour { r: 0, g: 0, b: 0 };
    pub const WHITE: Colour = Colour {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Colour { r, g, b }
    }

    /// Whether this colour renders as white in the black/white tile mode.
    pub fn is_close_to_white(&self) -> bool {
        self.r as u16 + self.g as u16 + self.b as u16 >= WHITE_CHANNEL_SUM
    }

    /// The colour packed as a 24-bit `0xRRGGBB` integer.
    pub fn packed_rgb(&self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// The colour in the device-native ARGB layout with alpha forced opaque.
    pub fn packed_argb(&self) -> u32 {
        0xFF00_0000 | self.packed_rgb()
    }
}

/// Redmean-weighted squared colour distance.
///
/// A perceptual approximation that weights the red and blue deltas by where
/// the pair sits on the red axis:
///
/// ```text
/// rMean = (r1 + r2) / 2
/// d = (2 + rMean/256)·Δr² + 4·Δg² + (2 + (255 − rMean)/256)·Δb²
/// ```
///
/// Not a metric in the mathematical sense, but cheap and good enough to
/// pick indices in a ≤64-entry palette.
pub fn redmean_distance(a: Colour, b: Colour) -> f32 {
    let r_mean = (a.r as f32 + b.r as f32) / 2.0;
    let dr = a.r as f32 - b.r as f32;
    let dg = a.g as f32 - b.g as f32;
    let db = a.b as f32 - b.b as f32;

    let weight_r = 2.0 + r_mean / 256.0;
    let weight_g = 4.0;
    let weight_b = 2.0 + (255.0 - r_mean) / 256.0;

    weight_r * dr * dr + weight_g * dg * dg + weight_b * db * db
}

/// Index of the palette entry nearest to `colour` under [`redmean_distance`].
///
/// Linear scan with a strictly-less comparison, so ties resolve to the
/// lowest index. O(palette len) per call — fine for device palettes capped
/// at 64 entries, unsuitable for arbitrary palettes without an index
/// structure. Empty palettes yield index 0 by convention; callers never
/// build them.
pub fn nearest_palette_index(palette: &[Colour], colour: Colour) -> usize {
    let mut best_index = 0;
    let mut best_distance = f32::INFINITY;
    for (index, entry) in palette.iter().enumerate() {
        let distance = redmean_distance(colour, *entry);
        if distance < best_distance {
            best_distance = distance;
            best_index = index;
        }
    }
    best_index
}

/// How a palette maps arbitrary colours onto its entries. Carried to the
/// device as a rendering hint; the phone-side matcher always uses the
/// redmean search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaletteMode {
    Nearest,
    BrightnessOrdered,
    Perceptual,
}

/// An ordered, positionally-indexed colour list the device can render.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColourPalette {
    /// Numeric id used on the wire in tile-server-changed messages
    pub id: u16,
    /// Stable unique id, survives renames
    pub uid: String,
    /// Display name
    pub name: String,
    /// The entries; index on the wire, so order is append-only once deployed
    pub colours: Vec<Colour>,
    /// Whether the user may edit this palette
    pub editable: bool,
    pub mode: PaletteMode,
}

impl ColourPalette {
    /// The built-in 2-entry palette backing the black/white tile mode.
    pub fn black_white() -> Self {
        ColourPalette {
            id: 0,
            uid: "builtin-bw".to_string(),
            name: "Black & White".to_string(),
            colours: vec![Colour::BLACK, Colour::WHITE],
            editable: false,
            mode: PaletteMode::Nearest,
        }
    }

    /// The built-in 64-entry device palette: a 4×4×4 RGB lattice with
    /// channel levels {0, 85, 170, 255}, ordered red-major. Index
    /// `r·16 + g·4 + b` — the firmware decoder hardcodes this order.
    pub fn device64() -> Self {
        let levels = [0u8, 85, 170, 255];
        let mut colours = Vec::with_capacity(64);
        for r in levels {
            for g in levels {
                for b in levels {
                    colours.push(Colour::new(r, g, b));
                }
            }
        }
        ColourPalette {
            id: 1,
            uid: "builtin-device64".to_string(),
            name: "Device 64".to_string(),
            colours,
            editable: false,
            mode: PaletteMode::Nearest,
        }
    }

    /// Look up a built-in palette by wire id.
    pub fn builtin(id: u16) -> Option<Self> {
        match id {
            0 => Some(Self::black_white()),
            1 => Some(Self::device64()),
            _ => None,
        }
    }

    /// Nearest entry index for `colour` in this palette.
    pub fn nearest_index(&self, colour: Colour) -> usize {
        nearest_palette_index(&self.colours, colour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_test_thresholds() {
        assert!(Colour::WHITE.is_close_to_white());
        assert!(!Colour::BLACK.is_close_to_white());
        // Exactly at the channel-sum threshold counts as white.
        assert!(Colour::new(128, 128, 128).is_close_to_white());
        assert!(!Colour::new(127, 128, 128).is_close_to_white());
        // Sum matters, not individual channels.
        assert!(Colour::new(255, 255, 0).is_close_to_white());
    }

    #[test]
    fn packed_forms() {
        let c = Colour::new(0x12, 0x34, 0x56);
        assert_eq!(c.packed_rgb(), 0x123456);
        assert_eq!(c.packed_argb(), 0xFF123456);
    }

    #[test]
    fn exact_palette_entry_matches_at_distance_zero() {
        let palette = ColourPalette::device64();
        for (index, entry) in palette.colours.iter().enumerate() {
            assert_eq!(redmean_distance(*entry, *entry), 0.0);
            assert_eq!(
                palette.nearest_index(*entry),
                index,
                "exact colour {entry:?} must match its own index"
            );
        }
    }

    #[test]
    fn strict_winner_is_selected_regardless_of_position() {
        // Mid-grey is a strict redmean winner over pure red for a
        // near-grey probe; swapping the entry order must not change it.
        let probe = Colour::new(100, 110, 100);
        let grey = Colour::new(110, 110, 110);
        let red = Colour::new(255, 0, 0);

        assert_eq!(nearest_palette_index(&[grey, red], probe), 0);
        assert_eq!(nearest_palette_index(&[red, grey], probe), 1);
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        // Duplicate entries tie exactly; the strictly-less scan keeps the
        // first one found.
        let c = Colour::new(42, 42, 42);
        assert_eq!(nearest_palette_index(&[c, c, c], c), 0);
    }

    #[test]
    fn device64_is_frozen_at_64_entries_in_lattice_order() {
        let palette = ColourPalette::device64();
        assert_eq!(palette.colours.len(), 64);
        assert_eq!(palette.colours[0], Colour::BLACK);
        assert_eq!(palette.colours[63], Colour::WHITE);
        // r-major ordering: index 16 steps red one level.
        assert_eq!(palette.colours[16], Colour::new(85, 0, 0));
        assert_eq!(palette.colours[4], Colour::new(0, 85, 0));
        assert_eq!(palette.colours[1], Colour::new(0, 0, 85));
    }
}
