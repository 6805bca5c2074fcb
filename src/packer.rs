//! # Printable Byte Packing
//!
//! The device transport only accepts valid text and treats a null byte as a
//! terminator, so pixel data cannot be shipped as raw bytes. This module
//! packs small symbol streams (1-bit pixels or 6-bit palette indices) into
//! strings where every encoded byte is non-zero and 7-bit.
//!
//! ## The 0x40 sentinel
//!
//! Each output character carries its payload in bits 0..5. Bit 6 is forced
//! high (`| 0x40`) and the result masked to 7 bits (`& 0x7F`), which pins
//! every byte into `0x40..=0x7F` — never zero, never a C0 control, always a
//! single UTF-8 byte. The firmware unpacker strips the same sentinel, so
//! bit order and the `0x40` transform are a shared wire contract: changing
//! either requires a new message type tag.

/// Payload bits carried per output character.
pub const GROUP_BITS: usize = 6;

/// Forced-high bit that keeps every encoded byte non-zero and 7-bit.
const SENTINEL: u8 = 0x40;

/// Mask keeping encoded bytes within the 7-bit transport range.
const SEVEN_BIT_MASK: u8 = 0x7F;

/// Pack a 1-bit symbol stream, 6 bits per output character.
///
/// Bits fill each character from position 0 upward; a final partial group
/// is flushed as-is, with the unused high positions left at zero. An empty
/// input produces an empty string.
pub fn pack_bits(bits: impl IntoIterator<Item = bool>) -> String {
    let mut out = String::new();
    let mut acc: u8 = 0;
    let mut filled: usize = 0;

    for bit in bits {
        if bit {
            acc |= 1 << filled;
        }
        filled += 1;
        if filled == GROUP_BITS {
            out.push(((acc | SENTINEL) & SEVEN_BIT_MASK) as char);
            acc = 0;
            filled = 0;
        }
    }
    if filled > 0 {
        out.push(((acc | SENTINEL) & SEVEN_BIT_MASK) as char);
    }
    out
}

/// Pack a stream of 6-bit palette indices, one output character per index.
///
/// Despite the 6-bit symbol width, indices are NOT packed across character
/// boundaries: the 64-colour tile format emits exactly one printable
/// character per pixel. The firmware decoder reads it that way, so packing
/// 6 pixels into 6 bytes is the wire format, not an inefficiency to fix —
/// re-deriving the density would be a breaking wire-format change.
///
/// Indices above 63 are masked into range; palettes never exceed 64 entries.
pub fn pack_indices(indices: impl IntoIterator<Item = u8>) -> String {
    indices
        .into_iter()
        .map(|idx| (((idx & 0x3F) | SENTINEL) & SEVEN_BIT_MASK) as char)
        .collect()
}

/// Inverse of [`pack_bits`], recovering the first `count` bits.
///
/// The real decoder lives in the device firmware; this inverse exists for
/// parity tests and for debugging captured payloads. Bytes outside the
/// packed range simply contribute their low six bits.
pub fn unpack_bits(packed: &str, count: usize) -> Vec<bool> {
    let mut bits = Vec::with_capacity(count);
    'outer: for byte in packed.bytes() {
        for position in 0..GROUP_BITS {
            if bits.len() == count {
                break 'outer;
            }
            bits.push((byte >> position) & 1 == 1);
        }
    }
    bits
}

/// Inverse of [`pack_indices`]; one palette index per input character.
pub fn unpack_indices(packed: &str) -> Vec<u8> {
    packed.bytes().map(|byte| byte & 0x3F).collect()
}
