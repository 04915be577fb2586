//! Variable-length encoding of unsigned 64-bit values.
//!
//! Seven payload bits per byte, least significant group first. The final byte
//! of a value has its high bit set; all earlier bytes have it clear.

/// Longest encoding of a `u64`.
pub const MAX_ENCODED_SIZE: usize = 10;

const PAYLOAD_MASK: u64 = 0x7F;
const TERMINATOR: u8 = 0x80;

/// Number of bytes `value` occupies once encoded.
#[inline]
#[must_use]
pub const fn encoded_size(value: u64) -> usize {
    if value == 0 {
        1
    } else {
        let bits = 64 - value.leading_zeros() as usize;
        bits.div_ceil(7)
    }
}

/// Append the encoding of `value` to `out`.
#[inline]
pub fn encode(mut value: u64, out: &mut Vec<u8>) {
    while value > PAYLOAD_MASK {
        out.push((value & PAYLOAD_MASK) as u8);
        value >>= 7;
    }
    out.push(value as u8 | TERMINATOR);
}

/// Decode one value at `*offset`, moving `*offset` past it.
#[inline]
pub fn decode(bytes: &[u8], offset: &mut usize) -> u64 {
    let mut value = 0u64;
    let mut shift = 0;
    loop {
        let byte = bytes[*offset];
        *offset += 1;
        value |= u64::from(byte & 0x7F) << shift;
        if byte & TERMINATOR != 0 {
            return value;
        }
        shift += 7;
    }
}

/// Decode `out.len()` deltas starting at `*offset` and accumulate them onto
/// `base`, writing absolute values. Returns the last absolute value.
#[inline]
pub fn decode_deltas(bytes: &[u8], offset: &mut usize, base: u64, out: &mut [u64]) -> u64 {
    let mut value = base;
    for slot in out.iter_mut() {
        value += decode(bytes, offset);
        *slot = value;
    }
    value
}

/// Move `*offset` past `count` encoded values without decoding them.
#[inline]
pub fn skip(bytes: &[u8], offset: &mut usize, count: usize) {
    let mut seen = 0;
    while seen < count {
        if bytes[*offset] & TERMINATOR != 0 {
            seen += 1;
        }
        *offset += 1;
    }
}
