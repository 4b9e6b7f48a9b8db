//! Fixed-width little-endian integer helpers
//!
//! Every scalar in a RAF header is a little-endian `u32`. The record types in
//! [`crate::header`] are decoded through binrw; these helpers cover the places
//! where a single field is peeked or patched in a raw byte buffer.

/// Width of every header scalar in bytes
pub const U32_SIZE: usize = 4;

/// Decode a little-endian `u32`
pub const fn decode_u32_le(bytes: [u8; U32_SIZE]) -> u32 {
    u32::from_le_bytes(bytes)
}

/// Encode a `u32` as little-endian bytes
pub const fn encode_u32_le(value: u32) -> [u8; U32_SIZE] {
    value.to_le_bytes()
}

/// Read the little-endian `u32` stored at `position` in `data`
///
/// Returns `None` when fewer than four bytes remain.
pub fn read_u32_le_at(data: &[u8], position: usize) -> Option<u32> {
    let end = position.checked_add(U32_SIZE)?;
    let bytes: [u8; U32_SIZE] = data.get(position..end)?.try_into().ok()?;
    Some(decode_u32_le(bytes))
}
