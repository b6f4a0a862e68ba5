//! Bit-packing helpers for the search data format.
//!
//! The format squeezes two fields into one in a few places. These helpers
//! keep that knowledge in one spot so the trie and result map code can work
//! with plain integers and flags.

use crate::error::{Error, Result};

/// Largest result count that fits the narrow 7-bit node header field.
pub const MAX_NARROW_RESULTS: usize = 0x7f;

/// Largest child count that fits the narrow 8-bit node header field.
pub const MAX_NARROW_CHILDREN: usize = 0xff;

/// Largest result count that fits the wide 11-bit node header field.
pub const MAX_WIDE_RESULTS: usize = 0x7ff;

/// Largest child count that fits the wide 4-bit node header field.
pub const MAX_WIDE_CHILDREN: usize = 0x0f;

/// Child offsets share their 24 bits with the lookahead barrier flag.
pub const MAX_CHILD_OFFSET: usize = (1 << 23) - 1;

/// Result map offsets share their 32 bits with the 8-bit flags field.
pub const MAX_RESULT_OFFSET: usize = (1 << 24) - 1;

const WIDE_HEADER: u8 = 0x80;
const LOOKAHEAD_BARRIER: u32 = 1 << 23;

/// Pack a trie node's result and child counts into the two-byte header.
///
/// Nodes with more than 127 results steal bits from the child count: the
/// top bit of the first byte flags the wide layout, the result count grows
/// to 11 bits and the child count shrinks to 4 bits.
pub fn pack_node_header(results: usize, children: usize) -> Result<[u8; 2]> {
    if results <= MAX_NARROW_RESULTS {
        if children > MAX_NARROW_CHILDREN {
            return Err(Error::NodeHeaderOverflow { results, children });
        }
        return Ok([results as u8, children as u8]);
    }

    if results > MAX_WIDE_RESULTS || children > MAX_WIDE_CHILDREN {
        return Err(Error::NodeHeaderOverflow { results, children });
    }
    Ok([
        (results & 0x7f) as u8 | WIDE_HEADER,
        ((results & 0x780) >> 3) as u8 | children as u8,
    ])
}

/// Inverse of [`pack_node_header`], returns `(results, children)`.
pub fn unpack_node_header(header: [u8; 2]) -> (usize, usize) {
    if header[0] & WIDE_HEADER == 0 {
        return (header[0] as usize, header[1] as usize);
    }
    let results = (header[0] & 0x7f) as usize | (((header[1] & 0xf0) as usize) << 3);
    (results, (header[1] & 0x0f) as usize)
}

/// Pack a child reference: 23-bit offset, barrier bit, then the edge byte.
pub fn pack_child(offset: usize, lookahead_barrier: bool, byte: u8) -> Result<[u8; 4]> {
    if offset > MAX_CHILD_OFFSET {
        return Err(Error::ChildOffsetOverflow(offset));
    }
    let mut value = offset as u32;
    if lookahead_barrier {
        value |= LOOKAHEAD_BARRIER;
    }
    let mut packed = value.to_le_bytes();
    packed[3] = byte;
    Ok(packed)
}

/// Inverse of [`pack_child`], returns `(offset, lookahead_barrier, byte)`.
pub fn unpack_child(packed: [u8; 4]) -> (usize, bool, u8) {
    let value = u32::from_le_bytes([packed[0], packed[1], packed[2], 0]);
    (
        (value & !LOOKAHEAD_BARRIER) as usize,
        value & LOOKAHEAD_BARRIER != 0,
        packed[3],
    )
}

/// Pack a result map offset with the entry flags living in its high byte.
pub fn pack_offset_flags(offset: usize, flags: u8) -> Result<[u8; 4]> {
    if offset > MAX_RESULT_OFFSET {
        return Err(Error::ResultOffsetOverflow(offset));
    }
    let mut packed = (offset as u32).to_le_bytes();
    packed[3] = flags;
    Ok(packed)
}

/// Inverse of [`pack_offset_flags`], returns `(offset, flags)`.
pub fn unpack_offset_flags(packed: [u8; 4]) -> (usize, u8) {
    (
        u32::from_le_bytes([packed[0], packed[1], packed[2], 0]) as usize,
        packed[3],
    )
}

/// Read `N` bytes at `offset`, failing instead of panicking on short input
pub fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    offset
        .checked_add(N)
        .and_then(|end| data.get(offset..end))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(Error::Truncated {
            offset,
            needed: N,
            len: data.len(),
        })
}

/// Read a little-endian u16 at `offset`
pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    read_array::<2>(data, offset).map(u16::from_le_bytes)
}

/// Read a little-endian u32 at `offset`
pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    read_array::<4>(data, offset).map(u32::from_le_bytes)
}

const BASE85_ALPHABET: &[u8; 85] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+-;<=>?@^_`{|}~";

/// Base85-encode with the RFC 1924 alphabet.
///
/// Input is zero-padded to a multiple of four bytes and the output is never
/// trimmed, so every 4-byte group becomes exactly 5 characters.
pub fn base85_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(4) * 5);
    for chunk in data.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(word);

        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = BASE85_ALPHABET[(value % 85) as usize];
            value /= 85;
        }
        out.extend(digits.iter().map(|&d| d as char));
    }
    out
}

/// Decode [`base85_encode`] output. Padding bytes are kept.
pub fn base85_decode(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    if bytes.len() % 5 != 0 {
        return Err(Error::Base85(format!(
            "length {} is not a multiple of 5",
            bytes.len()
        )));
    }

    let mut out = Vec::with_capacity(bytes.len() / 5 * 4);
    for group in bytes.chunks(5) {
        let mut value: u64 = 0;
        for &c in group {
            let digit = BASE85_ALPHABET
                .iter()
                .position(|&a| a == c)
                .ok_or_else(|| Error::Base85(format!("unexpected character {:?}", c as char)))?;
            value = value * 85 + digit as u64;
        }
        let value = u32::try_from(value)
            .map_err(|_| Error::Base85(format!("group {:?} overflows 32 bits", group)))?;
        out.extend_from_slice(&value.to_be_bytes());
    }
    Ok(out)
}
