//! Prefix comparator for index slots
//!
//! An index node stores a fixed-width key slot that may hold only the
//! leading bytes of a variable-length value. [`compare_object_to_slot`]
//! orders a fully materialized left-hand value against such a slot,
//! correctly even when the slot is a prefix.
//!
//! String-shaped kinds (string, URI, keyword) reduce the left value to its
//! canonical string, locate the slot's text past the header and any
//! full-form length bytes, drop any trailing partial UTF-8 code unit, and
//! compare code points — verbatim when the slot holds the whole string,
//! prefix-wise otherwise. Every other kind is a raw byte compare of the
//! encoded bodies, which gives fixed-width big-endian payloads their
//! natural ordering.

use crate::error::{CodecError, Result};
use crate::header::{classify, type_info, HeaderKind, TYPE_KEYWORD, TYPE_STRING, TYPE_URI};
use crate::value::Value;
use std::cmp::Ordering;

/// Compare a materialized value against an index-slot byte buffer.
///
/// `left_encoded` is the left value's stored form (header included);
/// `slot` is the full bytes-view of the right-hand slot, also starting at
/// its header byte and possibly truncated to a prefix of the stored value.
/// Dispatch goes through [`type_info`] on the left header byte.
pub fn compare_object_to_slot(
    left: &Value,
    left_encoded: &[u8],
    slot: &[u8],
) -> Result<Ordering> {
    match type_info(left_encoded[0]) {
        TYPE_STRING | TYPE_URI | TYPE_KEYWORD => {
            let left_s = left.canonical_str().ok_or_else(|| {
                CodecError::invalid_payload(
                    "comparison",
                    "string-shaped header on a non-string value",
                )
            })?;
            compare_str_to_slot(left_s, slot)
        }
        _ => Ok(compare_raw_bodies(&left_encoded[1..], &slot[1..])),
    }
}

/// String-shaped comparison per the slot's declared length.
fn compare_str_to_slot(left_s: &str, slot: &[u8]) -> Result<Ordering> {
    let Some((full_length, offset)) = string_payload_bounds(slot) else {
        // Slot cut inside the length prefix: no text is visible, so the
        // comparison cannot be decided here
        return Ok(Ordering::Equal);
    };
    let avail = slot.len().saturating_sub(offset);
    let rlen = full_length.min(avail);
    let trunc = partial_utf8_tail(&slot[offset..offset + rlen]);
    let right_s = std::str::from_utf8(&slot[offset..offset + rlen - trunc]).map_err(|e| {
        CodecError::InvalidUtf8 {
            pos: (offset + e.valid_up_to()) as u64,
        }
    })?;

    if full_length <= avail {
        // Slot holds the complete string
        Ok(left_s.cmp(right_s))
    } else {
        Ok(prefix_cmp(left_s, right_s))
    }
}

/// Declared payload length and payload offset of a string-shaped slot.
///
/// Short forms carry the length in the header byte itself and the text
/// starts right after it. Full forms spend 1, 2, or 4 further bytes on the
/// length, which must be skipped before the text begins. Returns `None`
/// when the slot is cut inside the length prefix (or is not string-shaped)
/// and no payload byte is addressable.
fn string_payload_bounds(slot: &[u8]) -> Option<(usize, usize)> {
    match classify(slot[0]) {
        HeaderKind::ShortString { len }
        | HeaderKind::ShortUri { len }
        | HeaderKind::ShortKeyword { len } => Some((len, 1)),
        HeaderKind::Full { ext: true, .. } => Some((*slot.get(1)? as usize, 2)),
        HeaderKind::Full { ext: false, .. } => {
            let s1 = u16::from_be_bytes([*slot.get(1)?, *slot.get(2)?]);
            if s1 & 0x8000 != 0 {
                let s2 = u16::from_be_bytes([*slot.get(3)?, *slot.get(4)?]);
                Some(((((s1 & 0x7FFF) as usize) << 16) | s2 as usize, 5))
            } else {
                Some((s1 as usize, 3))
            }
        }
        HeaderKind::ShortLong { .. } => None,
    }
}

/// Compare the first `right.chars().count()` code points of `left` against
/// `right`. A left value that runs out first is a strict prefix of the
/// slot's visible text and orders before it.
fn prefix_cmp(left: &str, right: &str) -> Ordering {
    let mut right_chars = right.chars();
    for lc in left.chars() {
        match right_chars.next() {
            Some(rc) if lc == rc => continue,
            Some(rc) => return lc.cmp(&rc),
            None => return Ordering::Equal,
        }
    }
    if right_chars.next().is_some() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

/// Raw element-wise byte compare over the common prefix; all-equal is
/// `Equal` (prefix semantics for truncated slots).
fn compare_raw_bodies(left: &[u8], right: &[u8]) -> Ordering {
    for (l, r) in left.iter().zip(right.iter()) {
        match l.cmp(r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Number of trailing bytes of `bytes` that form an incomplete UTF-8 code
/// unit and must be dropped before decoding.
///
/// Scans backward over at most 4 bytes: a single-byte char terminates the
/// scan, continuations keep it going, and a lead byte found with fewer
/// continuations after it than its class requires marks the whole trailing
/// sequence for removal. The 4-byte bound guards against malformed input;
/// well-formed UTF-8 never needs more.
pub fn partial_utf8_tail(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let limit = len.min(4);
    for back in 1..=limit {
        let b = bytes[len - back];
        if b & 0x80 == 0 {
            return 0;
        }
        if b & 0xC0 == 0x80 {
            continue;
        }
        let needed = if b & 0xE0 == 0xC0 {
            1
        } else if b & 0xF0 == 0xE0 {
            2
        } else if b & 0xF8 == 0xF0 {
            3
        } else {
            0
        };
        return if back - 1 >= needed { 0 } else { back };
    }
    0
}
