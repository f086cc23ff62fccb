//! Tagged byte decoder
//!
//! Given a [`PagedReader`] and an absolute position, [`read_object_size`]
//! materializes the stored value and reports the total bytes consumed,
//! header included. Dispatch branches on the high bits of the header byte
//! (see [`crate::header`]); full-form types decode through one `match`
//! whose arms share the `(ext, pos) -> (Value, payload_len)` shape, with
//! type codes 14–15 falling through to the user-defined decoder backed by a
//! [`TypeRegistry`].
//!
//! Reads are issued in parse order: header byte, then length bytes, then
//! payload, then recursion for sequence and map bodies. The decoder holds
//! no state of its own and is safe to call concurrently whenever the
//! reader is.

use crate::error::{CodecError, Result};
use crate::header::{self, classify, HeaderKind};
use crate::reader::PagedReader;
use crate::registry::TypeRegistry;
use crate::temporal::{Date, Instant};
use crate::value::{Keyword, TypedLiteral, Uri, Value};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use uuid::Uuid;

/// Decoder over a paged reader, with a user-type registry for codes 14–15.
pub struct ObjectReader<'a, R: PagedReader> {
    reader: &'a R,
    registry: &'a TypeRegistry,
}

impl<'a, R: PagedReader> ObjectReader<'a, R> {
    /// Decoder with the shared empty registry; user-defined type codes
    /// become [`CodecError::UnknownUserType`].
    pub fn new(reader: &'a R) -> Self {
        ObjectReader {
            reader,
            registry: TypeRegistry::shared_empty(),
        }
    }

    /// Decoder with an explicit registry for user-defined types.
    pub fn with_registry(reader: &'a R, registry: &'a TypeRegistry) -> Self {
        ObjectReader { reader, registry }
    }

    /// Decode the value stored at `pos`.
    pub fn read_object(&self, pos: u64) -> Result<Value> {
        self.read_object_size(pos).map(|(value, _)| value)
    }

    /// Decode the value stored at `pos`, returning it together with the
    /// total number of bytes consumed from `pos` (header and any inline
    /// length bytes included).
    pub fn read_object_size(&self, pos: u64) -> Result<(Value, usize)> {
        let b0 = self.reader.read_byte(pos)?;
        match classify(b0) {
            HeaderKind::ShortString { len } => {
                let s = self.read_utf8(pos + 1, len)?;
                Ok((Value::String(s), len + 1))
            }
            HeaderKind::ShortUri { len } => {
                let s = self.read_utf8(pos + 1, len)?;
                Ok((Value::Uri(Uri::new(s)), len + 1))
            }
            HeaderKind::ShortKeyword { len } => {
                let s = self.read_utf8(pos + 1, len)?;
                Ok((Value::Keyword(Keyword::new(s)), len + 1))
            }
            HeaderKind::ShortLong { width } => {
                if !(1..=8).contains(&width) {
                    return Err(CodecError::MalformedHeader { byte: b0, pos });
                }
                let v = self.read_long_width(pos + 1, width)?;
                Ok((Value::Long(v), width + 1))
            }
            HeaderKind::Full { type_code, ext } => {
                let (value, payload) = self.decode_typed(type_code, ext, pos + 1)?;
                Ok((value, payload + 1))
            }
        }
    }

    /// Decode a full-form payload. `pos` is immediately past the header
    /// byte; the return carries the payload bytes consumed (the caller adds
    /// the header byte). Fixed-width types ignore `ext`.
    fn decode_typed(&self, type_code: u8, ext: bool, pos: u64) -> Result<(Value, usize)> {
        match type_code {
            header::TYPE_LONG => {
                let b = self.read_array::<8>(pos)?;
                Ok((Value::Long(i64::from_be_bytes(b)), 8))
            }
            header::TYPE_DOUBLE => {
                let b = self.read_array::<8>(pos)?;
                Ok((Value::Double(f64::from_be_bytes(b)), 8))
            }
            header::TYPE_STRING => {
                let (len, lb) = self.read_len(ext, pos)?;
                let s = self.read_utf8(pos + lb as u64, len)?;
                Ok((Value::String(s), lb + len))
            }
            header::TYPE_URI => {
                let (len, lb) = self.read_len(ext, pos)?;
                let s = self.read_utf8(pos + lb as u64, len)?;
                Ok((Value::Uri(Uri::new(s)), lb + len))
            }
            header::TYPE_SEQUENCE => {
                let (items, consumed) = self.decode_sequence_body(ext, pos)?;
                Ok((Value::Sequence(items), consumed))
            }
            header::TYPE_MAP => {
                let (items, consumed) = self.decode_sequence_body(ext, pos)?;
                if items.len() % 2 != 0 {
                    return Err(CodecError::invalid_payload(
                        "map",
                        format!("odd element count {}", items.len()),
                    ));
                }
                let mut pairs = Vec::with_capacity(items.len() / 2);
                let mut it = items.into_iter();
                while let (Some(k), Some(v)) = (it.next(), it.next()) {
                    pairs.push((k, v));
                }
                Ok((Value::Map(pairs), consumed))
            }
            header::TYPE_BIG_INT => {
                let (len, lb) = self.read_len(ext, pos)?;
                let bytes = self.reader.read_bytes(pos + lb as u64, len)?;
                let v = BigInt::from_signed_bytes_be(&bytes);
                Ok((Value::BigInt(Box::new(v)), lb + len))
            }
            header::TYPE_BIG_DEC => {
                // Canonical lexical form, not raw digits: the scale would
                // be ambiguous in a bare two's-complement encoding.
                let (len, lb) = self.read_len(ext, pos)?;
                let s = self.read_utf8(pos + lb as u64, len)?;
                let v = s
                    .parse::<BigDecimal>()
                    .map_err(|e| CodecError::invalid_payload("big decimal", e.to_string()))?;
                Ok((Value::Decimal(Box::new(v)), lb + len))
            }
            header::TYPE_DATE => {
                let b = self.read_array::<8>(pos)?;
                Ok((Value::Date(Date::from_millis(i64::from_be_bytes(b))), 8))
            }
            header::TYPE_INSTANT => {
                let secs = i64::from_be_bytes(self.read_array::<8>(pos)?);
                let nanos = u32::from_be_bytes(self.read_array::<4>(pos + 8)?);
                Ok((Value::Instant(Instant::new(secs, nanos)), 12))
            }
            header::TYPE_KEYWORD => {
                let (len, lb) = self.read_len(ext, pos)?;
                let s = self.read_utf8(pos + lb as u64, len)?;
                Ok((Value::Keyword(Keyword::new(s)), lb + len))
            }
            header::TYPE_UUID => {
                let low = u64::from_be_bytes(self.read_array::<8>(pos)?);
                let high = u64::from_be_bytes(self.read_array::<8>(pos + 8)?);
                let v = Uuid::from_u128(((high as u128) << 64) | low as u128);
                Ok((Value::Uuid(v), 16))
            }
            header::TYPE_BLOB => {
                let (len, lb) = self.read_len(ext, pos)?;
                let bytes = self.reader.read_bytes(pos + lb as u64, len)?;
                Ok((Value::Blob(bytes), lb + len))
            }
            header::TYPE_TYPED_LITERAL => {
                let (len, lb) = self.read_len(ext, pos)?;
                let s = self.read_utf8(pos + lb as u64, len)?;
                let (uri, lexical) = s.split_once(' ').ok_or_else(|| {
                    CodecError::invalid_payload("typed literal", "missing space separator")
                })?;
                Ok((
                    Value::TypedLiteral(Box::new(TypedLiteral::new(uri, lexical))),
                    lb + len,
                ))
            }
            // Codes 14-15: user-defined, "class_name payload"
            _ => {
                let (len, lb) = self.read_len(ext, pos)?;
                let s = self.read_utf8(pos + lb as u64, len)?;
                let (class_name, lexical) = s.split_once(' ').unwrap_or((s.as_str(), ""));
                let value = self.registry.construct(class_name, lexical)?;
                Ok((value, lb + len))
            }
        }
    }

    /// Decode a sequence/map body. The outer length prefix frames the total
    /// body byte length, which includes the element-typing byte `seq0`.
    fn decode_sequence_body(&self, ext: bool, pos: u64) -> Result<(Vec<Value>, usize)> {
        let (body_len, lb) = self.read_len(ext, pos)?;
        let consumed = lb + body_len;
        if body_len == 0 {
            return Ok((Vec::new(), consumed));
        }

        let body_start = pos + lb as u64;
        let seq0 = self.reader.read_byte(body_start)?;
        let end = body_start + body_len as u64;
        let mut cursor = body_start + 1;
        let mut items = Vec::new();

        if seq0 == 0 {
            // Heterogeneous: each element carries its own header
            while cursor < end {
                let (v, n) = self.read_object_size(cursor)?;
                items.push(v);
                cursor += n as u64;
            }
        } else if seq0 & 0xF0 == header::LONG_WIDTH_MARKER {
            // Homogeneous fixed-width longs, no per-element header
            let width = (seq0 & 0x0F) as usize;
            if !(1..=8).contains(&width) {
                return Err(CodecError::MalformedHeader {
                    byte: seq0,
                    pos: body_start,
                });
            }
            if (body_len - 1) % width != 0 {
                return Err(CodecError::invalid_payload(
                    "sequence",
                    format!("body of {} bytes is not a multiple of width {}", body_len - 1, width),
                ));
            }
            while cursor < end {
                items.push(Value::Long(self.read_long_width(cursor, width)?));
                cursor += width as u64;
            }
        } else {
            // Homogeneous tagged: one type code for every element, each
            // decoded with a 1-byte length and no header byte
            let elem_type = seq0 & 0x0F;
            if elem_type > header::TYPE_TYPED_LITERAL {
                return Err(CodecError::IllegalArrayType(elem_type));
            }
            while cursor < end {
                let (v, n) = self.decode_typed(elem_type, true, cursor)?;
                items.push(v);
                cursor += n as u64;
            }
        }

        if cursor != end {
            return Err(CodecError::invalid_payload(
                "sequence",
                format!("elements overrun body by {} bytes", cursor - end),
            ));
        }
        Ok((items, consumed))
    }

    /// Decode a length prefix: one byte under `ext`, otherwise a 2-byte
    /// big-endian length whose set top bit escapes to the 4-byte form
    /// (15 high bits ++ next 2 bytes, 31 usable bits). Returns the length
    /// and the number of length bytes.
    fn read_len(&self, ext: bool, pos: u64) -> Result<(usize, usize)> {
        if ext {
            return Ok((self.reader.read_byte(pos)? as usize, 1));
        }
        let s1 = self.reader.read_short(pos)? as u16;
        if s1 & 0x8000 != 0 {
            let s2 = self.reader.read_short(pos + 2)? as u16;
            let len = (((s1 & 0x7FFF) as usize) << 16) | s2 as usize;
            Ok((len, 4))
        } else {
            Ok((s1 as usize, 2))
        }
    }

    /// Read a big-endian signed integer of `width` bytes (1–8).
    fn read_long_width(&self, pos: u64, width: usize) -> Result<i64> {
        let bytes = self.reader.read_bytes(pos, width)?;
        let mut v = (bytes[0] as i8) as i64;
        for b in &bytes[1..] {
            v = (v << 8) | (*b as i64);
        }
        Ok(v)
    }

    fn read_array<const N: usize>(&self, pos: u64) -> Result<[u8; N]> {
        let bytes = self.reader.read_bytes(pos, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&bytes);
        Ok(out)
    }

    fn read_utf8(&self, pos: u64, len: usize) -> Result<String> {
        let bytes = self.reader.read_bytes(pos, len)?;
        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 { pos })
    }
}

/// Decode the value stored at `pos` with the shared empty registry.
pub fn read_object<R: PagedReader>(reader: &R, pos: u64) -> Result<Value> {
    ObjectReader::new(reader).read_object(pos)
}

/// Decode the value stored at `pos`, returning `(value, bytes_consumed)`,
/// with the shared empty registry.
pub fn read_object_size<R: PagedReader>(reader: &R, pos: u64) -> Result<(Value, usize)> {
    ObjectReader::new(reader).read_object_size(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::SliceReader;

    fn decode(bytes: &[u8]) -> (Value, usize) {
        let reader = SliceReader::new(bytes);
        read_object_size(&reader, 0).unwrap()
    }

    // --- Hand-built byte images: format fidelity without the encoder ---

    #[test]
    fn test_short_string_hi() {
        let (v, n) = decode(&[0x02, 0x68, 0x69]);
        assert_eq!(v, Value::from("hi"));
        assert_eq!(n, 3);
    }

    #[test]
    fn test_empty_short_string() {
        let (v, n) = decode(&[0x00]);
        assert_eq!(v, Value::from(""));
        assert_eq!(n, 1);
    }

    #[test]
    fn test_short_uri() {
        let mut bytes = vec![0x80 | 9];
        bytes.extend_from_slice(b"urn:a:b:c");
        let (v, n) = decode(&bytes);
        assert_eq!(v, Value::Uri(Uri::new("urn:a:b:c")));
        assert_eq!(n, 10);
    }

    #[test]
    fn test_short_keyword() {
        let mut bytes = vec![0xC0 | 4];
        bytes.extend_from_slice(b"a/bc");
        let (v, n) = decode(&bytes);
        assert_eq!(v, Value::Keyword(Keyword::new("a/bc")));
        assert_eq!(n, 5);
    }

    #[test]
    fn test_short_long_widths() {
        let (v, n) = decode(&[0xD1, 0x07]);
        assert_eq!(v, Value::Long(7));
        assert_eq!(n, 2);

        // Negative: sign-extends from the first payload byte
        let (v, _) = decode(&[0xD1, 0xFF]);
        assert_eq!(v, Value::Long(-1));

        let (v, n) = decode(&[0xD2, 0x01, 0x00]);
        assert_eq!(v, Value::Long(256));
        assert_eq!(n, 3);

        let (v, _) = decode(&[0xD8, 0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(v, Value::Long(i64::MIN));
    }

    #[test]
    fn test_full_form_long() {
        let mut bytes = vec![0xE0];
        bytes.extend_from_slice(&42i64.to_be_bytes());
        let (v, n) = decode(&bytes);
        assert_eq!(v, Value::Long(42));
        assert_eq!(n, 9);
    }

    #[test]
    fn test_full_form_double() {
        let mut bytes = vec![0xE1];
        bytes.extend_from_slice(&3.5f64.to_be_bytes());
        let (v, n) = decode(&bytes);
        assert_eq!(v, Value::Double(3.5));
        assert_eq!(n, 9);
    }

    #[test]
    fn test_full_form_string_ext_length() {
        let payload = "x".repeat(130);
        let mut bytes = vec![0xE2, 130];
        bytes.extend_from_slice(payload.as_bytes());
        let (v, n) = decode(&bytes);
        assert_eq!(v, Value::String(payload));
        assert_eq!(n, 132);
    }

    #[test]
    fn test_full_form_string_two_byte_length() {
        let payload = "y".repeat(300);
        let mut bytes = vec![0xF2, 0x01, 0x2C]; // 300 big-endian
        bytes.extend_from_slice(payload.as_bytes());
        let (v, n) = decode(&bytes);
        assert_eq!(v, Value::String(payload));
        assert_eq!(n, 1 + 2 + 300);
    }

    #[test]
    fn test_full_form_string_four_byte_length() {
        let len = 40_000usize;
        let payload = "z".repeat(len);
        // Top bit of the first short set: high 15 bits ++ low 16 bits
        let mut bytes = vec![0xF2, 0x80, 0x00, 0x9C, 0x40]; // 0x9C40 = 40000
        bytes.extend_from_slice(payload.as_bytes());
        let (v, n) = decode(&bytes);
        assert_eq!(v, Value::String(payload));
        assert_eq!(n, 1 + 4 + len);
    }

    #[test]
    fn test_instant_payload() {
        let mut bytes = vec![0xE9];
        bytes.extend_from_slice(&1_700_000_000i64.to_be_bytes());
        bytes.extend_from_slice(&123_456_789u32.to_be_bytes());
        let (v, n) = decode(&bytes);
        assert_eq!(v, Value::Instant(Instant::new(1_700_000_000, 123_456_789)));
        assert_eq!(n, 13);
    }

    #[test]
    fn test_uuid_low_then_high() {
        let low: u64 = 0x1122_3344_5566_7788;
        let high: u64 = 0x99AA_BBCC_DDEE_FF00;
        let mut bytes = vec![0xEB];
        bytes.extend_from_slice(&low.to_be_bytes());
        bytes.extend_from_slice(&high.to_be_bytes());
        let (v, n) = decode(&bytes);
        let expected = Uuid::from_u128(((high as u128) << 64) | low as u128);
        assert_eq!(v, Value::Uuid(expected));
        assert_eq!(n, 17);
    }

    #[test]
    fn test_typed_literal_splits_first_space() {
        let payload = b"http://www.w3.org/2001/XMLSchema#string a b c";
        let mut bytes = vec![0xED, payload.len() as u8];
        bytes.extend_from_slice(payload);
        let (v, _) = decode(&bytes);
        match v {
            Value::TypedLiteral(t) => {
                assert_eq!(t.datatype.as_str(), "http://www.w3.org/2001/XMLSchema#string");
                assert_eq!(t.lexical, "a b c");
            }
            other => panic!("expected typed literal, got {:?}", other),
        }
    }

    #[test]
    fn test_sequence_homogeneous_long() {
        // Outer header (type 4, 1-byte length), body: marker 0xD1 + 3 bytes
        let (v, n) = decode(&[0xE4, 0x04, 0xD1, 0x01, 0x02, 0x03]);
        assert_eq!(
            v,
            Value::Sequence(vec![Value::Long(1), Value::Long(2), Value::Long(3)])
        );
        assert_eq!(n, 6);
    }

    #[test]
    fn test_sequence_heterogeneous() {
        // seq0 = 0, then each element self-describes
        let bytes = [0xE4, 0x05, 0x00, 0x01, b'a', 0xD1, 0x05];
        let (v, n) = decode(&bytes);
        assert_eq!(v, Value::Sequence(vec![Value::from("a"), Value::Long(5)]));
        assert_eq!(n, 7);
    }

    #[test]
    fn test_sequence_homogeneous_tagged_strings() {
        // seq0 names type 2; each element is a 1-byte length + bytes
        let bytes = [0xE4, 0x06, 0xE2, 0x01, b'a', 0x02, b'b', b'c'];
        let (v, _) = decode(&bytes);
        assert_eq!(
            v,
            Value::Sequence(vec![Value::from("a"), Value::from("bc")])
        );
    }

    #[test]
    fn test_heterogeneous_sequence_of_one() {
        let bytes = [0xE4, 0x03, 0x00, 0x01, b'a'];
        let (v, n) = decode(&bytes);
        assert_eq!(v, Value::Sequence(vec![Value::from("a")]));
        assert_eq!(n, 5);
    }

    #[test]
    fn test_empty_sequence() {
        let (v, n) = decode(&[0xE4, 0x00]);
        assert_eq!(v, Value::Sequence(vec![]));
        assert_eq!(n, 2);
    }

    #[test]
    fn test_map_pairs_in_order() {
        // {"a" 1, "b" 2} as a heterogeneous body of 4 elements
        let bytes = [
            0xE5, 0x09, 0x00, 0x01, b'a', 0xD1, 0x01, 0x01, b'b', 0xD1, 0x02,
        ];
        let (v, _) = decode(&bytes);
        assert_eq!(
            v,
            Value::Map(vec![
                (Value::from("a"), Value::Long(1)),
                (Value::from("b"), Value::Long(2)),
            ])
        );
    }

    #[test]
    fn test_map_odd_element_count_rejected() {
        // Body frames exactly one element
        let bytes = [0xE5, 0x03, 0x00, 0x01, b'a'];
        let reader = SliceReader::new(&bytes);
        assert!(matches!(
            read_object_size(&reader, 0).unwrap_err(),
            CodecError::InvalidPayload { kind: "map", .. }
        ));
    }

    // --- Error paths ---

    #[test]
    fn test_malformed_width_zero() {
        let reader = SliceReader::new(&[0xD0, 0x00]);
        assert!(matches!(
            read_object_size(&reader, 0).unwrap_err(),
            CodecError::MalformedHeader { byte: 0xD0, pos: 0 }
        ));
    }

    #[test]
    fn test_malformed_width_over_eight() {
        let bytes = [0xD9, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let reader = SliceReader::new(&bytes);
        assert!(matches!(
            read_object_size(&reader, 0).unwrap_err(),
            CodecError::MalformedHeader { byte: 0xD9, .. }
        ));
    }

    #[test]
    fn test_illegal_datatype_in_array() {
        // seq0 = 0xEF names type 15, absent from the decoder table
        let bytes = [0xE4, 0x03, 0xEF, 0x00, 0x00];
        let reader = SliceReader::new(&bytes);
        assert!(matches!(
            read_object_size(&reader, 0).unwrap_err(),
            CodecError::IllegalArrayType(15)
        ));
    }

    #[test]
    fn test_unknown_user_type() {
        let payload = b"com.example.Money 12.50";
        let mut bytes = vec![0xEF, payload.len() as u8];
        bytes.extend_from_slice(payload);
        let reader = SliceReader::new(&bytes);
        match read_object_size(&reader, 0).unwrap_err() {
            CodecError::UnknownUserType(name) => assert_eq!(name, "com.example.Money"),
            other => panic!("expected UnknownUserType, got {:?}", other),
        }
    }

    #[test]
    fn test_short_read_propagates() {
        let reader = SliceReader::new(&[0x05, b'a', b'b']);
        assert!(matches!(
            read_object_size(&reader, 0).unwrap_err(),
            CodecError::ShortRead { .. }
        ));
    }

    #[test]
    fn test_invalid_utf8_propagates() {
        let reader = SliceReader::new(&[0x02, 0xFF, 0xFE]);
        assert!(matches!(
            read_object_size(&reader, 0).unwrap_err(),
            CodecError::InvalidUtf8 { .. }
        ));
    }

    #[test]
    fn test_decode_at_offset() {
        // Values decode from arbitrary absolute positions
        let bytes = [0xAA, 0xBB, 0x02, 0x68, 0x69];
        let reader = SliceReader::new(&bytes);
        let (v, n) = read_object_size(&reader, 2).unwrap();
        assert_eq!(v, Value::from("hi"));
        assert_eq!(n, 3);
    }
}
