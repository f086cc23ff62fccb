//! Canonical encoder
//!
//! Produces the stored byte representation for every wire kind: short
//! header forms whenever the payload length allows, the full type form with
//! the tightest length flavor otherwise, and the homogeneous sequence
//! encodings when every element shares one type. Decoding an encoder
//! output and re-encoding the result reproduces the bytes exactly.
//!
//! Booleans and node references have no stored form — they live in the
//! encapsulated-ID space — so they are rejected here with
//! [`CodecError::Unencodable`].

use crate::error::{CodecError, Result};
use crate::header::{
    self, EXT_LEN_MAX, FULL_EXT_MARKER, FULL_LEN_MARKER, LONG_LEN_MAX, LONG_WIDTH_MARKER,
    SHORT_KEYWORD_MARKER, SHORT_KEYWORD_MAX, SHORT_LEN_MAX, SHORT_STRING_MAX, SHORT_URI_MARKER,
    SHORT_URI_MAX,
};
use crate::value::Value;

/// Encode `value` into its stored representation, appending to `out`.
pub fn encode_object(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::String(s) if s.len() <= SHORT_STRING_MAX => {
            out.push(s.len() as u8);
            out.extend_from_slice(s.as_bytes());
            Ok(())
        }
        Value::Uri(u) if u.as_str().len() <= SHORT_URI_MAX => {
            out.push(SHORT_URI_MARKER | u.as_str().len() as u8);
            out.extend_from_slice(u.as_str().as_bytes());
            Ok(())
        }
        Value::Keyword(k) if k.name().len() <= SHORT_KEYWORD_MAX => {
            out.push(SHORT_KEYWORD_MARKER | k.name().len() as u8);
            out.extend_from_slice(k.name().as_bytes());
            Ok(())
        }
        Value::Boolean(_) => Err(CodecError::Unencodable("boolean")),
        Value::NodeRef(_) => Err(CodecError::Unencodable("node reference")),
        _ => {
            let code = wire_type_code(value);
            if let Some(payload) = fixed_payload(value) {
                out.push(FULL_EXT_MARKER | code);
                out.extend_from_slice(&payload);
                Ok(())
            } else {
                let payload = var_bytes(value)?;
                push_length_header(code, payload.len(), out)?;
                out.extend_from_slice(&payload);
                Ok(())
            }
        }
    }
}

/// Encode `value` into a fresh buffer.
pub fn encoded_object(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_object(value, &mut out)?;
    Ok(out)
}

/// The full-form type code for a wire kind. Only callable for values with
/// a stored representation.
fn wire_type_code(value: &Value) -> u8 {
    match value {
        Value::Long(_) => header::TYPE_LONG,
        Value::Double(_) => header::TYPE_DOUBLE,
        Value::String(_) => header::TYPE_STRING,
        Value::Uri(_) => header::TYPE_URI,
        Value::Sequence(_) => header::TYPE_SEQUENCE,
        Value::Map(_) => header::TYPE_MAP,
        Value::BigInt(_) => header::TYPE_BIG_INT,
        Value::Decimal(_) => header::TYPE_BIG_DEC,
        Value::Date(_) => header::TYPE_DATE,
        Value::Instant(_) => header::TYPE_INSTANT,
        Value::Keyword(_) => header::TYPE_KEYWORD,
        Value::Uuid(_) => header::TYPE_UUID,
        Value::Blob(_) => header::TYPE_BLOB,
        Value::TypedLiteral(_) => header::TYPE_TYPED_LITERAL,
        Value::User(_) => header::TYPE_USER,
        Value::Boolean(_) | Value::NodeRef(_) => {
            unreachable!("inline-only kinds are rejected before dispatch")
        }
    }
}

/// Payload bytes for the fixed-width kinds; `None` for variable-length
/// kinds. The length bits of the header are ignored for these types.
fn fixed_payload(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Long(v) => Some(v.to_be_bytes().to_vec()),
        Value::Double(v) => Some(v.to_be_bytes().to_vec()),
        Value::Date(d) => Some(d.millis().to_be_bytes().to_vec()),
        Value::Instant(i) => {
            let mut b = Vec::with_capacity(12);
            b.extend_from_slice(&i.secs().to_be_bytes());
            b.extend_from_slice(&i.nanos().to_be_bytes());
            Some(b)
        }
        Value::Uuid(u) => {
            let bits = u.as_u128();
            let mut b = Vec::with_capacity(16);
            b.extend_from_slice(&((bits as u64).to_be_bytes()));
            b.extend_from_slice(&(((bits >> 64) as u64).to_be_bytes()));
            Some(b)
        }
        _ => None,
    }
}

/// Payload bytes for the variable-length kinds, without the length prefix.
fn var_bytes(value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::String(s) => Ok(s.as_bytes().to_vec()),
        Value::Uri(u) => Ok(u.as_str().as_bytes().to_vec()),
        Value::Keyword(k) => Ok(k.name().as_bytes().to_vec()),
        Value::BigInt(v) => Ok(v.to_signed_bytes_be()),
        // Canonical lexical form keeps the scale unambiguous
        Value::Decimal(v) => Ok(v.to_string().into_bytes()),
        Value::Blob(b) => Ok(b.clone()),
        Value::TypedLiteral(t) => {
            if t.datatype.as_str().contains(' ') {
                return Err(CodecError::invalid_payload(
                    "typed literal",
                    "datatype URI contains a space",
                ));
            }
            Ok(format!("{} {}", t.datatype.as_str(), t.lexical).into_bytes())
        }
        Value::User(u) => {
            if u.class_name.contains(' ') {
                return Err(CodecError::invalid_payload(
                    "user literal",
                    "class name contains a space",
                ));
            }
            Ok(format!("{} {}", u.class_name, u.lexical).into_bytes())
        }
        Value::Sequence(items) => {
            let refs: Vec<&Value> = items.iter().collect();
            sequence_body(&refs)
        }
        Value::Map(pairs) => {
            let refs: Vec<&Value> = pairs.iter().flat_map(|(k, v)| [k, v]).collect();
            sequence_body(&refs)
        }
        _ => unreachable!("fixed-width kinds are handled by fixed_payload"),
    }
}

/// Write the full-form header and length prefix for a `len`-byte payload,
/// choosing the tightest flavor: 1-byte length up to 255, 2-byte below
/// 0x8000, 4-byte (top bit set) up to 31 bits.
fn push_length_header(code: u8, len: usize, out: &mut Vec<u8>) -> Result<()> {
    if len <= EXT_LEN_MAX {
        out.push(FULL_EXT_MARKER | code);
        out.push(len as u8);
    } else if len <= SHORT_LEN_MAX {
        out.push(FULL_LEN_MARKER | code);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else if len <= LONG_LEN_MAX {
        out.push(FULL_LEN_MARKER | code);
        out.extend_from_slice(&((len as u32) | 0x8000_0000).to_be_bytes());
    } else {
        return Err(CodecError::invalid_payload(
            "length",
            format!("payload of {} bytes exceeds the 31-bit length limit", len),
        ));
    }
    Ok(())
}

/// Build a sequence/map body: the element-typing byte followed by the
/// elements. Elects the homogeneous fixed-width long form when every
/// element is a long, the homogeneous tagged form when every element
/// shares one scalar type and fits a 1-byte length, and the heterogeneous
/// form otherwise. An empty body is zero bytes.
fn sequence_body(items: &[&Value]) -> Result<Vec<u8>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let longs: Option<Vec<i64>> = items.iter().map(|v| v.as_long()).collect();
    if let Some(longs) = longs {
        let width = longs.iter().copied().map(long_width).max().unwrap_or(1);
        let mut body = Vec::with_capacity(1 + width * longs.len());
        body.push(LONG_WIDTH_MARKER | width as u8);
        for v in longs {
            push_long_be(v, width, &mut body);
        }
        return Ok(body);
    }

    if let Some(body) = homogeneous_tagged_body(items)? {
        return Ok(body);
    }

    let mut body = vec![0u8];
    for v in items {
        encode_object(v, &mut body)?;
    }
    Ok(body)
}

/// Try the homogeneous tagged form: every element must share one scalar
/// type code and, for variable-length types, fit the 1-byte length each
/// element carries under the `ext` flavor. Returns `None` when the
/// election fails and the body must be heterogeneous.
fn homogeneous_tagged_body(items: &[&Value]) -> Result<Option<Vec<u8>>> {
    let first = items[0];
    if !homogeneous_eligible(first) {
        return Ok(None);
    }
    let code = wire_type_code(first);
    if items
        .iter()
        .any(|v| !homogeneous_eligible(v) || wire_type_code(v) != code)
    {
        return Ok(None);
    }

    let mut body = vec![FULL_EXT_MARKER | code];
    for v in items {
        if let Some(payload) = fixed_payload(v) {
            body.extend_from_slice(&payload);
        } else {
            let payload = var_bytes(v)?;
            if payload.len() > EXT_LEN_MAX {
                return Ok(None);
            }
            body.push(payload.len() as u8);
            body.extend_from_slice(&payload);
        }
    }
    Ok(Some(body))
}

/// Scalar kinds eligible for the homogeneous tagged form. Longs take the
/// fixed-width form instead; nested sequences/maps and user literals fall
/// back to heterogeneous bodies.
fn homogeneous_eligible(value: &Value) -> bool {
    matches!(
        value,
        Value::Double(_)
            | Value::String(_)
            | Value::Uri(_)
            | Value::BigInt(_)
            | Value::Decimal(_)
            | Value::Date(_)
            | Value::Instant(_)
            | Value::Keyword(_)
            | Value::Uuid(_)
            | Value::Blob(_)
            | Value::TypedLiteral(_)
    )
}

/// Minimal byte width that holds `v` as a big-endian signed integer.
fn long_width(v: i64) -> usize {
    for w in 1..8 {
        let bound = 1i64 << (8 * w - 1);
        if v >= -bound && v < bound {
            return w;
        }
    }
    8
}

/// Append the low `width` big-endian bytes of `v`.
fn push_long_be(v: i64, width: usize, out: &mut Vec<u8>) {
    for i in (0..width).rev() {
        out.push((v >> (8 * i)) as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::{Date, Instant};
    use crate::value::{Keyword, TypedLiteral, Uri, UserLiteral};

    // --- Literal byte images ---

    #[test]
    fn test_encode_hi() {
        assert_eq!(encoded_object(&Value::from("hi")).unwrap(), vec![0x02, 0x68, 0x69]);
    }

    #[test]
    fn test_encode_long_sequence_scenario() {
        let v = Value::Sequence(vec![Value::Long(1), Value::Long(2), Value::Long(3)]);
        assert_eq!(
            encoded_object(&v).unwrap(),
            vec![0xE4, 0x04, 0xD1, 0x01, 0x02, 0x03]
        );
    }

    #[test]
    fn test_encode_standalone_long() {
        let mut expected = vec![0xE0];
        expected.extend_from_slice(&7i64.to_be_bytes());
        assert_eq!(encoded_object(&Value::Long(7)).unwrap(), expected);
    }

    // --- Length-scheme boundaries ---

    #[test]
    fn test_string_length_boundaries() {
        let s127 = "a".repeat(127);
        let enc = encoded_object(&Value::from(s127.as_str())).unwrap();
        assert_eq!(enc[0], 0x7F);
        assert_eq!(enc.len(), 128);

        let s128 = "a".repeat(128);
        let enc = encoded_object(&Value::from(s128.as_str())).unwrap();
        assert_eq!(&enc[..2], &[0xE2, 128]);

        let s255 = "a".repeat(255);
        let enc = encoded_object(&Value::from(s255.as_str())).unwrap();
        assert_eq!(&enc[..2], &[0xE2, 255]);

        let s256 = "a".repeat(256);
        let enc = encoded_object(&Value::from(s256.as_str())).unwrap();
        assert_eq!(&enc[..3], &[0xF2, 0x01, 0x00]);

        let s32767 = "a".repeat(32767);
        let enc = encoded_object(&Value::from(s32767.as_str())).unwrap();
        assert_eq!(&enc[..3], &[0xF2, 0x7F, 0xFF]);

        let s32768 = "a".repeat(32768);
        let enc = encoded_object(&Value::from(s32768.as_str())).unwrap();
        assert_eq!(&enc[..5], &[0xF2, 0x80, 0x00, 0x80, 0x00]);
    }

    #[test]
    fn test_uri_boundary() {
        let u63 = Uri::new("u".repeat(63));
        let enc = encoded_object(&Value::Uri(u63)).unwrap();
        assert_eq!(enc[0], 0xBF);

        let u64_ = Uri::new("u".repeat(64));
        let enc = encoded_object(&Value::Uri(u64_)).unwrap();
        assert_eq!(&enc[..2], &[0xE3, 64]);
    }

    #[test]
    fn test_keyword_boundary() {
        let k15 = Keyword::new("k".repeat(15));
        let enc = encoded_object(&Value::Keyword(k15)).unwrap();
        assert_eq!(enc[0], 0xCF);

        let k16 = Keyword::new("k".repeat(16));
        let enc = encoded_object(&Value::Keyword(k16)).unwrap();
        assert_eq!(&enc[..2], &[0xEA, 16]);
    }

    // --- Sequence form election ---

    #[test]
    fn test_long_sequence_width_election() {
        let v = Value::Sequence(vec![Value::Long(1), Value::Long(300)]);
        // 300 needs 2 bytes, so every element is written at width 2
        assert_eq!(
            encoded_object(&v).unwrap(),
            vec![0xE4, 0x05, 0xD2, 0x00, 0x01, 0x01, 0x2C]
        );
    }

    #[test]
    fn test_negative_long_sequence() {
        let v = Value::Sequence(vec![Value::Long(-1), Value::Long(-128)]);
        assert_eq!(
            encoded_object(&v).unwrap(),
            vec![0xE4, 0x03, 0xD1, 0xFF, 0x80]
        );
    }

    #[test]
    fn test_homogeneous_string_sequence() {
        let v = Value::Sequence(vec![Value::from("a"), Value::from("bc")]);
        assert_eq!(
            encoded_object(&v).unwrap(),
            vec![0xE4, 0x06, 0xE2, 0x01, b'a', 0x02, b'b', b'c']
        );
    }

    #[test]
    fn test_mixed_sequence_is_heterogeneous() {
        let v = Value::Sequence(vec![Value::from("a"), Value::Long(5)]);
        let enc = encoded_object(&v).unwrap();
        assert_eq!(enc[2], 0x00, "mixed elements take the heterogeneous marker");
    }

    #[test]
    fn test_oversized_element_falls_back_to_heterogeneous() {
        let long_string = "x".repeat(300);
        let v = Value::Sequence(vec![Value::from("a"), Value::from(long_string.as_str())]);
        let enc = encoded_object(&v).unwrap();
        // seq0 right after the 2-byte outer length
        assert_eq!(enc[0], 0xF4);
        assert_eq!(enc[3], 0x00);
    }

    #[test]
    fn test_empty_sequence_and_map() {
        assert_eq!(encoded_object(&Value::Sequence(vec![])).unwrap(), vec![0xE4, 0x00]);
        assert_eq!(encoded_object(&Value::Map(vec![])).unwrap(), vec![0xE5, 0x00]);
    }

    // --- Inline-only kinds ---

    #[test]
    fn test_boolean_unencodable() {
        assert!(matches!(
            encode_object(&Value::Boolean(true), &mut Vec::new()).unwrap_err(),
            CodecError::Unencodable("boolean")
        ));
    }

    #[test]
    fn test_node_ref_unencodable() {
        assert!(matches!(
            encode_object(&Value::NodeRef(crate::value::NodeId(1)), &mut Vec::new()).unwrap_err(),
            CodecError::Unencodable("node reference")
        ));
    }

    // --- Separator constraints ---

    #[test]
    fn test_typed_literal_space_in_datatype_rejected() {
        let v = Value::TypedLiteral(Box::new(TypedLiteral::new("bad uri", "x")));
        assert!(encode_object(&v, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_user_literal_space_in_class_rejected() {
        let v = Value::User(Box::new(UserLiteral::new("bad class", "x")));
        assert!(encode_object(&v, &mut Vec::new()).is_err());
    }

    // --- Widths ---

    #[test]
    fn test_long_width() {
        assert_eq!(long_width(0), 1);
        assert_eq!(long_width(127), 1);
        assert_eq!(long_width(128), 2);
        assert_eq!(long_width(-128), 1);
        assert_eq!(long_width(-129), 2);
        assert_eq!(long_width(i64::MAX), 8);
        assert_eq!(long_width(i64::MIN), 8);
    }

    #[test]
    fn test_fixed_payload_shapes() {
        assert_eq!(fixed_payload(&Value::Double(1.5)).unwrap().len(), 8);
        assert_eq!(
            fixed_payload(&Value::Date(Date::from_millis(1))).unwrap().len(),
            8
        );
        assert_eq!(
            fixed_payload(&Value::Instant(Instant::new(1, 2))).unwrap().len(),
            12
        );
        assert_eq!(
            fixed_payload(&Value::Uuid(uuid::Uuid::from_u128(7))).unwrap().len(),
            16
        );
        assert!(fixed_payload(&Value::from("s")).is_none());
    }
}
