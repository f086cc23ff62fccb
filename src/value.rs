//! Value - polymorphic object value type
//!
//! The object slot of a stored triple can hold various types:
//! - Strings, URIs, keywords
//! - Numbers of arbitrary precision (long, double, big integer, big decimal)
//! - Dates and instants, UUIDs, opaque byte blobs
//! - Typed literals, sequences, maps
//! - Booleans and internal node references (inline-only, see below)
//!
//! ## Wire representation
//!
//! Every variant except `Boolean` and `NodeRef` has a stored byte form with
//! a numeric type code (see [`crate::header`]). Booleans and node references
//! exist only in the encapsulated 64-bit ID space ([`crate::inline`]); the
//! byte encoder rejects them.
//!
//! ## Equality
//!
//! `PartialEq` compares doubles by bit pattern so NaN values round-trip
//! through the codec and still compare equal. All other variants use
//! structural equality; maps compare as ordered pair lists.

use crate::temporal::{Date, Instant};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A URI carried as its exact spelling.
///
/// No normalization happens on construction: the stored byte form must
/// reproduce the original character sequence byte for byte.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Uri(String);

impl Uri {
    pub fn new(s: impl Into<String>) -> Self {
        Uri(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Uri {
    fn from(s: &str) -> Self {
        Uri(s.to_string())
    }
}

impl From<String> for Uri {
    fn from(s: String) -> Self {
        Uri(s)
    }
}

/// A namespaced symbol, stored without its leading `:` sigil.
///
/// `Keyword::new("db/ident")` prints as `:db/ident`; its name (used for
/// encoding and comparison) is `db/ident`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Keyword(String);

impl Keyword {
    /// Construct from a name. A leading `:` is stripped if present.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.strip_prefix(':') {
            Some(rest) => Keyword(rest.to_string()),
            None => Keyword(name),
        }
    }

    /// The name without the leading sigil.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl From<&str> for Keyword {
    fn from(s: &str) -> Self {
        Keyword::new(s)
    }
}

/// An internal node slot index in the graph layer.
///
/// Node references live only in the encapsulated-ID space; the index fits
/// in 60 bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// A literal paired with the URI of its datatype.
///
/// On the wire the two are carried as one string, `"<uri> <lexical>"`,
/// split on the first space when decoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedLiteral {
    pub datatype: Uri,
    pub lexical: String,
}

impl TypedLiteral {
    pub fn new(datatype: impl Into<Uri>, lexical: impl Into<String>) -> Self {
        TypedLiteral {
            datatype: datatype.into(),
            lexical: lexical.into(),
        }
    }
}

impl fmt::Display for TypedLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"^^{}", self.lexical, self.datatype)
    }
}

/// A value of a user-registered class, carried as `(class name, lexical)`.
///
/// Decoding routes these through the [`crate::registry::TypeRegistry`];
/// unregistered class names are decode errors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserLiteral {
    pub class_name: String,
    pub lexical: String,
}

impl UserLiteral {
    pub fn new(class_name: impl Into<String>, lexical: impl Into<String>) -> Self {
        UserLiteral {
            class_name: class_name.into(),
            lexical: lexical.into(),
        }
    }
}

impl fmt::Display for UserLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} \"{}\"", self.class_name, self.lexical)
    }
}

/// Polymorphic value type for stored objects
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer
    Long(i64),
    /// 64-bit IEEE-754 float
    Double(f64),
    /// UTF-8 string
    String(String),
    /// URI, carried as its spelling
    Uri(Uri),
    /// Ordered sequence of values
    Sequence(Vec<Value>),
    /// Ordered list of key/value pairs
    Map(Vec<(Value, Value)>),
    /// Arbitrary-precision integer
    /// Boxed to keep enum size small
    BigInt(Box<BigInt>),
    /// Arbitrary-precision decimal
    /// Boxed to keep enum size small
    Decimal(Box<BigDecimal>),
    /// Millisecond-granular point in time
    Date(Date),
    /// Nanosecond-granular point in time
    Instant(Instant),
    /// Namespaced symbol
    Keyword(Keyword),
    /// 128-bit UUID
    Uuid(Uuid),
    /// Opaque byte sequence
    Blob(Vec<u8>),
    /// Literal tagged with a datatype URI
    TypedLiteral(Box<TypedLiteral>),
    /// Value of a user-registered class
    User(Box<UserLiteral>),
    /// Boolean — inline-only, no stored byte form
    Boolean(bool),
    /// Internal node reference — inline-only, no stored byte form
    NodeRef(NodeId),
}

impl Value {
    /// Check if this is a string-shaped kind (string, URI, keyword) —
    /// the kinds the prefix comparator reduces to a canonical string.
    pub fn is_string_shaped(&self) -> bool {
        matches!(
            self,
            Value::String(_) | Value::Uri(_) | Value::Keyword(_)
        )
    }

    /// Canonical string form of a string-shaped value: the string itself,
    /// the URI spelling, or the keyword name without its sigil.
    pub fn canonical_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Uri(u) => Some(u.as_str()),
            Value::Keyword(k) => Some(k.name()),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as sequence slice
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as map pair slice
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Demote a map to key-unique last-wins pairs.
    ///
    /// The codec contract is an ordered pair list that preserves duplicate
    /// keys exactly as stored; consumers that want mapping semantics call
    /// this to keep only the last pair for each key, in first-occurrence
    /// order.
    pub fn map_last_wins(pairs: &[(Value, Value)]) -> Vec<(Value, Value)> {
        let mut out: Vec<(Value, Value)> = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            if let Some(slot) = out.iter_mut().find(|(ek, _)| ek == k) {
                slot.1 = v.clone();
            } else {
                out.push((k.clone(), v.clone()));
            }
        }
        out
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Long(a), Value::Long(b)) => a == b,
            // Bit-pattern equality: NaN == NaN, -0.0 != +0.0
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Uri(a), Value::Uri(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Instant(a), Value::Instant(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::TypedLiteral(a), Value::TypedLiteral(b)) => a == b,
            (Value::User(a), Value::User(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::NodeRef(a), Value::NodeRef(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Long(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Uri(u) => write!(f, "<{}>", u),
            Value::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::BigInt(v) => write!(f, "{}N", v),
            Value::Decimal(v) => write!(f, "{}M", v),
            Value::Date(d) => write!(f, "#date \"{}\"", d),
            Value::Instant(i) => write!(f, "#instant \"{}\"", i),
            Value::Keyword(k) => write!(f, "{}", k),
            Value::Uuid(u) => write!(f, "#uuid \"{}\"", u),
            Value::Blob(b) => write!(f, "#bytes[{}]", b.len()),
            Value::TypedLiteral(t) => write!(f, "{}", t),
            Value::User(u) => write!(f, "{}", u),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::NodeRef(n) => write!(f, "{}", n),
        }
    }
}

// === Convenient From implementations ===

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Long(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Uri> for Value {
    fn from(u: Uri) -> Self {
        Value::Uri(u)
    }
}

impl From<Keyword> for Value {
    fn from(k: Keyword) -> Self {
        Value::Keyword(k)
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Self {
        // Normalize: if it fits in i64, use Long
        if let Some(i) = v.to_i64() {
            Value::Long(i)
        } else {
            Value::BigInt(Box::new(v))
        }
    }
}

impl From<BigDecimal> for Value {
    fn from(v: BigDecimal) -> Self {
        Value::Decimal(Box::new(v))
    }
}

impl From<Date> for Value {
    fn from(d: Date) -> Self {
        Value::Date(d)
    }
}

impl From<Instant> for Value {
    fn from(i: Instant) -> Self {
        Value::Instant(i)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Sequence(v)
    }
}

impl From<NodeId> for Value {
    fn from(n: NodeId) -> Self {
        Value::NodeRef(n)
    }
}
