//! # Strata DB Codec
//!
//! Durable value codec for the Strata graph database.
//!
//! This crate provides:
//! - The tagged byte format: [`read_object_size`]/[`read_object`] over a
//!   [`PagedReader`], and the canonical [`encode_object`] inverse
//! - The encapsulated 64-bit ID scheme ([`ObjectId`]): small strings,
//!   keywords, longs, dates, instants, booleans, and internal node
//!   references packed directly into an identifier
//! - The prefix comparator ([`compare_object_to_slot`]) that orders a
//!   materialized value against an index slot holding a possibly truncated
//!   stored value
//!
//! ## Design Principles
//!
//! 1. **Pure and stateless**: no I/O, no locks, no logging on the decode
//!    path; byte access goes through the caller's reader
//! 2. **Big-endian, UTF-8, no padding**: length fields count payload only
//! 3. **One canonical encoding per value**: decode then encode reproduces
//!    the stored bytes exactly
//!
//! ## Example
//!
//! ```
//! use strata_db_codec::{encoded_object, read_object_size, SliceReader, Value};
//!
//! let bytes = encoded_object(&Value::from("hi")).unwrap();
//! assert_eq!(bytes, [0x02, 0x68, 0x69]);
//!
//! let reader = SliceReader::new(&bytes);
//! let (value, consumed) = read_object_size(&reader, 0).unwrap();
//! assert_eq!(value, Value::from("hi"));
//! assert_eq!(consumed, 3);
//! ```

pub mod compare;
pub mod decode;
pub mod encode;
pub mod error;
pub mod header;
pub mod inline;
pub mod reader;
pub mod registry;
pub mod temporal;
pub mod value;

// Re-export main types
pub use compare::{compare_object_to_slot, partial_utf8_tail};
pub use decode::{read_object, read_object_size, ObjectReader};
pub use encode::{encode_object, encoded_object};
pub use error::{CodecError, Result};
pub use header::{node_header_length, type_info};
pub use inline::ObjectId;
pub use reader::{PagedReader, SliceReader};
pub use registry::{TypeRegistry, UserConstructor};
pub use temporal::{Date, Instant};
pub use value::{Keyword, NodeId, TypedLiteral, Uri, UserLiteral, Value};
