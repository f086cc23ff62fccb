//! Error types for the durable value codec

use thiserror::Error;

/// Result type alias using our CodecError
pub type Result<T> = std::result::Result<T, CodecError>;

/// Codec error type
///
/// Decode errors are value-typed and carry enough context for the caller to
/// decide whether to abort the enclosing transaction. The codec never
/// retries and never logs.
#[derive(Error, Debug)]
pub enum CodecError {
    /// A header byte the classifier cannot dispatch
    #[error("unrecognized header byte 0x{byte:02x} at position {pos}")]
    MalformedHeader { byte: u8, pos: u64 },

    /// Homogeneous sequence header names a type code with no decoder
    #[error("illegal datatype {0} in array")]
    IllegalArrayType(u8),

    /// User-defined decoder hit a class name absent from the registry
    #[error("unknown user type: {0}")]
    UnknownUserType(String),

    /// A registered user-type constructor rejected its payload
    #[error("constructor for user type {class} failed: {message}")]
    UserConstructor { class: String, message: String },

    /// The reader could not supply the requested bytes
    #[error("short read at position {pos}: wanted {wanted} bytes, got {got}")]
    ShortRead { pos: u64, wanted: usize, got: usize },

    /// A string payload is not valid UTF-8
    #[error("invalid UTF-8 in payload at position {pos}")]
    InvalidUtf8 { pos: u64 },

    /// A payload parsed but its lexical form is invalid for the type
    #[error("invalid {kind} payload: {message}")]
    InvalidPayload { kind: &'static str, message: String },

    /// The value kind has no stored-byte representation
    #[error("{0} values have no stored representation; use the encapsulated-ID scheme")]
    Unencodable(&'static str),
}

impl CodecError {
    /// Create an invalid-payload error
    pub fn invalid_payload(kind: &'static str, msg: impl Into<String>) -> Self {
        CodecError::InvalidPayload {
            kind,
            message: msg.into(),
        }
    }

    /// Create a user-constructor error
    pub fn user_constructor(class: impl Into<String>, msg: impl Into<String>) -> Self {
        CodecError::UserConstructor {
            class: class.into(),
            message: msg.into(),
        }
    }
}
