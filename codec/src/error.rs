//! Error types for translator resolution, metadata construction, and
//! wire/tree transcoding.

use thiserror::Error;

/// Errors produced by the codec.
///
/// Resolution errors ([`NoTranslator`](Self::NoTranslator),
/// [`DuplicateField`](Self::DuplicateField)) surface while a record's
/// metadata is being built and indicate a programming error in the record
/// declaration. The remaining variants describe malformed or mismatched
/// input encountered while decoding.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Neither an exact nor an ancestor translator is registered for a type.
    #[error("no translator registered for type `{type_name}` or any declared ancestor")]
    NoTranslator { type_name: &'static str },

    /// A field name carried on the wire is not declared by the target record.
    #[error("field '{field}' does not exist on record '{record}'")]
    MissingField { field: String, record: &'static str },

    /// Two persisted fields of one record share a name.
    #[error("field '{field}' is declared twice on record '{record}' (by {first} and {second})")]
    DuplicateField {
        field: &'static str,
        record: &'static str,
        first: &'static str,
        second: &'static str,
    },

    /// The wire source ran out of bytes.
    #[error("unexpected end of wire data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// A wire string was not valid UTF-8.
    #[error("invalid UTF-8 in wire string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A length prefix was negative or exceeded the configured limit.
    #[error("length {len} out of bounds (limit {limit})")]
    LengthOutOfBounds { len: i64, limit: usize },

    /// A variable-length integer used more than five bytes.
    #[error("malformed variable-length integer")]
    MalformedVarInt,

    /// An enumerant ordinal on the wire has no matching variant.
    #[error("ordinal {ordinal} is not a valid {kind}")]
    InvalidOrdinal { kind: &'static str, ordinal: i32 },

    /// A type-erased translator was handed a value of another type.
    #[error("translator for `{expected}` was given a value of a different type")]
    ValueMismatch { expected: &'static str },

    /// A nested tree exceeded the configured depth.
    #[error("tree nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },

    /// A wire-encoded tree carried an unknown tag id.
    #[error("unknown tree tag id {0}")]
    InvalidTag(u8),

    /// Format encoding error (RON/bincode).
    #[error("format error: {0}")]
    Format(String),
}

/// Convenience alias used throughout the crate.
pub type CodecResult<T> = Result<T, CodecError>;
