//! Error types for encoding and decoding registry streams.

use graphwire_stream::StreamError;

use crate::tag::Tag;

/// Errors produced while encoding records.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// `define_dict` was called with key and value arrays of different
    /// lengths. A programming error in the caller; never retried.
    #[error("dict key/value length mismatch: {keys} keys, {values} values")]
    DictLengthMismatch {
        /// Number of key IDs supplied.
        keys: usize,
        /// Number of value IDs supplied.
        values: usize,
    },
}

/// Convenience alias for encode results.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors produced while decoding a record stream.
///
/// All decode failures are fatal: the stream is either corrupt, truncated,
/// or produced by an incompatible format version. No forward compatibility
/// is attempted.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The reader ran out of bytes mid-record, or the terminator record is
    /// missing entirely.
    #[error("truncated stream: {0}")]
    Truncated(#[from] StreamError),

    /// A tag byte outside the closed vocabulary.
    #[error("unknown tag byte: {0}")]
    UnknownTag(u8),

    /// A tag that is reserved in the vocabulary but has no payload grammar.
    #[error("unsupported record tag: {0:?}")]
    UnsupportedRecord(Tag),

    /// A primitive tag byte where a dtype descriptor term was expected.
    #[error("invalid dtype descriptor tag: {0}")]
    InvalidDtypeTag(u8),

    /// A record carried a negative object ID other than the terminator.
    #[error("invalid object id: {0}")]
    InvalidObjectId(i64),

    /// An element count inside a payload decoded to a negative value.
    #[error("invalid element count: {0}")]
    InvalidCount(i64),

    /// A string field was not valid UTF-8.
    #[error("invalid utf-8 in {field}")]
    InvalidUtf8 {
        /// Name of the offending field.
        field: &'static str,
    },

    /// Replaying a decoded record into the receiving sink failed.
    #[error("replay rejected: {0}")]
    Replay(#[from] RegistryError),
}

/// Convenience alias for decode results.
pub type DecodeResult<T> = Result<T, DecodeError>;
