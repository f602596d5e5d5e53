//! Error types for the stream layer.

/// Errors that can occur while reading a byte stream.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StreamError {
    /// A read ran past the end of the buffer. Indicates a truncated or
    /// corrupt stream; never retried.
    #[error("out of bounds read at offset {offset}: wanted {wanted} bytes, buffer holds {len}")]
    OutOfBounds {
        /// Cursor position when the read was attempted.
        offset: usize,
        /// Number of bytes the read required.
        wanted: usize,
        /// Total buffer length.
        len: usize,
    },

    /// A length prefix decoded to a negative value.
    #[error("invalid length prefix: {0}")]
    InvalidLength(i64),
}

/// Convenience alias for stream results.
pub type StreamResult<T> = Result<T, StreamError>;
