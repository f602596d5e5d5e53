//! Binary stream primitives for the graphwire object registry format.
//!
//! The wire format is built from exactly four primitive shapes:
//!
//! - fixed-width integers and floats (native byte order)
//! - length-prefixed byte strings (int32 length, raw bytes)
//! - arrays of 64-bit integers (int64 count, raw 8-byte block)
//! - arrays of length-prefixed strings (int32 count, each string)
//!
//! [`StreamWriter`] appends them; [`StreamReader`] reads them back in the
//! same order. Every reader operation is the byte-exact dual of a writer
//! operation; the higher layers rely on that symmetry.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{StreamError, StreamResult};
pub use reader::StreamReader;
pub use writer::StreamWriter;
