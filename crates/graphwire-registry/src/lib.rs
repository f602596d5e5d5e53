//! Object registry encoder and deserializer for the graphwire format.
//!
//! The registry side of the object-graph serializer: it assigns stable
//! integer identities and appends one self-describing "define" record per
//! distinct object to a flat byte stream. The deserializer replays a stream
//! back through the same [`RecordSink`] surface.
//!
//! # Architecture
//!
//! - **[`Tag`]**: the closed tag vocabulary; code points are the wire contract
//! - **[`ObjectRegistry`]**: ID allocation + record encoding into a stream writer
//! - **[`deserialize_from_stream`]**: record-by-record replay onto any sink
//! - **[`RecordLog`]**: a sink that collects records as plain data
//!
//! The registry does not deduplicate and does not traverse anything; the
//! graph walker (`graphwire-walker`) owns identity caching and drives the
//! `define_*` calls.

pub mod decode;
pub mod error;
pub mod id;
pub mod registry;
pub mod sink;
pub mod tag;
pub mod value;

pub use decode::deserialize_from_stream;
pub use error::{DecodeError, DecodeResult, RegistryError, RegistryResult};
pub use id::{ObjectId, END_OF_STREAM};
pub use registry::ObjectRegistry;
pub use sink::{DecodedRecord, RecordLog, RecordSink};
pub use tag::Tag;
pub use value::{DtypeTerm, Primitive};
