//! Value-level types embedded in record payloads.

use serde::{Deserialize, Serialize};

/// A primitive value, encodable inline within a single record payload.
///
/// `List` is the one recursive case: a homogeneous-by-convention list of
/// primitives encoded as nested tag/payload pairs inside its parent record.
/// The nested elements are not independently addressable and carry no
/// object IDs of their own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    /// The host language's null/none singleton.
    None,
    /// A 64-bit signed integer.
    Int(i64),
    /// An arbitrary-precision integer, carried as its decimal digit string.
    Long(String),
    /// A 64-bit IEEE float.
    Float(f64),
    Bool(bool),
    Str(String),
    /// A list whose elements are all primitives.
    List(Vec<Primitive>),
}

impl Primitive {
    /// A short human-readable name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Primitive::None => "none",
            Primitive::Int(_) => "int",
            Primitive::Long(_) => "long",
            Primitive::Float(_) => "float",
            Primitive::Bool(_) => "bool",
            Primitive::Str(_) => "str",
            Primitive::List(_) => "list",
        }
    }
}

/// Type descriptor for packed homogeneous data.
///
/// Describes the element layout of a raw byte blob so the receiving side can
/// reinterpret it without per-element records. The descriptor grammar is
/// recursive only through `Tuple`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DtypeTerm {
    None,
    Int(i64),
    Str(String),
    Tuple(Vec<DtypeTerm>),
}
