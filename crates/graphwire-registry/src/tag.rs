//! The closed tag vocabulary of the wire format.
//!
//! Each tag fixes its payload grammar. Adding a new object kind means adding
//! a new tag plus matching encode/decode logic; existing payload grammars
//! never change.

use serde::{Deserialize, Serialize};

/// Record tag byte. The numeric code points are part of the wire contract.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    None = 1,
    Int = 2,
    Long = 3,
    Float = 4,
    Bool = 5,
    Str = 6,
    ListOfPrimitives = 7,
    Tuple = 8,
    PackedHomogeneousData = 9,
    List = 10,
    File = 11,
    Dict = 12,
    /// Reserved: no encoder entry point exists and the deserializer rejects it.
    RemoteObjectReference = 13,
    BuiltinExceptionInstance = 14,
    NamedSingleton = 15,
    Function = 16,
    Class = 17,
    Unconvertible = 18,
    ClassInstance = 19,
    InstanceMethod = 20,
    WithBlock = 21,
    AbortException = 22,
    /// Reserved: no encoder entry point exists and the deserializer rejects it.
    StackTraceAsJson = 23,
}

impl Tag {
    /// The tag's wire byte.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decode a wire byte; `None` for bytes outside the vocabulary.
    pub fn from_byte(code: u8) -> Option<Tag> {
        Some(match code {
            1 => Tag::None,
            2 => Tag::Int,
            3 => Tag::Long,
            4 => Tag::Float,
            5 => Tag::Bool,
            6 => Tag::Str,
            7 => Tag::ListOfPrimitives,
            8 => Tag::Tuple,
            9 => Tag::PackedHomogeneousData,
            10 => Tag::List,
            11 => Tag::File,
            12 => Tag::Dict,
            13 => Tag::RemoteObjectReference,
            14 => Tag::BuiltinExceptionInstance,
            15 => Tag::NamedSingleton,
            16 => Tag::Function,
            17 => Tag::Class,
            18 => Tag::Unconvertible,
            19 => Tag::ClassInstance,
            20 => Tag::InstanceMethod,
            21 => Tag::WithBlock,
            22 => Tag::AbortException,
            23 => Tag::StackTraceAsJson,
            _ => return None,
        })
    }
}
