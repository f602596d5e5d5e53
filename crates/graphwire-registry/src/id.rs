use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel written in place of an object ID to terminate a stream.
pub const END_OF_STREAM: i64 = -1;

/// Registry-assigned integer identity for one distinct object.
///
/// IDs are allocated monotonically from 0 and never reused. They are stable
/// only within one encoding session and serve as the sole cross-reference
/// mechanism in the wire format: containers and instances reference their
/// members by ID, never by value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Wrap a raw ID value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// The ID as written on the wire.
    pub fn as_i64(&self) -> i64 {
        self.0 as i64
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
