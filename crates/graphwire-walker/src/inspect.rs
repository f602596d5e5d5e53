//! The classification oracle: the narrow interface through which the walker
//! sees live host objects.
//!
//! The walker never inspects objects itself. A host embedding supplies an
//! [`ObjectInspector`] that classifies objects into the closed [`Kind`]
//! enumeration, exposes their children, and extracts code metadata for
//! functions and classes. The walker depends only on this interface, never
//! on any runtime type machinery.

use std::fmt;

use serde::{Deserialize, Serialize};

use graphwire_registry::{DtypeTerm, Primitive};

use crate::error::InspectResult;

/// Process-level identity of a live host object (an address or handle).
///
/// Used only as a cache key on the encoding side; never serialized. Distinct
/// from the registry-assigned [`ObjectId`](graphwire_registry::ObjectId).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeId(u64);

impl NativeId {
    /// Wrap a raw identity value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identity value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeId({:#x})", self.0)
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A dotted free-variable access chain, e.g. `module.Class.attr`: a name
/// path referenced but not locally bound inside a function or class body.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccessChain(String);

impl AccessChain {
    /// Build a chain from its dotted form.
    pub fn new(dotted: impl Into<String>) -> Self {
        Self(dotted.into())
    }

    /// The dotted form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The chain's name segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl fmt::Display for AccessChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccessChain {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Code metadata for a function, class, or with-block: where its source
/// lives and which free-variable chains its body references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDescriptor {
    /// Path of the defining source file.
    pub path: String,
    /// Full text of the defining source file.
    pub text: String,
    /// Starting line number of the definition within the file.
    pub line: i32,
    /// Free-variable access chains referenced by the body.
    pub chains: Vec<AccessChain>,
}

/// Classification of a live object, including its immediate children.
///
/// This is a closed set; unsupported objects must classify as
/// [`Kind::Unsupported`] and fail the walk rather than being silently
/// dropped. When several variants could apply, inspectors follow this fixed
/// priority order (first match wins): packed data, future, builtin
/// exception, named singleton, with-block, tuple, list, dict, primitive,
/// function, class, instance method, class instance.
#[derive(Clone, Debug)]
pub enum Kind<Obj> {
    /// Bulk homogeneous numeric data: type descriptor plus raw bytes.
    PackedData {
        /// Element layout of the blob.
        dtype: DtypeTerm,
        /// The raw bytes.
        data: Vec<u8>,
    },
    /// A future/promise; the walker registers its resolved value in its
    /// place, under the same object ID.
    Future(Obj),
    /// An instance of a builtin exception type found in the host's named
    /// singleton table.
    BuiltinException {
        /// Singleton name of the exception type.
        name: String,
        /// The exception's args object.
        args: Obj,
    },
    /// A well-known singleton object (builtin type or function) found in
    /// the host's named singleton table.
    NamedSingleton(String),
    /// A with-block code object; code metadata comes from the inspector's
    /// [`code_descriptor`](ObjectInspector::code_descriptor).
    WithBlock,
    Tuple(Vec<Obj>),
    List(Vec<Obj>),
    /// Key/value pairs in the container's iteration order.
    Dict(Vec<(Obj, Obj)>),
    Primitive(Primitive),
    /// A function; code metadata comes from the inspector's
    /// [`code_descriptor`](ObjectInspector::code_descriptor).
    Function,
    /// A class, with its base classes in declaration order.
    Class {
        /// Base classes; order is significant and preserved on the wire.
        bases: Vec<Obj>,
    },
    /// A method bound to an instance.
    InstanceMethod {
        /// The bound instance.
        instance: Obj,
        /// The method's name.
        name: String,
    },
    /// An ordinary class instance.
    ClassInstance {
        /// The instance's class object.
        class: Obj,
    },
    /// An object representable only as an opaque placeholder, optionally
    /// with a module-level path locating it on the receiving side.
    Unconvertible(Option<String>),
    /// An object the oracle cannot classify at all; aborts the walk.
    Unsupported(String),
}

/// Introspection collaborator consumed by the walker.
///
/// `Obj` is an opaque, cheaply clonable handle to a live host object
/// (typically a reference-counted pointer). The inspector owns all host
/// runtime knowledge; the walker owns all traversal and identity state.
pub trait ObjectInspector {
    /// Handle to a live host object.
    type Obj: Clone;

    /// Stable process-level identity of the object.
    fn native_id(&self, object: &Self::Obj) -> NativeId;

    /// Classify the object and expose its immediate children.
    fn classify(&self, object: &Self::Obj) -> InspectResult<Kind<Self::Obj>>;

    /// Whether the object has a pure/canonical replacement that should be
    /// walked in its place.
    fn can_map(&self, object: &Self::Obj) -> bool {
        let _ = object;
        false
    }

    /// Produce the pure replacement for a mappable object. Only called when
    /// [`can_map`](ObjectInspector::can_map) returned `true`.
    fn map_to_pure(&self, object: &Self::Obj) -> InspectResult<Self::Obj> {
        let _ = object;
        Err(crate::error::InspectError::failed(
            "inspector declared no pure mappings",
        ))
    }

    /// Source file, line number and free-variable chains for a function,
    /// class, or with-block object.
    fn code_descriptor(&self, object: &Self::Obj) -> InspectResult<CodeDescriptor>;

    /// Resolve a free-variable access chain in the scope of `context` to
    /// the object it denotes.
    fn resolve_chain(&self, chain: &AccessChain, context: &Self::Obj)
        -> InspectResult<Self::Obj>;

    /// Names of the instance's data members, from its attribute dictionary
    /// if present, else from static analysis of its constructor.
    fn data_member_names(&self, object: &Self::Obj) -> InspectResult<Vec<String>>;

    /// Fetch a named attribute of the object.
    fn attribute(&self, object: &Self::Obj, name: &str) -> InspectResult<Self::Obj>;

    /// A module-centric path to the object, when one exists, for labelling
    /// unconvertible records.
    fn module_path(&self, object: &Self::Obj) -> Option<String> {
        let _ = object;
        None
    }
}
