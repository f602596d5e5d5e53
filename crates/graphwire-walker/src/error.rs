//! Error types for the graph walker and its collaborator interface.

use graphwire_registry::RegistryError;

use crate::inspect::NativeId;

/// Errors raised by an [`ObjectInspector`](crate::ObjectInspector)
/// implementation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InspectError {
    /// Source text or line information could not be computed for a code
    /// object. The walker downgrades the object to an unconvertible record
    /// instead of failing the walk.
    #[error("cannot get source text for {repr}")]
    SourceUnavailable {
        /// Printable representation of the offending object.
        repr: String,
    },

    /// Any other inspector failure. Fatal to the walk.
    #[error("{message}")]
    Failed {
        /// The inspector's diagnostic.
        message: String,
    },
}

impl InspectError {
    /// Shorthand for a fatal inspector failure.
    pub fn failed(message: impl Into<String>) -> Self {
        InspectError::Failed {
            message: message.into(),
        }
    }
}

/// Convenience alias for inspector results.
pub type InspectResult<T> = Result<T, InspectError>;

/// Errors that abort a graph walk.
///
/// A walk either runs to completion or fails with one of these; partial
/// output left in the registry after a failure is not valid and must be
/// discarded by the caller.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WalkError {
    /// An object's runtime kind matches none of the supported branches.
    #[error("don't know what to do with {repr}")]
    Classification {
        /// Printable representation of the offending object.
        repr: String,
    },

    /// The introspection collaborator itself failed.
    #[error("collaborator failure: {0}")]
    Collaborator(#[from] InspectError),

    /// A class was registered before one of its base classes. Bases must be
    /// walked before the subclass; this is a precondition on how the walker
    /// is driven, not something it repairs.
    #[error("base class not registered before subclass (native identity {0})")]
    UnregisteredBase(NativeId),

    /// Record encoding was rejected by the registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Convenience alias for walk results.
pub type WalkResult<T> = Result<T, WalkError>;
