use std::fmt;

use thiserror::Error;

/// Opaque cause carried by a failed accessor invocation.
pub type AccessorError = anyhow::Error;

/// Failures raised by the adaptation layer, both directions.
#[derive(Debug, Error)]
pub enum AdaptError {
    /// A generic value cannot satisfy the requested target type.
    #[error("value of kind {value} cannot satisfy target type {target}")]
    InvalidArgument { value: String, target: String },

    /// The requested target type is outside the supported grammar.
    #[error("target type {target} is outside the supported grammar")]
    UnsupportedType { target: String },

    /// A property accessor raised while adapting; fatal, never retried.
    #[error("accessor {accessor} on {type_name} failed")]
    AccessorInvocation {
        accessor: &'static str,
        type_name: &'static str,
        #[source]
        source: AccessorError,
    },

    /// Mutation of a read-only view, or a property without a derivable key.
    #[error("unsupported operation: {reason}")]
    UnsupportedOperation { reason: String },

    /// Two accessors of one type derive the same key; a configuration
    /// defect reported when the type's accessor table is populated.
    #[error("accessors {first} and {second} on {type_name} both derive key {key:?}")]
    DuplicateKey {
        type_name: &'static str,
        key: String,
        first: &'static str,
        second: &'static str,
    },

    /// Index past the end of a sequence view.
    #[error("index {index} out of bounds for sequence of length {len}")]
    OutOfBounds { index: usize, len: usize },
}

impl AdaptError {
    pub(crate) fn read_only() -> Self {
        AdaptError::UnsupportedOperation {
            reason: "adapted views are read-only".to_string(),
        }
    }

    pub(crate) fn underivable(accessor: &str) -> Self {
        AdaptError::UnsupportedOperation {
            reason: format!("property accessor {accessor:?} has no derivable key"),
        }
    }

    pub(crate) fn invalid(value: impl fmt::Display, target: impl fmt::Display) -> Self {
        AdaptError::InvalidArgument {
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    pub(crate) fn unsupported(target: impl fmt::Display) -> Self {
        AdaptError::UnsupportedType {
            target: target.to_string(),
        }
    }
}

/// Cause used by generated accessors when the cached table is applied to a
/// receiver of the wrong concrete type.
#[must_use]
pub fn receiver_mismatch(expected: &'static str) -> AccessorError {
    anyhow::anyhow!("receiver is not a {expected}")
}
