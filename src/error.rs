//! Error taxonomy for the graph view core
//!
//! Recoverable failures (coercion, storage IO, serialization) are expressed as
//! [`GraphError`]. Lifecycle invariant violations such as double-destroy or a
//! duplicate attach are programming errors and panic at the call site instead:
//! a corrupted scene graph costs more than a hard stop. Lookup misses are not
//! errors at all, they are the create-on-demand path.

use thiserror::Error;

/// Errors produced by the graph view core.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A point-like value could not be coerced into a vector.
    #[error("could not coerce value into a vector: {0}")]
    VectorCoercion(String),

    /// Vector construction with non-finite components was rejected.
    #[error("vector components must be finite, got ({x}, {y})")]
    NonFiniteVector { x: f64, y: f64 },

    /// The state backend failed to read or write a blob.
    #[error("state storage failed: {0}")]
    Storage(#[from] std::io::Error),

    /// Persisted state could not be serialized.
    #[error("state serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type GraphResult<T> = Result<T, GraphError>;
