//! Error types for stage operations.

use thiserror::Error;

use crate::ObjectId;

/// Result type for stage operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in scene and vector operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Cross product requested for a vector that is neither 2D nor 3D.
    #[error("Unsupported dimension: {0}")]
    UnsupportedDimension(usize),

    /// Object not found in scene.
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// Object exists but cannot hold children.
    #[error("Object is not a group: {0}")]
    NotAGroup(ObjectId),

    /// Invalid operation on an object.
    #[error("Invalid operation on object: {0}")]
    InvalidOperation(String),

    /// Style record could not be parsed.
    #[error("Invalid style: {0}")]
    InvalidStyle(#[from] serde_json::Error),

    /// Drawing surface reported a failure.
    #[error("Rendering error: {0}")]
    Render(String),
}
