//! Renderer error types.

use stage_core::CanvasError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while drawing or driving the stage.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The backend could not be created or attached to its host.
    #[error("No rendering backend available: {0}")]
    NoBackend(String),

    /// Surface resize failed.
    #[error("Surface error: {0}")]
    Surface(String),

    /// A primitive draw call failed.
    #[error("Draw call failed: {0}")]
    Draw(String),

    /// Stage configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Scene operation failed.
    #[error("Scene error: {0}")]
    Scene(#[from] CanvasError),
}
