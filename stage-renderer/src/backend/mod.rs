//! Rendering backend implementations.

pub mod recording;

use serde::{Deserialize, Serialize};
use stage_core::{Rect, StrokeStyle, Vec2, ViewTransform, Viewport};

use crate::{BackendType, RenderResult};

/// What the host environment reports about the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostMetrics {
    /// Inner width of the host window in css pixels.
    pub window_width: f64,
    /// Inner height of the host window in css pixels.
    pub window_height: f64,
    /// Device pixels per css pixel.
    pub pixel_ratio: f64,
    /// Client-space position of the surface's top-left corner.
    pub origin: Vec2,
}

impl Default for HostMetrics {
    fn default() -> Self {
        Self {
            window_width: 800.0,
            window_height: 600.0,
            pixel_ratio: 1.0,
            origin: Vec2::ZERO,
        }
    }
}

/// Trait for rendering backends.
///
/// Draw calls receive world coordinates; the backend applies the most
/// recent transform passed to [`set_transform`](Self::set_transform).
pub trait RenderBackend {
    /// Get the backend type.
    fn backend_type(&self) -> BackendType;

    /// Current host geometry.
    fn host_metrics(&self) -> HostMetrics;

    /// Resize the backing store to match `viewport`.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be resized.
    fn resize(&mut self, viewport: &Viewport) -> RenderResult<()>;

    /// Replace the current world → backing transform.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform cannot be applied.
    fn set_transform(&mut self, transform: &ViewTransform) -> RenderResult<()>;

    /// Clear a world-space rectangle.
    ///
    /// # Errors
    ///
    /// Returns an error if clearing fails.
    fn clear_rect(&mut self, rect: Rect) -> RenderResult<()>;

    /// Stroke a path through `points`.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing fails.
    fn stroke_path(&mut self, points: &[Vec2], closed: bool, style: &StrokeStyle)
        -> RenderResult<()>;

    /// Stroke a circle outline.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing fails.
    fn stroke_circle(&mut self, center: Vec2, radius: f64, style: &StrokeStyle)
        -> RenderResult<()>;

    /// Fill a circle.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing fails.
    fn fill_circle(&mut self, center: Vec2, radius: f64, color: &str) -> RenderResult<()>;
}
