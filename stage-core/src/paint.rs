//! The primitive drawing interface the scene renders through.

use crate::{CanvasResult, StrokeStyle, Vec2};

/// Primitive draw calls in world coordinates.
///
/// Implemented by the drawing surface; the scene never talks to a
/// rendering backend directly.
pub trait Painter {
    /// Stroke a single segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface fails to draw.
    fn segment(&mut self, from: Vec2, to: Vec2, style: &StrokeStyle) -> CanvasResult<()>;

    /// Stroke a polyline, optionally closing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface fails to draw.
    fn polyline(&mut self, points: &[Vec2], closed: bool, style: &StrokeStyle)
        -> CanvasResult<()>;

    /// Stroke a circle outline.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface fails to draw.
    fn circle(&mut self, center: Vec2, radius: f64, style: &StrokeStyle) -> CanvasResult<()>;

    /// Fill a circle.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface fails to draw.
    fn circle_fill(&mut self, center: Vec2, radius: f64, color: &str) -> CanvasResult<()>;
}
