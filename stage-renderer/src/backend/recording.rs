//! Headless backend that records every call.
//!
//! Used by tests and the native demo; also the fallback when no real
//! drawing surface exists.

use stage_core::{Rect, StrokeStyle, Vec2, ViewTransform, Viewport};

use crate::{BackendType, RenderResult};

use super::{HostMetrics, RenderBackend};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Backing store resized.
    Resize {
        /// Width in device pixels.
        width: u32,
        /// Height in device pixels.
        height: u32,
    },
    /// Transform replaced.
    SetTransform(ViewTransform),
    /// World-space rectangle cleared.
    ClearRect(Rect),
    /// Path stroked.
    StrokePath {
        /// World-space points.
        points: Vec<Vec2>,
        /// Whether the path was closed.
        closed: bool,
        /// Stroke used.
        style: StrokeStyle,
    },
    /// Circle stroked.
    StrokeCircle {
        /// World-space center.
        center: Vec2,
        /// Radius.
        radius: f64,
        /// Stroke used.
        style: StrokeStyle,
    },
    /// Circle filled.
    FillCircle {
        /// World-space center.
        center: Vec2,
        /// Radius.
        radius: f64,
        /// Fill color.
        color: String,
    },
}

impl Command {
    /// Whether this call puts pixels on the surface.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::StrokePath { .. } | Self::StrokeCircle { .. } | Self::FillCircle { .. }
        )
    }
}

/// Backend that stores calls in memory instead of drawing.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    metrics: HostMetrics,
    commands: Vec<Command>,
}

impl RecordingBackend {
    /// Create a recording backend with default host metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recording backend reporting the given host metrics.
    #[must_use]
    pub fn with_metrics(metrics: HostMetrics) -> Self {
        Self {
            metrics,
            commands: Vec::new(),
        }
    }

    /// Change what the simulated host reports.
    pub fn set_metrics(&mut self, metrics: HostMetrics) {
        self.metrics = metrics;
    }

    /// All calls so far.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Only the calls that draw.
    pub fn draw_commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|c| c.is_draw())
    }

    /// Drain the recorded calls.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

impl RenderBackend for RecordingBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Recording
    }

    fn host_metrics(&self) -> HostMetrics {
        self.metrics
    }

    fn resize(&mut self, viewport: &Viewport) -> RenderResult<()> {
        let (width, height) = viewport.backing_size();
        tracing::debug!("Recording backend resized to {}x{}", width, height);
        self.commands.push(Command::Resize { width, height });
        Ok(())
    }

    fn set_transform(&mut self, transform: &ViewTransform) -> RenderResult<()> {
        self.commands.push(Command::SetTransform(*transform));
        Ok(())
    }

    fn clear_rect(&mut self, rect: Rect) -> RenderResult<()> {
        self.commands.push(Command::ClearRect(rect));
        Ok(())
    }

    fn stroke_path(
        &mut self,
        points: &[Vec2],
        closed: bool,
        style: &StrokeStyle,
    ) -> RenderResult<()> {
        tracing::trace!("Record path: {} points closed={closed}", points.len());
        self.commands.push(Command::StrokePath {
            points: points.to_vec(),
            closed,
            style: style.clone(),
        });
        Ok(())
    }

    fn stroke_circle(
        &mut self,
        center: Vec2,
        radius: f64,
        style: &StrokeStyle,
    ) -> RenderResult<()> {
        tracing::trace!("Record circle at ({}, {}) r={radius}", center.x, center.y);
        self.commands.push(Command::StrokeCircle {
            center,
            radius,
            style: style.clone(),
        });
        Ok(())
    }

    fn fill_circle(&mut self, center: Vec2, radius: f64, color: &str) -> RenderResult<()> {
        self.commands.push(Command::FillCircle {
            center,
            radius,
            color: color.to_string(),
        });
        Ok(())
    }
}
