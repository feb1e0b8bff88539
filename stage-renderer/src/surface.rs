//! The drawing surface: a backend plus camera, viewport and drag state.

use stage_core::{
    Camera, CanvasError, CanvasResult, Painter, PointerEvent, PointerKind, StrokeStyle, Vec2,
    ViewTransform, Viewport, WheelEvent,
};

use crate::{backend::RenderBackend, RenderResult};

/// Draws in world coordinates through a pan/zoom camera.
#[derive(Debug)]
pub struct DrawingSurface<B> {
    backend: B,
    camera: Camera,
    viewport: Viewport,
    dragging: bool,
    previous_pointer: Vec2,
}

impl<B: RenderBackend> DrawingSurface<B> {
    /// Wrap a backend and size it to `width` x `height` css pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial resize fails.
    pub fn new(backend: B, width: f64, height: f64) -> RenderResult<Self> {
        let metrics = backend.host_metrics();
        let mut viewport = Viewport::new(width, height, metrics.pixel_ratio);
        viewport.origin = metrics.origin;
        let mut surface = Self {
            backend,
            camera: Camera::new(),
            viewport,
            dragging: false,
            previous_pointer: Vec2::ZERO,
        };
        surface.apply_size()?;
        Ok(surface)
    }

    /// The camera.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The current viewport.
    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The world → backing transform for the current camera.
    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        ViewTransform::new(&self.camera, &self.viewport)
    }

    /// The backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Whether a drag-pan is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Resize to `width` x `height` css pixels. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be resized.
    pub fn resize(&mut self, width: f64, height: f64) -> RenderResult<()> {
        self.viewport.width = width;
        self.viewport.height = height;
        self.apply_size()
    }

    /// Resize to fill the host window.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be resized.
    pub fn fit_to_viewport(&mut self) -> RenderResult<()> {
        let metrics = self.backend.host_metrics();
        self.resize(metrics.window_width, metrics.window_height)
    }

    fn apply_size(&mut self) -> RenderResult<()> {
        let metrics = self.backend.host_metrics();
        if metrics.pixel_ratio > 0.0 {
            self.viewport.pixel_ratio = metrics.pixel_ratio;
        }
        self.viewport.origin = metrics.origin;
        self.backend.resize(&self.viewport)?;
        let (w, h) = self.viewport.backing_size();
        tracing::debug!(
            "Surface resized to {}x{} css, {}x{} backing",
            self.viewport.width,
            self.viewport.height,
            w,
            h
        );
        self.update_transform()
    }

    fn update_transform(&mut self) -> RenderResult<()> {
        let transform = self.transform();
        self.backend.set_transform(&transform)
    }

    /// Move the camera so that `target` is the pan offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the new transform.
    pub fn set_camera_target(&mut self, target: Vec2) -> RenderResult<()> {
        self.camera.target = target;
        self.update_transform()
    }

    /// Jump to a zoom level in the fixed table.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the new transform.
    pub fn set_scale_level(&mut self, level: usize) -> RenderResult<()> {
        self.camera.set_scale_level(level);
        self.update_transform()
    }

    /// Track a pointer event for drag-to-pan. Returns whether the camera moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the new transform.
    pub fn handle_drag(&mut self, event: &PointerEvent) -> RenderResult<bool> {
        match event.kind {
            PointerKind::Down => {
                self.previous_pointer = event.position;
                self.dragging = true;
                Ok(false)
            }
            PointerKind::Up | PointerKind::Leave => {
                self.dragging = false;
                Ok(false)
            }
            PointerKind::Move if self.dragging => {
                let delta = event.position - self.previous_pointer;
                self.camera
                    .pan_by_screen_delta(delta, self.viewport.pixel_ratio);
                self.previous_pointer = event.position;
                tracing::trace!(
                    "Panned to ({}, {})",
                    self.camera.target.x,
                    self.camera.target.y
                );
                self.update_transform()?;
                Ok(true)
            }
            PointerKind::Move => Ok(false),
        }
    }

    /// Step the zoom level for a wheel event. Returns whether it changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the new transform.
    pub fn handle_wheel(&mut self, event: &WheelEvent) -> RenderResult<bool> {
        if !self.camera.apply_wheel(event.delta_y) {
            return Ok(false);
        }
        tracing::debug!(
            "Zoom level {} (scale {})",
            self.camera.scale_level(),
            self.camera.scale()
        );
        self.update_transform()?;
        Ok(true)
    }

    /// Convert a client-space position to world space.
    ///
    /// The surface origin is re-read from the host first, since layout can
    /// move the surface between events.
    pub fn screen_to_world(&mut self, client: Vec2) -> Vec2 {
        self.viewport.origin = self.backend.host_metrics().origin;
        self.transform().client_to_world(client)
    }

    /// Convert a world-space point to client space.
    #[must_use]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.transform().world_to_client(world)
    }

    /// Clear the visible region plus a small margin.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to clear.
    pub fn clear(&mut self) -> RenderResult<()> {
        let rect = self.transform().clear_rect();
        self.backend.clear_rect(rect)
    }

    /// Stroke a segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to draw.
    pub fn segment(&mut self, from: Vec2, to: Vec2, style: &StrokeStyle) -> RenderResult<()> {
        self.backend.stroke_path(&[from, to], false, style)
    }

    /// Stroke a polyline. No points draws nothing; one point draws a dot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to draw.
    pub fn polyline(
        &mut self,
        points: &[Vec2],
        closed: bool,
        style: &StrokeStyle,
    ) -> RenderResult<()> {
        match points {
            [] => Ok(()),
            [p] => self.backend.stroke_path(&[*p, *p], closed, style),
            _ => self.backend.stroke_path(points, closed, style),
        }
    }

    /// Stroke a circle outline.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to draw.
    pub fn circle(&mut self, center: Vec2, radius: f64, style: &StrokeStyle) -> RenderResult<()> {
        self.backend.stroke_circle(center, radius, style)
    }

    /// Fill a circle.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to draw.
    pub fn circle_fill(&mut self, center: Vec2, radius: f64, color: &str) -> RenderResult<()> {
        self.backend.fill_circle(center, radius, color)
    }
}

fn to_canvas_error(err: crate::RenderError) -> CanvasError {
    CanvasError::Render(err.to_string())
}

impl<B: RenderBackend> Painter for DrawingSurface<B> {
    fn segment(&mut self, from: Vec2, to: Vec2, style: &StrokeStyle) -> CanvasResult<()> {
        DrawingSurface::segment(self, from, to, style).map_err(to_canvas_error)
    }

    fn polyline(
        &mut self,
        points: &[Vec2],
        closed: bool,
        style: &StrokeStyle,
    ) -> CanvasResult<()> {
        DrawingSurface::polyline(self, points, closed, style).map_err(to_canvas_error)
    }

    fn circle(&mut self, center: Vec2, radius: f64, style: &StrokeStyle) -> CanvasResult<()> {
        DrawingSurface::circle(self, center, radius, style).map_err(to_canvas_error)
    }

    fn circle_fill(&mut self, center: Vec2, radius: f64, color: &str) -> CanvasResult<()> {
        DrawingSurface::circle_fill(self, center, radius, color).map_err(to_canvas_error)
    }
}
