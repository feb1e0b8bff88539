//! Canvas2D backend over a browser `<canvas>` element.

use std::f64::consts::TAU;

use stage_core::{Rect, StrokeStyle, Vec2, ViewTransform, Viewport};
use stage_renderer::{BackendType, HostMetrics, RenderBackend, RenderError, RenderResult};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

fn surface_error(err: &JsValue) -> RenderError {
    RenderError::Surface(format!("{err:?}"))
}

fn draw_error(err: &JsValue) -> RenderError {
    RenderError::Draw(format!("{err:?}"))
}

/// Draws into a `CanvasRenderingContext2d`.
pub struct CanvasBackend {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasBackend {
    /// Wrap a canvas and its 2D context.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        Self { canvas, ctx }
    }

    /// The canvas element.
    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn apply_stroke(&self, style: &StrokeStyle) -> RenderResult<()> {
        self.ctx.set_stroke_style_str(&style.color);
        self.ctx.set_line_width(style.width);
        self.ctx.set_line_cap(style.cap.as_str());
        self.ctx.set_line_join(style.join.as_str());
        let dash: js_sys::Array = style.dash.iter().map(|d| JsValue::from_f64(*d)).collect();
        self.ctx.set_line_dash(&dash).map_err(|e| draw_error(&e))
    }

    fn trace_circle(&self, center: Vec2, radius: f64) -> RenderResult<()> {
        self.ctx.begin_path();
        self.ctx
            .arc(center.x, center.y, radius, 0.0, TAU)
            .map_err(|e| draw_error(&e))
    }
}

impl RenderBackend for CanvasBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Canvas2D
    }

    fn host_metrics(&self) -> HostMetrics {
        let defaults = HostMetrics::default();
        let Some(window) = web_sys::window() else {
            return defaults;
        };
        let number = |value: Result<JsValue, JsValue>, fallback: f64| {
            value.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
        };
        let rect = self.canvas.get_bounding_client_rect();
        HostMetrics {
            window_width: number(window.inner_width(), defaults.window_width),
            window_height: number(window.inner_height(), defaults.window_height),
            pixel_ratio: window.device_pixel_ratio(),
            origin: Vec2::new(rect.left(), rect.top()),
        }
    }

    fn resize(&mut self, viewport: &Viewport) -> RenderResult<()> {
        let (width, height) = viewport.backing_size();
        self.canvas.set_width(width);
        self.canvas.set_height(height);

        let (css_width, css_height) = viewport.css_size();
        let style = self.canvas.style();
        style
            .set_property("width", &format!("{css_width}px"))
            .map_err(|e| surface_error(&e))?;
        style
            .set_property("height", &format!("{css_height}px"))
            .map_err(|e| surface_error(&e))?;
        tracing::debug!("Canvas2D resized to {}x{}", width, height);
        Ok(())
    }

    fn set_transform(&mut self, transform: &ViewTransform) -> RenderResult<()> {
        // p ↦ (p + target) * scale + center
        let scale = transform.scale;
        let offset = transform.target * scale + transform.center;
        self.ctx
            .set_transform(scale, 0.0, 0.0, scale, offset.x, offset.y)
            .map_err(|e| surface_error(&e))
    }

    fn clear_rect(&mut self, rect: Rect) -> RenderResult<()> {
        self.ctx.clear_rect(rect.x, rect.y, rect.width, rect.height);
        Ok(())
    }

    fn stroke_path(
        &mut self,
        points: &[Vec2],
        closed: bool,
        style: &StrokeStyle,
    ) -> RenderResult<()> {
        let Some((first, rest)) = points.split_first() else {
            return Ok(());
        };
        self.apply_stroke(style)?;
        self.ctx.begin_path();
        self.ctx.move_to(first.x, first.y);
        for p in rest {
            self.ctx.line_to(p.x, p.y);
        }
        if closed {
            self.ctx.close_path();
        }
        self.ctx.stroke();
        Ok(())
    }

    fn stroke_circle(
        &mut self,
        center: Vec2,
        radius: f64,
        style: &StrokeStyle,
    ) -> RenderResult<()> {
        self.apply_stroke(style)?;
        self.trace_circle(center, radius)?;
        self.ctx.stroke();
        Ok(())
    }

    fn fill_circle(&mut self, center: Vec2, radius: f64, color: &str) -> RenderResult<()> {
        self.ctx.set_fill_style_str(color);
        self.trace_circle(center, radius)?;
        self.ctx.fill();
        Ok(())
    }
}
