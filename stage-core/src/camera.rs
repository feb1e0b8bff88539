//! Camera, viewport and the world/screen transform.
//!
//! ```text
//!  client px ──(− origin)──► css px ──(× ratio)──► backing px
//!                                                     │
//!  world ◄──(− target)── ◄──(÷ scale)── ◄──(− center)─┘
//! ```
//!
//! Rendering applies the same chain in reverse, so picking and drawing
//! always agree.

use serde::{Deserialize, Serialize};

use crate::Vec2;

/// The discrete zoom table. Zoom always snaps to one of these values.
pub const SCALE_LEVELS: [f64; 18] = [
    0.04, 0.06, 0.09, 0.13, 0.2, 0.3, 0.45, 0.65, 1.0, 1.5, 2.25, 3.5, 5.0, 7.5, 11.5, 17.0, 25.0,
    38.0,
];

/// Index of `1.0` in [`SCALE_LEVELS`].
pub const DEFAULT_SCALE_LEVEL: usize = 8;

/// Extra pixels cleared beyond each viewport edge.
pub const CLEAR_MARGIN: f64 = 5.0;

/// Pan target plus discrete zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "CameraState")]
pub struct Camera {
    /// World-space offset applied after scaling; the world point `-target`
    /// sits at the center of the surface.
    pub target: Vec2,
    scale_level: usize,
}

/// Serialized form of [`Camera`]; the level is clamped on the way in.
#[derive(Deserialize)]
struct CameraState {
    target: Vec2,
    scale_level: usize,
}

impl From<CameraState> for Camera {
    fn from(state: CameraState) -> Self {
        let mut camera = Self {
            target: state.target,
            ..Self::new()
        };
        camera.set_scale_level(state.scale_level);
        camera
    }
}

impl Camera {
    /// Camera at the origin with 1:1 zoom.
    #[must_use]
    pub fn new() -> Self {
        Self {
            target: Vec2::ZERO,
            scale_level: DEFAULT_SCALE_LEVEL,
        }
    }

    /// Current index into [`SCALE_LEVELS`].
    #[must_use]
    pub fn scale_level(&self) -> usize {
        self.scale_level
    }

    /// Current scale factor.
    #[must_use]
    pub fn scale(&self) -> f64 {
        SCALE_LEVELS[self.scale_level]
    }

    /// Jump to a zoom level, clamped to the table.
    pub fn set_scale_level(&mut self, level: usize) {
        self.scale_level = level.min(SCALE_LEVELS.len() - 1);
    }

    /// Step one level up. Returns `false` at the top of the table.
    pub fn zoom_in(&mut self) -> bool {
        if self.scale_level + 1 < SCALE_LEVELS.len() {
            self.scale_level += 1;
            true
        } else {
            false
        }
    }

    /// Step one level down. Returns `false` at the bottom of the table.
    pub fn zoom_out(&mut self) -> bool {
        if self.scale_level > 0 {
            self.scale_level -= 1;
            true
        } else {
            false
        }
    }

    /// Apply a wheel delta: negative zooms in, positive zooms out.
    ///
    /// Returns whether the level changed.
    pub fn apply_wheel(&mut self, delta_y: f64) -> bool {
        if delta_y < 0.0 {
            self.zoom_in()
        } else if delta_y > 0.0 {
            self.zoom_out()
        } else {
            false
        }
    }

    /// Pan by a pointer movement measured in css pixels.
    pub fn pan_by_screen_delta(&mut self, delta: Vec2, pixel_ratio: f64) {
        self.target += delta * (pixel_ratio / self.scale());
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Host-side geometry of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in css pixels.
    pub width: f64,
    /// Height in css pixels.
    pub height: f64,
    /// Device pixels per css pixel.
    pub pixel_ratio: f64,
    /// Client-space position of the surface's top-left corner.
    pub origin: Vec2,
}

impl Viewport {
    /// Create a viewport at the client origin.
    #[must_use]
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio: if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 },
            origin: Vec2::ZERO,
        }
    }

    /// Backing-store size in device pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn backing_size(&self) -> (u32, u32) {
        let w = (self.width * self.pixel_ratio).round().max(0.0);
        let h = (self.height * self.pixel_ratio).round().max(0.0);
        (w as u32, h as u32)
    }

    /// Css size that exactly covers the backing store.
    #[must_use]
    pub fn css_size(&self) -> (f64, f64) {
        let (w, h) = self.backing_size();
        (
            f64::from(w) / self.pixel_ratio,
            f64::from(h) / self.pixel_ratio,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0, 1.0)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// The world → backing-store transform for one camera/viewport state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Backing-store center in device pixels.
    pub center: Vec2,
    /// Zoom factor.
    pub scale: f64,
    /// Camera target.
    pub target: Vec2,
    /// Device pixels per css pixel.
    pub pixel_ratio: f64,
    /// Client-space origin of the surface.
    pub origin: Vec2,
    backing: (u32, u32),
}

impl ViewTransform {
    /// Build the transform for a camera viewing a viewport.
    #[must_use]
    pub fn new(camera: &Camera, viewport: &Viewport) -> Self {
        let backing = viewport.backing_size();
        Self {
            center: Vec2::new(f64::from(backing.0) * 0.5, f64::from(backing.1) * 0.5),
            scale: camera.scale(),
            target: camera.target,
            pixel_ratio: viewport.pixel_ratio,
            origin: viewport.origin,
            backing,
        }
    }

    /// Backing-store size in device pixels.
    #[must_use]
    pub fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    /// World point → backing-store pixel.
    #[must_use]
    pub fn world_to_backing(&self, p: Vec2) -> Vec2 {
        (p + self.target) * self.scale + self.center
    }

    /// Backing-store pixel → world point.
    #[must_use]
    pub fn backing_to_world(&self, b: Vec2) -> Vec2 {
        (b - self.center) * (1.0 / self.scale) - self.target
    }

    /// World point → client pixel.
    #[must_use]
    pub fn world_to_client(&self, p: Vec2) -> Vec2 {
        self.world_to_backing(p) * (1.0 / self.pixel_ratio) + self.origin
    }

    /// Client pixel → world point.
    #[must_use]
    pub fn client_to_world(&self, c: Vec2) -> Vec2 {
        self.backing_to_world((c - self.origin) * self.pixel_ratio)
    }

    /// The world-space region covering the backing store plus
    /// [`CLEAR_MARGIN`] device pixels on every side.
    #[must_use]
    pub fn clear_rect(&self) -> Rect {
        let (w, h) = (f64::from(self.backing.0), f64::from(self.backing.1));
        Rect {
            x: -(w * 0.5 + CLEAR_MARGIN) / self.scale - self.target.x,
            y: -(h * 0.5 + CLEAR_MARGIN) / self.scale - self.target.y,
            width: (w + 2.0 * CLEAR_MARGIN) / self.scale,
            height: (h + 2.0 * CLEAR_MARGIN) / self.scale,
        }
    }
}
