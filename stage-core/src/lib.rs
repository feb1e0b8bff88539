//! # Easy Stage Core
//!
//! Scene graph, camera and input logic for a small retained-mode 2D
//! drawing library. Knows nothing about the rendering target; drawing goes
//! through the [`Painter`] trait.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 stage-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Scene Graph     │  Camera                  │
//! │  - Layers        │  - Pan target            │
//! │  - Groups        │  - Discrete zoom table   │
//! │  - Lines/Circles │  - Screen <-> world      │
//! ├─────────────────────────────────────────────┤
//! │  Input Registry  │  Frame Callbacks         │
//! │  - Listeners     │  - Elapsed time          │
//! │  - Freehand      │  - Cancel handles        │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod element;
pub mod error;
pub mod event;
pub mod frame;
pub mod paint;
pub mod scene;
pub mod style;
pub mod vector;

pub use camera::{Camera, Rect, ViewTransform, Viewport, DEFAULT_SCALE_LEVEL, SCALE_LEVELS};
pub use element::{
    Attrs, Circle, DrawLine, DrawObject, Group, IdAllocator, Line, ObjectId, ObjectKind,
};
pub use error::{CanvasError, CanvasResult};
pub use event::{
    ListenerId, PointerCallback, PointerEvent, PointerKind, StrokeFinished, WheelEvent,
};
pub use frame::{Animations, FrameCallback, FrameClock, FrameHandle};
pub use paint::Painter;
pub use scene::Scene;
pub use style::{LineCap, LineJoin, StrokeStyle, Style};
pub use vector::Vec2;

/// Stage core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
