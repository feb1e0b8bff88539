//! # Easy Stage Renderer
//!
//! Puts a [`stage_core::Scene`] on screen: a camera-aware
//! [`DrawingSurface`] over a pluggable [`RenderBackend`], and the
//! [`Stage`] that routes input and runs frames.
//!
//! ## Rendering Backends
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            RenderBackend Trait              │
//! ├──────────────────────┬──────────────────────┤
//! │ Canvas2D             │ Recording            │
//! │ (browser, stage-web) │ (headless, tests)    │
//! └──────────────────────┴──────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod error;
pub mod stage;
pub mod surface;

pub use backend::{
    recording::{Command, RecordingBackend},
    HostMetrics, RenderBackend,
};
pub use error::{RenderError, RenderResult};
pub use stage::{Stage, StageConfig};
pub use surface::DrawingSurface;

/// Available rendering backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Browser 2D canvas context.
    Canvas2D,
    /// In-memory command log (no drawing surface).
    Recording,
}

impl BackendType {
    /// Short name for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Canvas2D => "canvas2d",
            Self::Recording => "recording",
        }
    }
}
