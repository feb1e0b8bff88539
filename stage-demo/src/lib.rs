//! # Easy Stage Demo
//!
//! Headless native host for easy-stage. Drives a stage over the recording
//! backend with a scripted session and prints what the last frame drew.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p stage-demo -- --frames 120 --smooth 8
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `DemoConfig` - Surface size, frame count and stroke smoothing
//! - `run_demo` - The scripted session, returning a `DemoReport`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod script;

pub use script::{run_demo, DemoReport};

use clap::Parser;

/// Command-line arguments for stage-demo.
#[derive(Debug, Clone, Parser)]
#[command(name = "stage-demo")]
#[command(about = "Headless easy-stage demo over the recording backend")]
#[command(version)]
pub struct CliArgs {
    /// Surface width in css pixels
    #[arg(long, env = "STAGE_WIDTH", default_value = "800")]
    pub width: f64,

    /// Surface height in css pixels
    #[arg(long, env = "STAGE_HEIGHT", default_value = "600")]
    pub height: f64,

    /// Animation frames to run after the scripted input
    #[arg(long, env = "STAGE_FRAMES", default_value = "60")]
    pub frames: u32,

    /// Minimum spacing between freehand stroke points (0 disables)
    #[arg(long, env = "STAGE_SMOOTH", default_value = "10")]
    pub smooth: f64,

    /// Simulated device pixel ratio
    #[arg(long, env = "STAGE_PIXEL_RATIO", default_value = "1")]
    pub pixel_ratio: f64,
}

/// Demo configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    /// Surface width in css pixels.
    pub width: f64,
    /// Surface height in css pixels.
    pub height: f64,
    /// Frames to run.
    pub frames: u32,
    /// Freehand smoothing distance.
    pub smooth: f64,
    /// Simulated device pixel ratio.
    pub pixel_ratio: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoConfig {
    /// Create a demo configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            frames: 60,
            smooth: 10.0,
            pixel_ratio: 1.0,
        }
    }
}

impl From<CliArgs> for DemoConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            width: args.width,
            height: args.height,
            frames: args.frames,
            smooth: args.smooth,
            pixel_ratio: args.pixel_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_match_config() {
        let args = CliArgs::parse_from(["stage-demo"]);
        assert_eq!(DemoConfig::from(args), DemoConfig::new());
    }

    #[test]
    fn test_cli_overrides() {
        let args = CliArgs::parse_from([
            "stage-demo",
            "--width",
            "320",
            "--frames",
            "5",
            "--pixel-ratio",
            "2",
        ]);
        let config = DemoConfig::from(args);
        assert_eq!(config.frames, 5);
        assert!((config.width - 320.0).abs() < f64::EPSILON);
        assert!((config.pixel_ratio - 2.0).abs() < f64::EPSILON);
    }
}
