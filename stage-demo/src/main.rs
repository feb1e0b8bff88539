//! # Easy Stage Demo
//!
//! Headless native demo for easy-stage.

use clap::Parser;
use stage_demo::{run_demo, CliArgs, DemoConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "stage_demo=info,stage_renderer=debug,stage_core=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Easy Stage demo");

    let args = CliArgs::parse();
    let config = DemoConfig::from(args);

    tracing::info!(
        "Surface config: {}x{} @{}x, {} frames, smooth {}",
        config.width,
        config.height,
        config.pixel_ratio,
        config.frames,
        config.smooth
    );

    let report = run_demo(&config)?;
    println!("{report}");

    tracing::info!("Easy Stage demo finished");
    Ok(())
}
