//! gradient-infill - apply a wall-distance flow gradient to infill
//!
//! Reads a sliced toolpath program, rewrites its infill extrusion and writes
//! the result next to the input unless an output path is given.

use anyhow::{Context, Result};
use clap::Parser;
use gradient_infill::{
    init_logging, process_file, GradientSettings, WallSource, BUILD_DATE, VERSION,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gradient-infill")]
#[command(about = "Vary infill flow with distance from the walls", long_about = None)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")"))]
struct Cli {
    /// Input toolpath program
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (default: <input stem>_infill_gradient.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file (.toml or .json); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Flow multiplier at the wall (replaces custom control points)
    #[arg(long)]
    min_flow: Option<f64>,

    /// Flow multiplier at and beyond the gradient distance
    #[arg(long)]
    max_flow: Option<f64>,

    /// Gradient distance in mm
    #[arg(long)]
    max_distance: Option<f64>,

    /// Number of discrete flow levels (0 = continuous)
    #[arg(long)]
    steps: Option<u32>,

    /// Maximum length of an emitted infill move in mm
    #[arg(long)]
    max_move_length: Option<f64>,

    /// Measure distance from the outer wall instead of the inner wall
    #[arg(long)]
    outer_wall: bool,

    /// Scale infill feed rate inversely to the flow multiplier
    #[arg(long)]
    gradual_speed: bool,

    /// Treat programs without M82/M83 as relative extrusion
    #[arg(long)]
    assume_relative: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn settings(&self) -> Result<GradientSettings> {
        let mut settings = match &self.config {
            Some(path) => GradientSettings::load_from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => GradientSettings::default(),
        };

        settings
            .flow
            .override_linear(self.min_flow, self.max_flow, self.max_distance);
        if let Some(value) = self.steps {
            settings.flow.steps = value;
        }
        if let Some(value) = self.max_move_length {
            settings.subdivision.max_move_length = value;
        }
        if self.outer_wall {
            settings = settings.with_wall_source(WallSource::Outer);
        }
        if self.gradual_speed {
            settings.speed.gradual_speed = true;
        }
        if self.assume_relative {
            settings.input.assume_relative_extrusion = true;
        }

        Ok(settings)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    tracing::debug!("gradient-infill {} (built {})", VERSION, BUILD_DATE);

    let settings = cli.settings()?;
    let (output, report) = process_file(&cli.input, cli.output.as_deref(), settings)
        .with_context(|| format!("Failed to process {}", cli.input.display()))?;

    println!("{} -> {}: {}", cli.input.display(), output.display(), report);
    Ok(())
}
