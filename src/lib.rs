//! # Gradient Infill
//!
//! A post-processor for 3D printer toolpath programs that varies infill
//! extrusion with distance from the part's walls, giving a smooth density
//! transition instead of uniform infill.
//!
//! ## Architecture
//!
//! Gradient Infill is organized as a workspace with multiple crates:
//!
//! 1. **gradient-infill-core** - Error taxonomy and planar geometry
//! 2. **gradient-infill-gcode** - Record model, markers, parser, serializer
//! 3. **gradient-infill-settings** - Configuration, validation, settings files
//! 4. **gradient-infill-engine** - Classification, wall distance, rewriting
//! 5. **gradient-infill** - File handling, logging and the command-line tool
//!
//! ## Example
//!
//! ```no_run
//! use gradient_infill::{GradientInfill, GradientSettings};
//!
//! let transform = GradientInfill::new(GradientSettings::default())?;
//! let output = transform.process("M83\n;LAYER:0\n")?;
//! # Ok::<(), gradient_infill::Error>(())
//! ```

use std::path::{Path, PathBuf};

pub use gradient_infill_core::{
    ConfigError, Error, ParseError, Point2D, PreconditionError, Result, WallSegment,
};
pub use gradient_infill_engine::{
    Classification, DistanceField, GradientInfill, GradientProfile, RegionClassifier,
    RegionLabel, SegmentRewriter, TransformReport,
};
pub use gradient_infill_gcode::{
    LineEnding, MarkerKind, MarkerSet, MotionRecord, NumberFormat, ParsedProgram, ProgramParser,
    ProgramSerializer, WallSource,
};
pub use gradient_infill_settings::{
    ControlPoint, DistanceIndex, GradientSettings, SettingsError, SettingsResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Suffix appended to the input file stem when no output path is given
pub const OUTPUT_SUFFIX: &str = "_infill_gradient";

/// Initialize logging
///
/// Sets up structured logging with:
/// - Console output on stderr
/// - RUST_LOG environment variable support
/// - Default level raised by `verbosity` (0 = info, 1 = debug, 2+ = trace)
pub fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = match verbosity {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(verbosity > 0);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Output path used when none is given: `<stem>_infill_gradient<ext>` beside the input
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "gcode".to_string());

    input.with_file_name(format!("{}{}.{}", stem, OUTPUT_SUFFIX, extension))
}

/// Transform a program file
///
/// Reads `input`, applies the transform and writes the result to `output`
/// (or [`default_output_path`]). Nothing is written if the transform fails.
pub fn process_file(
    input: &Path,
    output: Option<&Path>,
    settings: GradientSettings,
) -> Result<(PathBuf, TransformReport)> {
    let transform = GradientInfill::new(settings)?;
    let text = std::fs::read_to_string(input)?;

    let (result, report) = transform.process_with_report(&text)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));
    std::fs::write(&output, result)?;

    tracing::info!("Wrote {}", output.display());
    Ok((output, report))
}
