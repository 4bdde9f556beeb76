//! Configuration for the inspection binary.
//!
//! Options come from:
//! - Command-line arguments via clap
//! - Environment variables with the `SDV_` prefix
//! - Defaults matching the render policy's
//!
//! # Environment Variables
//!
//! - `SDV_MANIFEST` - Scene manifest (JSON) to load
//! - `SDV_COORDINATE_SYSTEM` - System to activate (default: every system in turn)
//! - `SDV_POINT_THRESHOLD` - Max points drawn per layer, 0 for no limit (default: 100000)
//! - `SDV_POLYGON_THRESHOLD` - Max polygons drawn per layer, 0 for no limit (default: 500)
//! - `SDV_VIEW_DOWNSAMPLE` - View downsample used for pyramid level choice
//! - `SDV_CIRCLE_MARKER_THRESHOLD` - Circle count from which circles are drawn as markers (default: 10000)
//! - `SDV_SIMPLIFY_POLYGON_COUNT` - Drawn polygon count from which outlines are simplified (default: 100)
//! - `SDV_HIDE` - Comma-separated layer names to hide
//! - `SDV_FORMAT` - Output format, `table` or `json` (default: table)

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::policy::{
    RenderPolicy, RenderThresholds, DEFAULT_CIRCLE_MARKER_THRESHOLD,
    DEFAULT_POINT_THRESHOLD, DEFAULT_POLYGON_THRESHOLD, DEFAULT_SIMPLIFY_POLYGON_COUNT,
};

/// Output format of the layer report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Inspect how a SpatialData scene links into coordinate systems.
#[derive(Parser, Debug, Clone)]
#[command(name = "spatialdata-view")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Scene manifest listing already-parsed SpatialData objects.
    #[arg(env = "SDV_MANIFEST")]
    pub manifest: PathBuf,

    /// Coordinate system to activate. Every system is reported when omitted.
    #[arg(short, long, env = "SDV_COORDINATE_SYSTEM")]
    pub coordinate_system: Option<String>,

    // =========================================================================
    // Render Policy
    // =========================================================================
    /// Maximum number of points drawn per layer (0 or less: no limit).
    #[arg(
        long,
        default_value_t = DEFAULT_POINT_THRESHOLD,
        env = "SDV_POINT_THRESHOLD",
        allow_negative_numbers = true
    )]
    pub point_threshold: i64,

    /// Maximum number of polygons drawn per layer (0 or less: no limit).
    #[arg(
        long,
        default_value_t = DEFAULT_POLYGON_THRESHOLD,
        env = "SDV_POLYGON_THRESHOLD",
        allow_negative_numbers = true
    )]
    pub polygon_threshold: i64,

    /// Downsample factor of the view, used to pick pyramid levels.
    #[arg(long, env = "SDV_VIEW_DOWNSAMPLE")]
    pub view_downsample: Option<f64>,

    /// Circle count from which circles are drawn as point markers.
    #[arg(
        long,
        default_value_t = DEFAULT_CIRCLE_MARKER_THRESHOLD,
        env = "SDV_CIRCLE_MARKER_THRESHOLD"
    )]
    pub circle_marker_threshold: usize,

    /// Drawn polygon count from which outlines are simplified.
    #[arg(
        long,
        default_value_t = DEFAULT_SIMPLIFY_POLYGON_COUNT,
        env = "SDV_SIMPLIFY_POLYGON_COUNT"
    )]
    pub simplify_polygon_count: usize,

    // =========================================================================
    // Output
    // =========================================================================
    /// Layers to hide, by layer name.
    #[arg(long, env = "SDV_HIDE", value_delimiter = ',')]
    pub hide: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table, env = "SDV_FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.manifest.as_os_str().is_empty() {
            return Err("A scene manifest is required. Pass a path or set SDV_MANIFEST".to_string());
        }

        if let Some(ref system) = self.coordinate_system {
            if system.trim().is_empty() {
                return Err("coordinate_system must not be empty".to_string());
            }
        }

        if let Some(downsample) = self.view_downsample {
            if !downsample.is_finite() || downsample <= 0.0 {
                return Err("view_downsample must be a positive number".to_string());
            }
        }

        if self.hide.iter().any(|name| name.is_empty()) {
            return Err("hide must not contain empty layer names".to_string());
        }

        Ok(())
    }

    /// Threshold handle seeded from the configured values.
    pub fn thresholds(&self) -> RenderThresholds {
        RenderThresholds::new(self.point_threshold, self.polygon_threshold)
    }

    /// Render policy built from the configured thresholds and view scale.
    pub fn policy(&self) -> RenderPolicy {
        let mut policy = RenderPolicy::new(self.thresholds())
            .with_circle_marker_threshold(self.circle_marker_threshold)
            .with_simplify_polygon_count(self.simplify_polygon_count);
        policy.set_view_downsample(self.view_downsample);
        policy
    }
}

// =============================================================================
// Tests
// =============================================================================
