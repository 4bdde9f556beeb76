//! Element payload metadata.
//!
//! Elements arrive already parsed: the engine never touches pixel or
//! geometry buffers, only the shape metadata needed to pick a layer
//! representation (pyramid levels, instance counts, axes).

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Element
// =============================================================================

/// One element of a SpatialData object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Name, unique within the owning object
    pub name: String,

    #[serde(flatten)]
    pub data: ElementData,
}

impl Element {
    pub fn new(name: impl Into<String>, data: ElementData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Single-scale 2-D image of the given size.
    pub fn image(name: impl Into<String>, width: u64, height: u64) -> Self {
        Self::new(
            name,
            ElementData::Image(RasterData::single_scale(width, height)),
        )
    }

    /// Single-scale 2-D label image of the given size.
    pub fn labels(name: impl Into<String>, width: u64, height: u64) -> Self {
        Self::new(
            name,
            ElementData::Labels(RasterData::single_scale(width, height)),
        )
    }

    pub fn points(name: impl Into<String>, count: usize) -> Self {
        Self::new(name, ElementData::Points(PointsData::new(count)))
    }

    pub fn circles(name: impl Into<String>, count: usize) -> Self {
        Self::new(
            name,
            ElementData::Shapes(ShapesData::new(ShapeGeometry::Circles, count)),
        )
    }

    pub fn polygons(name: impl Into<String>, count: usize) -> Self {
        Self::new(
            name,
            ElementData::Shapes(ShapesData::new(ShapeGeometry::Polygons, count)),
        )
    }

    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }
}

// =============================================================================
// ElementData
// =============================================================================

/// Type-specific metadata of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementData {
    Image(RasterData),
    Labels(RasterData),
    Points(PointsData),
    Shapes(ShapesData),

    /// An element the parser recognised but that has no layer representation
    Unsupported { type_name: String },
}

impl ElementData {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementData::Image(_) => ElementKind::Image,
            ElementData::Labels(_) => ElementKind::Labels,
            ElementData::Points(_) => ElementKind::Points,
            ElementData::Shapes(_) => ElementKind::Shapes,
            ElementData::Unsupported { .. } => ElementKind::Unsupported,
        }
    }
}

/// Element type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Image,
    Labels,
    Points,
    Shapes,
    Unsupported,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Image => "image",
            ElementKind::Labels => "labels",
            ElementKind::Points => "points",
            ElementKind::Shapes => "shapes",
            ElementKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Raster Data
// =============================================================================

/// Shape of one pyramid level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleLevel {
    pub width: u64,
    pub height: u64,
}

/// Images and labels: a pyramid of decreasing-resolution levels.
///
/// Level 0 is full resolution. A single-level pyramid is a plain
/// (non-multiscale) raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterData {
    pub levels: Vec<ScaleLevel>,

    /// Axis names, channel axis first when present (e.g. `["c", "y", "x"]`)
    #[serde(default = "default_raster_axes")]
    pub axes: Vec<String>,

    /// Size of the channel axis
    #[serde(default)]
    pub channels: Option<u32>,
}

fn default_raster_axes() -> Vec<String> {
    vec!["y".to_string(), "x".to_string()]
}

impl RasterData {
    pub fn single_scale(width: u64, height: u64) -> Self {
        Self::multiscale(vec![ScaleLevel { width, height }])
    }

    pub fn multiscale(levels: Vec<ScaleLevel>) -> Self {
        Self {
            levels,
            axes: default_raster_axes(),
            channels: None,
        }
    }

    /// Builds a pyramid by repeatedly halving the full-resolution shape.
    pub fn halving_pyramid(width: u64, height: u64, level_count: usize) -> Self {
        let levels = (0..level_count.max(1))
            .map(|i| ScaleLevel {
                width: (width >> i).max(1),
                height: (height >> i).max(1),
            })
            .collect();
        Self::multiscale(levels)
    }

    /// Adds a leading channel axis of the given size.
    pub fn with_channels(mut self, channels: u32) -> Self {
        if !self.axes.iter().any(|a| a == "c") {
            self.axes.insert(0, "c".to_string());
        }
        self.channels = Some(channels);
        self
    }

    pub fn is_multiscale(&self) -> bool {
        self.levels.len() > 1
    }

    pub fn is_3d(&self) -> bool {
        self.axes.iter().any(|a| a == "z")
    }

    /// Three- or four-channel rasters are shown as RGB(A).
    pub fn is_rgb(&self) -> bool {
        self.axes.iter().any(|a| a == "c") && matches!(self.channels, Some(3) | Some(4))
    }

    /// Downsample factor of a level relative to level 0 (largest of both axes).
    pub fn downsample(&self, level: usize) -> Option<f64> {
        let base = self.levels.first()?;
        let lvl = self.levels.get(level)?;
        let dx = base.width as f64 / lvl.width.max(1) as f64;
        let dy = base.height as f64 / lvl.height.max(1) as f64;
        Some(dx.max(dy))
    }
}

// =============================================================================
// Points and Shapes
// =============================================================================

/// Point clouds (e.g. transcript locations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsData {
    pub count: usize,

    #[serde(default = "default_point_axes")]
    pub axes: Vec<String>,
}

fn default_point_axes() -> Vec<String> {
    vec!["x".to_string(), "y".to_string()]
}

impl PointsData {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            axes: default_point_axes(),
        }
    }
}

/// Geometry family of a shapes element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeGeometry {
    /// Points with a radius
    Circles,
    Polygons,
    /// Only the largest part of each multipolygon is displayed
    MultiPolygons,
}

/// Shapes (cell boundaries, spots).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapesData {
    pub geometry: ShapeGeometry,

    /// Number of shape instances
    pub count: usize,
}

impl ShapesData {
    pub fn new(geometry: ShapeGeometry, count: usize) -> Self {
        Self { geometry, count }
    }
}
