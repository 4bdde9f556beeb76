//! Render policy for choosing each element's layer representation.
//!
//! # Rules
//!
//! - Points: above the point threshold, a deterministic stride-based subset
//!   of exactly `threshold` instances is drawn.
//! - Circles: subsampled like points; above [`DEFAULT_CIRCLE_MARKER_THRESHOLD`]
//!   circles they are drawn as point markers instead of ellipses.
//! - Polygons: above the polygon threshold a stride-based subset is drawn;
//!   layers drawing [`DEFAULT_SIMPLIFY_POLYGON_COUNT`] polygons or more carry
//!   a simplification tolerance.
//! - Multiscale images and labels: the coarsest pyramid level still adequate
//!   for the current view downsample, or the coarsest level when the view
//!   scale is unknown. Finer levels are requested by the renderer itself as
//!   it zooms.

use std::sync::Arc;

use serde::Serialize;

use crate::error::PolicyError;
use crate::model::{Element, ElementData, RasterData, ShapeGeometry};

use super::thresholds::RenderThresholds;

/// Circle count from which circles are drawn as point markers.
pub const DEFAULT_CIRCLE_MARKER_THRESHOLD: usize = 10_000;

/// Polygon count from which polygon outlines are simplified.
pub const DEFAULT_SIMPLIFY_POLYGON_COUNT: usize = 100;

/// Simplification tolerance for polygon outlines, in element units.
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 2.0;

/// Relative slack when comparing pyramid downsample factors.
const DOWNSAMPLE_TOLERANCE: f64 = 0.01;

// =============================================================================
// Render Decision
// =============================================================================

/// How a layer draws its element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Representation {
    Image { rgb: bool },
    Labels,
    Points,
    Ellipses,
    /// Circles drawn as fixed-size point markers
    CircleMarkers,
    Polygons { simplify_tolerance: Option<f64> },
}

/// Output of [`RenderPolicy::decide`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderDecision {
    /// Pyramid level hint for multiscale rasters (0 = full resolution)
    pub level: Option<usize>,

    /// Whether only a subset of the instances is drawn
    pub subsample: bool,

    /// Instances drawn when subsampling, strictly ascending
    pub indices: Option<Arc<[usize]>>,

    pub representation: Representation,
}

impl RenderDecision {
    fn full(representation: Representation) -> Self {
        Self {
            level: None,
            subsample: false,
            indices: None,
            representation,
        }
    }

    /// Number of instances drawn out of `total`.
    pub fn drawn(&self, total: usize) -> usize {
        self.indices.as_ref().map_or(total, |indices| indices.len())
    }
}

// =============================================================================
// Render Policy
// =============================================================================

/// Decides per element between full, subsampled and multiscale rendering.
#[derive(Debug, Clone)]
pub struct RenderPolicy {
    thresholds: RenderThresholds,

    /// Coarsest downsample the current view can show without visible loss
    view_downsample: Option<f64>,

    circle_marker_threshold: usize,
    simplify_polygon_count: usize,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::new(RenderThresholds::default())
    }
}

impl RenderPolicy {
    pub fn new(thresholds: RenderThresholds) -> Self {
        Self {
            thresholds,
            view_downsample: None,
            circle_marker_threshold: DEFAULT_CIRCLE_MARKER_THRESHOLD,
            simplify_polygon_count: DEFAULT_SIMPLIFY_POLYGON_COUNT,
        }
    }

    pub fn with_circle_marker_threshold(mut self, count: usize) -> Self {
        self.circle_marker_threshold = count;
        self
    }

    pub fn with_simplify_polygon_count(mut self, count: usize) -> Self {
        self.simplify_polygon_count = count;
        self
    }

    pub fn thresholds(&self) -> &RenderThresholds {
        &self.thresholds
    }

    /// Set the view-scale hint; `None` means unknown.
    pub fn set_view_downsample(&mut self, downsample: Option<f64>) {
        self.view_downsample = downsample.filter(|d| d.is_finite() && *d > 0.0);
    }

    pub fn view_downsample(&self) -> Option<f64> {
        self.view_downsample
    }

    /// Decide how to render `element`.
    ///
    /// # Errors
    ///
    /// `UnsupportedElementType` for elements without a layer representation
    /// (unknown types and 3-D images).
    pub fn decide(&self, element: &Element) -> Result<RenderDecision, PolicyError> {
        match &element.data {
            ElementData::Image(raster) => {
                if raster.is_3d() {
                    return Err(PolicyError::UnsupportedElementType {
                        element: element.name.clone(),
                        type_name: "image3d".to_string(),
                    });
                }
                Ok(self.decide_raster(
                    raster,
                    Representation::Image {
                        rgb: raster.is_rgb(),
                    },
                ))
            }
            ElementData::Labels(raster) => Ok(self.decide_raster(raster, Representation::Labels)),
            ElementData::Points(points) => Ok(subsampled(
                points.count,
                self.thresholds.point_limit(),
                Representation::Points,
            )),
            ElementData::Shapes(shapes) => Ok(match shapes.geometry {
                ShapeGeometry::Circles => {
                    let representation = if shapes.count < self.circle_marker_threshold {
                        Representation::Ellipses
                    } else {
                        Representation::CircleMarkers
                    };
                    subsampled(shapes.count, self.thresholds.point_limit(), representation)
                }
                ShapeGeometry::Polygons | ShapeGeometry::MultiPolygons => {
                    let limit = self.thresholds.polygon_limit();
                    let drawn = limit.map_or(shapes.count, |l| shapes.count.min(l));
                    let simplify_tolerance = (drawn >= self.simplify_polygon_count)
                        .then_some(DEFAULT_SIMPLIFY_TOLERANCE);
                    subsampled(
                        shapes.count,
                        limit,
                        Representation::Polygons { simplify_tolerance },
                    )
                }
            }),
            ElementData::Unsupported { type_name } => Err(PolicyError::UnsupportedElementType {
                element: element.name.clone(),
                type_name: type_name.clone(),
            }),
        }
    }

    fn decide_raster(&self, raster: &RasterData, representation: Representation) -> RenderDecision {
        let mut decision = RenderDecision::full(representation);
        if raster.is_multiscale() {
            decision.level = Some(self.pick_level(raster));
        }
        decision
    }

    /// Coarsest level whose downsample does not exceed the view downsample.
    fn pick_level(&self, raster: &RasterData) -> usize {
        let coarsest = raster.levels.len().saturating_sub(1);
        let Some(target) = self.view_downsample else {
            return coarsest;
        };

        (0..raster.levels.len())
            .filter(|&level| {
                raster
                    .downsample(level)
                    .is_some_and(|d| d <= target * (1.0 + DOWNSAMPLE_TOLERANCE))
            })
            .last()
            .unwrap_or(0)
    }
}

fn subsampled(count: usize, limit: Option<usize>, representation: Representation) -> RenderDecision {
    let mut decision = RenderDecision::full(representation);
    if let Some(limit) = limit.filter(|&l| count > l) {
        decision.subsample = true;
        decision.indices = Some(stride_indices(count, limit));
    }
    decision
}

/// `limit` evenly spread indices out of `0..count`, strictly ascending.
///
/// Only depends on its inputs, so repeated calls select the same subset.
pub fn stride_indices(count: usize, limit: usize) -> Arc<[usize]> {
    let limit = limit.min(count);
    (0..limit)
        .map(|i| ((i as u128 * count as u128) / limit as u128) as usize)
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
