//! Render policy and thresholds.
//!
//! - [`RenderThresholds`]: shared point/polygon limits
//! - [`RenderPolicy`]: per-element decision between full, subsampled and
//!   multiscale rendering

mod render_policy;
mod thresholds;

pub use render_policy::{
    stride_indices, RenderDecision, RenderPolicy, Representation,
    DEFAULT_CIRCLE_MARKER_THRESHOLD, DEFAULT_SIMPLIFY_POLYGON_COUNT, DEFAULT_SIMPLIFY_TOLERANCE,
};
pub use thresholds::{RenderThresholds, DEFAULT_POINT_THRESHOLD, DEFAULT_POLYGON_THRESHOLD};
