//! Shared render thresholds.
//!
//! The thresholds are shared mutable state: the configuration layer sets
//! them at start-up or at runtime, and the render policy reads them each
//! time it decides. Existing layer records are not touched by a change; the
//! new values apply from the next relink.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Default maximum number of points drawn per layer.
pub const DEFAULT_POINT_THRESHOLD: i64 = 100_000;

/// Default maximum number of polygons drawn per layer.
pub const DEFAULT_POLYGON_THRESHOLD: i64 = 500;

#[derive(Debug)]
struct ThresholdValues {
    points: AtomicI64,
    polygons: AtomicI64,
}

/// Cloneable handle to the point and polygon thresholds.
///
/// All clones observe the same values. A threshold of zero or below means
/// "no limit".
#[derive(Debug, Clone)]
pub struct RenderThresholds {
    inner: Arc<ThresholdValues>,
}

impl Default for RenderThresholds {
    fn default() -> Self {
        Self::new(DEFAULT_POINT_THRESHOLD, DEFAULT_POLYGON_THRESHOLD)
    }
}

impl RenderThresholds {
    pub fn new(points: i64, polygons: i64) -> Self {
        Self {
            inner: Arc::new(ThresholdValues {
                points: AtomicI64::new(points),
                polygons: AtomicI64::new(polygons),
            }),
        }
    }

    pub fn point_threshold(&self) -> i64 {
        self.inner.points.load(Ordering::Relaxed)
    }

    pub fn polygon_threshold(&self) -> i64 {
        self.inner.polygons.load(Ordering::Relaxed)
    }

    pub fn set_point_threshold(&self, value: i64) {
        self.inner.points.store(value, Ordering::Relaxed);
    }

    pub fn set_polygon_threshold(&self, value: i64) {
        self.inner.polygons.store(value, Ordering::Relaxed);
    }

    /// Point limit, `None` when unlimited.
    pub fn point_limit(&self) -> Option<usize> {
        as_limit(self.point_threshold())
    }

    /// Polygon limit, `None` when unlimited.
    pub fn polygon_limit(&self) -> Option<usize> {
        as_limit(self.polygon_threshold())
    }
}

fn as_limit(threshold: i64) -> Option<usize> {
    (threshold > 0).then(|| usize::try_from(threshold).unwrap_or(usize::MAX))
}
