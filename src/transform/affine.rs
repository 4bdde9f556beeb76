//! 2-D affine transforms between element and coordinate-system space.
//!
//! Transforms are stored as [`glam::DAffine2`]. They are serialized as
//! spatialdata-style transformation specs (`identity`, `scale`,
//! `translation`, `affine`, `sequence`) so scene manifests can describe
//! them the way the container format does.

use glam::{DAffine2, DMat2, DVec2};
use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// Smallest accepted ratio between the determinant and the product of the
/// column lengths. The ratio is the sine of the angle between the columns,
/// so it does not depend on the units of either space.
pub const DEGENERATE_EPSILON: f64 = 1e-12;

// =============================================================================
// Transform
// =============================================================================

/// Affine map from one space into another, in `(x, y)` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransformSpec", into = "TransformSpec")]
pub struct Transform(DAffine2);

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self(DAffine2::IDENTITY);

    pub fn from_affine(affine: DAffine2) -> Self {
        Self(affine)
    }

    pub fn from_scale(sx: f64, sy: f64) -> Self {
        Self(DAffine2::from_scale(DVec2::new(sx, sy)))
    }

    pub fn from_translation(tx: f64, ty: f64) -> Self {
        Self(DAffine2::from_translation(DVec2::new(tx, ty)))
    }

    /// Builds a transform from a row-major homogeneous 3x3 matrix.
    pub fn from_matrix(m: [[f64; 3]; 3]) -> Result<Self, ManifestError> {
        let bottom = m[2];
        if bottom[0] != 0.0 || bottom[1] != 0.0 || bottom[2] != 1.0 {
            return Err(ManifestError::InvalidAffine(bottom));
        }
        Ok(Self(DAffine2::from_mat2_translation(
            DMat2::from_cols(DVec2::new(m[0][0], m[1][0]), DVec2::new(m[0][1], m[1][1])),
            DVec2::new(m[0][2], m[1][2]),
        )))
    }

    /// Row-major homogeneous 3x3 matrix.
    pub fn to_matrix(&self) -> [[f64; 3]; 3] {
        let m = self.0.matrix2;
        let t = self.0.translation;
        [
            [m.x_axis.x, m.y_axis.x, t.x],
            [m.x_axis.y, m.y_axis.y, t.y],
            [0.0, 0.0, 1.0],
        ]
    }

    pub fn as_affine(&self) -> &DAffine2 {
        &self.0
    }

    /// Apply `self` first, then `next`.
    ///
    /// The result is the matrix product `next * self`.
    #[must_use]
    pub fn then(&self, next: &Transform) -> Transform {
        Transform(next.0 * self.0)
    }

    pub fn determinant(&self) -> f64 {
        self.0.matrix2.determinant()
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    /// True when the linear part has full rank relative to its own scale
    /// and the inverse is finite.
    pub fn is_invertible(&self) -> bool {
        if !self.is_finite() {
            return false;
        }
        let m = self.0.matrix2;
        let scale = m.x_axis.length() * m.y_axis.length();
        let det = self.determinant();
        det != 0.0 && det.abs() > DEGENERATE_EPSILON * scale && self.0.inverse().is_finite()
    }

    pub fn inverse(&self) -> Option<Transform> {
        self.is_invertible().then(|| Transform(self.0.inverse()))
    }

    pub fn transform_point(&self, point: [f64; 2]) -> [f64; 2] {
        let p = self.0.transform_point2(DVec2::new(point[0], point[1]));
        [p.x, p.y]
    }

    /// Component-wise comparison within `tolerance`.
    pub fn abs_diff_eq(&self, other: &Transform, tolerance: f64) -> bool {
        self.0.abs_diff_eq(other.0, tolerance)
    }
}

// =============================================================================
// Transformation Specs
// =============================================================================

/// Serialized form of a transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformSpec {
    Identity,
    Scale {
        scale: [f64; 2],
    },
    Translation {
        translation: [f64; 2],
    },
    /// Row-major homogeneous matrix
    Affine {
        matrix: [[f64; 3]; 3],
    },
    /// Applied in order: the first entry maps element space first
    Sequence {
        transformations: Vec<TransformSpec>,
    },
}

impl TryFrom<TransformSpec> for Transform {
    type Error = ManifestError;

    fn try_from(spec: TransformSpec) -> Result<Self, Self::Error> {
        match spec {
            TransformSpec::Identity => Ok(Transform::IDENTITY),
            TransformSpec::Scale { scale } => Ok(Transform::from_scale(scale[0], scale[1])),
            TransformSpec::Translation { translation } => {
                Ok(Transform::from_translation(translation[0], translation[1]))
            }
            TransformSpec::Affine { matrix } => Transform::from_matrix(matrix),
            TransformSpec::Sequence { transformations } => {
                transformations
                    .into_iter()
                    .try_fold(Transform::IDENTITY, |acc, step| -> Result<_, ManifestError> {
                        Ok(acc.then(&Transform::try_from(step)?))
                    })
            }
        }
    }
}

impl From<Transform> for TransformSpec {
    fn from(transform: Transform) -> Self {
        TransformSpec::Affine {
            matrix: transform.to_matrix(),
        }
    }
}
