use thiserror::Error;

use crate::model::{CoordinateSystem, ElementKey, ObjectId};

/// Errors from resolving an element's transform into a coordinate system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// No direct transform and no alignment chain reaches the target system
    #[error("no transform path from {element} into coordinate system '{system}'")]
    NotFound {
        element: ElementKey,
        system: CoordinateSystem,
    },

    /// A transform on the resolved path cannot be inverted
    #[error(
        "degenerate transform from {element} into '{system}' (hop {from} -> {to}, determinant {determinant:e})"
    )]
    DegenerateTransform {
        element: ElementKey,
        system: CoordinateSystem,
        from: String,
        to: String,
        determinant: f64,
    },
}

/// Errors raised while cataloguing elements.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// Instance-key values of the annotating table are not unique for an element
    #[error(
        "annotation mismatch for {element}: instance key '{instance_key}' value {instance} appears {occurrences} times"
    )]
    AnnotationMismatch {
        element: ElementKey,
        instance_key: String,
        instance: i64,
        occurrences: usize,
    },

    /// Operation on an object that was never registered
    #[error("unknown SpatialData object '{0}'")]
    UnknownObject(ObjectId),
}

/// Errors raised by the render policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// The element type has no layer representation
    #[error("unsupported element type '{type_name}' for {element}")]
    UnsupportedElementType { element: String, type_name: String },
}

/// A per-element failure collected during a relink pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinkError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// No layer record exists for the element
    #[error("no layer record for {0}")]
    UnknownElement(ElementKey),
}

/// Errors returned to the UI by the coordinate-system controller.
///
/// These reject the whole operation; the engine state is left unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    /// The requested system is not declared by any loaded object
    #[error("unknown coordinate system '{0}'")]
    UnknownCoordinateSystem(String),

    /// The object is not loaded
    #[error("unknown SpatialData object '{0}'")]
    UnknownObject(ObjectId),

    /// The element is not registered
    #[error("unknown element {0}")]
    UnknownElement(ElementKey),

    /// An element-level failure that makes an atomic operation impossible
    #[error("operation rolled back: {0}")]
    RolledBack(#[from] LinkError),
}

/// Errors raised while reading a scene manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid JSON for the scene schema
    #[error("invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),

    /// An affine matrix is not a homogeneous 2-D transform
    #[error("invalid affine matrix: bottom row must be [0, 0, 1], got {0:?}")]
    InvalidAffine([f64; 3]),
}
