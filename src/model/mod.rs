//! Data model of the engine.
//!
//! These are the already-parsed inputs the storage collaborator hands over:
//! SpatialData objects, their elements, annotation tables and transform
//! declarations, plus the identifiers used across all components.
//!
//! ```text
//! SpatialDataObject
//!  ├── elements:   [Element { name, ElementData }]
//!  ├── table:      AnnotationTable (rows keyed by region + instance id)
//!  ├── transforms: [(element, CoordinateSystem, Transform)]
//!  └── alignments: [(CoordinateSystem -> CoordinateSystem, Transform)]
//! ```

mod coordinate_system;
mod element;
mod manifest;
mod object;
mod table;

pub use coordinate_system::{CoordinateSystem, ElementKey, ObjectId};
pub use element::{
    Element, ElementData, ElementKind, PointsData, RasterData, ScaleLevel, ShapeGeometry,
    ShapesData,
};
pub use manifest::SceneManifest;
pub use object::{ElementTransform, SpatialDataObject, SystemAlignment};
pub use table::{
    AnnotationTable, ElementAnnotation, TableRow, DEFAULT_INSTANCE_KEY, DEFAULT_REGION_KEY,
};
