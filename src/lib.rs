//! # spatialdata-view
//!
//! The coordinate-system and layer-linking engine of a SpatialData viewer.
//!
//! A SpatialData object bundles images, labels, points and shapes, each with
//! transforms into one or more named coordinate systems. This crate keeps
//! one rendered layer per loaded element and, whenever the user switches
//! coordinate system, re-derives each layer's transform, render strategy and
//! visibility. Parsing files and drawing pixels are left to collaborators.
//!
//! ## Features
//!
//! - **Transform graph**: direct element transforms plus system-to-system
//!   alignments, composed along the shortest chain and cached
//! - **Multi-object registry**: stable layer order, per-object teardown,
//!   table-driven annotation
//! - **Render policy**: point/polygon subsampling thresholds and pyramid
//!   level choice for multiscale rasters
//! - **Visibility memory**: what the user hid stays hidden across switches
//!   and reloads; forced hiding never overwrites it
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  CoordinateSystemController                     │
//! │      list_systems · switch_to · load/unload · add element       │
//! │                              │                                  │
//! │                              ▼                                  │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                      LayerLinker                          │  │
//! │  │   ┌──────────────┐ ┌───────────────┐ ┌──────────────┐     │  │
//! │  │   │TransformGraph│ │ElementRegistry│ │ RenderPolicy │     │  │
//! │  │   └──────────────┘ └───────────────┘ └──────────────┘     │  │
//! │  └───────────────────────────┬───────────────────────────────┘  │
//! └──────────────────────────────┼──────────────────────────────────┘
//!                                ▼
//!                        LayerSink (renderer)
//! ```
//!
//! - [`model`] - Parsed inputs: objects, elements, tables, identifiers
//! - [`transform`] - Affine transforms and the transform graph
//! - [`registry`] - Element registry
//! - [`policy`] - Render thresholds and policy
//! - [`layer`] - Layer records, renderer interface and linker
//! - [`controller`] - Coordinate-system controller and shared handle
//! - [`config`] - CLI configuration of the inspection binary
//!
//! ## Example
//!
//! ```
//! use spatialdata_view::{
//!     CoordinateSystemController, Element, MemorySink, RenderThresholds, SpatialDataObject,
//!     Transform,
//! };
//!
//! let mut controller =
//!     CoordinateSystemController::new(MemorySink::new(), RenderThresholds::default());
//!
//! controller.load_object(
//!     SpatialDataObject::new("sample")
//!         .with_element(Element::points("cells", 5000))
//!         .with_transform("cells", "global", Transform::from_scale(0.5, 0.5)),
//! );
//!
//! let report = controller.switch_to("global").unwrap();
//! assert_eq!(report.displayed.len(), 1);
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod layer;
pub mod model;
pub mod policy;
pub mod registry;
pub mod transform;

// Re-export commonly used types
pub use config::{Config, OutputFormat};
pub use controller::{CoordinateSystemController, SharedController};
pub use error::{
    ControllerError, LinkError, ManifestError, PolicyError, RegistryError, TransformError,
};
pub use layer::{
    ElementIssue, LayerHandle, LayerLinker, LayerRecord, LayerSink, LayerSpec, LayerSummary,
    LinkReport, MemorySink,
};
pub use model::{
    AnnotationTable, CoordinateSystem, Element, ElementData, ElementKey, ElementKind, ObjectId,
    SceneManifest, SpatialDataObject,
};
pub use policy::{RenderDecision, RenderPolicy, RenderThresholds, Representation};
pub use registry::ElementRegistry;
pub use transform::{Transform, TransformGraph};
