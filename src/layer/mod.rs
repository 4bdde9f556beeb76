//! Layer linking.
//!
//! This module connects registered elements to renderer layers:
//!
//! - [`LayerSink`]: the rendering collaborator (create/update/remove)
//! - [`LayerRecord`]: per-element link state, with remembered and displayed
//!   visibility kept apart
//! - [`LayerLinker`]: relinks every element when the active coordinate
//!   system, an annotation table or the element set changes
//!
//! # Example
//!
//! ```
//! use spatialdata_view::layer::{LayerLinker, MemorySink};
//! use spatialdata_view::model::{CoordinateSystem, Element, ElementKey, ObjectId};
//! use spatialdata_view::policy::RenderPolicy;
//! use spatialdata_view::transform::Transform;
//!
//! let mut linker = LayerLinker::new(MemorySink::new(), RenderPolicy::default());
//! let object = ObjectId::new("sample");
//! let global = CoordinateSystem::new("global");
//!
//! linker.register_object(&object, None);
//! linker
//!     .graph_mut()
//!     .declare_transform(&ElementKey::new("sample", "cells"), &global, Transform::IDENTITY);
//! linker.add_element(&object, Element::points("cells", 10));
//!
//! let report = linker.activate_coordinate_system(&global);
//! assert_eq!(report.displayed.len(), 1);
//! ```

mod linker;
mod record;
mod sink;

pub use linker::{ElementIssue, LayerLinker, LinkReport};
pub use record::{LayerRecord, LayerSummary};
pub use sink::{LayerHandle, LayerSink, LayerSpec, MemorySink, SinkStats};
