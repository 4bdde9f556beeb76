//! Catalog of loaded elements.
//!
//! Every element of every loaded SpatialData object is registered here under
//! its [`ElementKey`](crate::model::ElementKey), together with the annotation
//! rows its object's table provides for it.

mod element_registry;

pub use element_registry::{ElementRegistry, RegisteredElement, Registration};
