//! Rendering collaborator interface.
//!
//! The engine depends on nothing of the renderer except the three calls of
//! [`LayerSink`]. [`MemorySink`] keeps the layers in memory; it backs the
//! inspection binary and the tests.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{Element, ElementAnnotation, ElementKey};
use crate::policy::RenderDecision;
use crate::transform::Transform;

// =============================================================================
// Layer Handle and Spec
// =============================================================================

/// Opaque handle of a rendered layer, issued by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LayerHandle(pub u64);

impl fmt::Display for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Everything the renderer needs to draw one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub key: ElementKey,

    /// Data reference
    pub data: Arc<Element>,

    /// Layer name shown in the layer list
    pub name: String,

    /// Element-local to world coordinates
    pub transform: Transform,

    pub visible: bool,
    pub decision: RenderDecision,
    pub annotation: Option<Arc<ElementAnnotation>>,
}

// =============================================================================
// LayerSink Trait
// =============================================================================

/// The rendering collaborator.
///
/// Calls never fail from the engine's point of view: a renderer that cannot
/// draw a layer is expected to deal with it on its side.
pub trait LayerSink {
    /// Create a layer and return its handle.
    fn create_layer(&mut self, spec: &LayerSpec) -> LayerHandle;

    /// Replace the parameters of an existing layer.
    fn update_layer(&mut self, handle: LayerHandle, spec: &LayerSpec);

    /// Remove a layer; its handle is not used again.
    fn remove_layer(&mut self, handle: LayerHandle);
}

// =============================================================================
// MemorySink
// =============================================================================

/// Number of calls received by a [`MemorySink`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SinkStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

/// In-memory renderer keeping the latest spec of every live layer.
#[derive(Debug, Default)]
pub struct MemorySink {
    layers: IndexMap<LayerHandle, LayerSpec>,
    next_handle: u64,
    stats: SinkStats,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, handle: LayerHandle) -> Option<&LayerSpec> {
        self.layers.get(&handle)
    }

    /// Live layers in creation order.
    pub fn layers(&self) -> impl Iterator<Item = (LayerHandle, &LayerSpec)> {
        self.layers.iter().map(|(handle, spec)| (*handle, spec))
    }

    /// Live layers currently shown.
    pub fn visible_layers(&self) -> impl Iterator<Item = &LayerSpec> {
        self.layers.values().filter(|spec| spec.visible)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn stats(&self) -> SinkStats {
        self.stats
    }
}

impl LayerSink for MemorySink {
    fn create_layer(&mut self, spec: &LayerSpec) -> LayerHandle {
        let handle = LayerHandle(self.next_handle);
        self.next_handle += 1;
        self.layers.insert(handle, spec.clone());
        self.stats.created += 1;
        handle
    }

    fn update_layer(&mut self, handle: LayerHandle, spec: &LayerSpec) {
        if let Some(current) = self.layers.get_mut(&handle) {
            *current = spec.clone();
            self.stats.updated += 1;
        }
    }

    fn remove_layer(&mut self, handle: LayerHandle) {
        if self.layers.shift_remove(&handle).is_some() {
            self.stats.removed += 1;
        }
    }
}
