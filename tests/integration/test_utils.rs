//! Test utilities for integration tests.
//!
//! This module provides a recording renderer and builders for the objects
//! the scenarios load.

use spatialdata_view::layer::{LayerHandle, LayerSink, LayerSpec, MemorySink};
use spatialdata_view::{
    CoordinateSystemController, Element, ElementKey, ObjectId, RenderThresholds,
    SpatialDataObject, Transform,
};

// =============================================================================
// Recording Sink
// =============================================================================

/// One call received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkOp {
    Create { handle: LayerHandle, name: String },
    Update { handle: LayerHandle, visible: bool },
    Remove { handle: LayerHandle },
}

/// A renderer that keeps its layers in memory and logs every call.
#[derive(Debug, Default)]
pub struct RecordingSink {
    layers: MemorySink,
    ops: Vec<SinkOp>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &MemorySink {
        &self.layers
    }

    pub fn ops(&self) -> &[SinkOp] {
        &self.ops
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }
}

impl LayerSink for RecordingSink {
    fn create_layer(&mut self, spec: &LayerSpec) -> LayerHandle {
        let handle = self.layers.create_layer(spec);
        self.ops.push(SinkOp::Create {
            handle,
            name: spec.name.clone(),
        });
        handle
    }

    fn update_layer(&mut self, handle: LayerHandle, spec: &LayerSpec) {
        self.layers.update_layer(handle, spec);
        self.ops.push(SinkOp::Update {
            handle,
            visible: spec.visible,
        });
    }

    fn remove_layer(&mut self, handle: LayerHandle) {
        self.layers.remove_layer(handle);
        self.ops.push(SinkOp::Remove { handle });
    }
}

// =============================================================================
// Builders
// =============================================================================

pub type TestController = CoordinateSystemController<RecordingSink>;

/// Controller with the given point and polygon thresholds.
pub fn controller_with_thresholds(points: i64, polygons: i64) -> TestController {
    CoordinateSystemController::new(RecordingSink::new(), RenderThresholds::new(points, polygons))
}

pub fn controller() -> TestController {
    CoordinateSystemController::new(RecordingSink::new(), RenderThresholds::default())
}

pub fn key(object: &str, name: &str) -> ElementKey {
    ElementKey::new(object, name)
}

pub fn oid(id: &str) -> ObjectId {
    ObjectId::new(id)
}

/// O1: 5000 "cells" points in "global" (scale 2) and an "image" in "o1_local".
pub fn object_o1() -> SpatialDataObject {
    SpatialDataObject::new("o1")
        .with_element(Element::points("cells", 5000))
        .with_element(Element::image("image", 1024, 1024))
        .with_transform("cells", "global", Transform::from_scale(2.0, 2.0))
        .with_transform("image", "o1_local", Transform::IDENTITY)
}

/// O2: aligns "global" into "aligned" and brings its own "tissue" image.
pub fn object_o2() -> SpatialDataObject {
    SpatialDataObject::new("o2")
        .with_element(Element::image("tissue", 512, 512))
        .with_transform("tissue", "aligned", Transform::IDENTITY)
        .with_alignment("global", "aligned", Transform::from_translation(10.0, 0.0))
}

/// Names of the systems listed by the controller.
pub fn system_names(controller: &TestController) -> Vec<String> {
    controller
        .list_systems()
        .iter()
        .map(|s| s.to_string())
        .collect()
}
