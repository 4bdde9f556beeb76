//! Serialized access to a controller from concurrent tasks.
//!
//! UI callbacks may fire from several tasks at once. Every method of
//! [`SharedController`] runs one whole user action under a
//! [`tokio::sync::Mutex`], whose waiters are served first-in first-out, so
//! actions are queued and never interleave.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::ControllerError;
use crate::layer::{LayerSink, LayerSummary, LinkReport};
use crate::model::{
    AnnotationTable, CoordinateSystem, Element, ElementKey, ObjectId, SpatialDataObject,
};
use crate::transform::Transform;

use super::coordinate_system::CoordinateSystemController;

/// Cloneable, task-safe handle to a [`CoordinateSystemController`].
pub struct SharedController<S: LayerSink + Send> {
    inner: Arc<Mutex<CoordinateSystemController<S>>>,
}

impl<S: LayerSink + Send> Clone for SharedController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: LayerSink + Send> SharedController<S> {
    pub fn new(controller: CoordinateSystemController<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Run `f` as one action with exclusive access to the controller.
    pub async fn with<R>(&self, f: impl FnOnce(&mut CoordinateSystemController<S>) -> R) -> R {
        let mut controller = self.inner.lock().await;
        f(&mut controller)
    }

    pub async fn list_systems(&self) -> Vec<CoordinateSystem> {
        self.inner.lock().await.list_systems()
    }

    pub async fn current_system(&self) -> Option<CoordinateSystem> {
        self.inner.lock().await.current_system().cloned()
    }

    pub async fn switch_to(&self, system: &str) -> Result<LinkReport, ControllerError> {
        self.inner.lock().await.switch_to(system)
    }

    pub async fn load_object(&self, object: SpatialDataObject) -> LinkReport {
        self.inner.lock().await.load_object(object)
    }

    pub async fn unload_object(&self, object: &ObjectId) -> Result<LinkReport, ControllerError> {
        self.inner.lock().await.unload_object(object)
    }

    pub async fn add_single_element(
        &self,
        object: &ObjectId,
        element: Element,
        transform: Transform,
        system: impl Into<CoordinateSystem>,
    ) -> Result<LinkReport, ControllerError> {
        self.inner
            .lock()
            .await
            .add_single_element(object, element, transform, system)
    }

    pub async fn set_visibility(
        &self,
        key: &ElementKey,
        visible: bool,
    ) -> Result<(), ControllerError> {
        self.inner.lock().await.set_visibility(key, visible)
    }

    pub async fn update_table(
        &self,
        object: &ObjectId,
        table: Option<AnnotationTable>,
    ) -> Result<LinkReport, ControllerError> {
        self.inner.lock().await.update_table(object, table)
    }

    pub async fn refresh(&self) -> LinkReport {
        self.inner.lock().await.refresh()
    }

    pub async fn summaries(&self) -> Vec<LayerSummary> {
        self.inner.lock().await.summaries()
    }
}
