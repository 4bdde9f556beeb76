//! Coordinate-system controller.
//!
//! Top-level orchestrator consumed by the UI. It owns the layer linker
//! (and through it the transform graph, element registry and render
//! policy) and turns user actions into whole-engine operations:
//!
//! ```text
//!   load_object ──► register object ──► declare transforms/alignments
//!                                   └─► register elements ──► relink current
//!   switch_to   ──► validate system ──► activate_coordinate_system
//!   unload      ──► drop records/declarations ──► settle current ──► relink
//! ```
//!
//! Operations that reject their input leave the engine unchanged.

use tracing::{debug, info, warn};

use crate::error::{ControllerError, LinkError, RegistryError};
use crate::layer::{LayerLinker, LayerRecord, LayerSink, LayerSummary, LinkReport};
use crate::model::{
    AnnotationTable, CoordinateSystem, Element, ElementKey, ObjectId, SpatialDataObject,
};
use crate::policy::{RenderPolicy, RenderThresholds};
use crate::transform::Transform;

/// Orchestrates coordinate-system switching across loaded objects.
pub struct CoordinateSystemController<S: LayerSink> {
    linker: LayerLinker<S>,
}

impl<S: LayerSink> CoordinateSystemController<S> {
    pub fn new(sink: S, thresholds: RenderThresholds) -> Self {
        Self::with_policy(sink, RenderPolicy::new(thresholds))
    }

    pub fn with_policy(sink: S, policy: RenderPolicy) -> Self {
        Self {
            linker: LayerLinker::new(sink, policy),
        }
    }

    pub fn linker(&self) -> &LayerLinker<S> {
        &self.linker
    }

    pub fn sink(&self) -> &S {
        self.linker.sink()
    }

    /// Shared threshold handle; changes apply from the next relink.
    pub fn thresholds(&self) -> RenderThresholds {
        self.linker.policy().thresholds().clone()
    }

    // -------------------------------------------------------------------------
    // Coordinate Systems
    // -------------------------------------------------------------------------

    /// Systems declared by loaded objects, in first-declaration order.
    pub fn list_systems(&self) -> Vec<CoordinateSystem> {
        self.linker.graph().list_all_systems()
    }

    pub fn current_system(&self) -> Option<&CoordinateSystem> {
        self.linker.active_system()
    }

    /// Make `system` the active coordinate system.
    ///
    /// # Errors
    ///
    /// `UnknownCoordinateSystem` if no loaded object declares `system`; the
    /// current system and all layers are left as they were.
    pub fn switch_to(&mut self, system: &str) -> Result<LinkReport, ControllerError> {
        let system = self
            .list_systems()
            .into_iter()
            .find(|s| s.name() == system)
            .ok_or_else(|| ControllerError::UnknownCoordinateSystem(system.to_string()))?;

        Ok(self.linker.activate_coordinate_system(&system))
    }

    /// Elements with a transform path into `system`, in registry order.
    pub fn elements_in_system(&self, system: &str) -> Result<Vec<ElementKey>, ControllerError> {
        if !self.linker.graph().contains_system(system) {
            return Err(ControllerError::UnknownCoordinateSystem(system.to_string()));
        }
        Ok(self.linker.elements_in_system(&CoordinateSystem::new(system)))
    }

    // -------------------------------------------------------------------------
    // Objects
    // -------------------------------------------------------------------------

    /// Load a SpatialData object and relink the current system.
    ///
    /// Loading an id that is already loaded replaces the previous object;
    /// remembered visibility of elements that come back is kept.
    pub fn load_object(&mut self, object: SpatialDataObject) -> LinkReport {
        let declared_systems = object.coordinate_systems();
        let SpatialDataObject {
            id,
            elements,
            table,
            transforms,
            alignments,
        } = object;

        if self.linker.registry().has_object(&id) {
            debug!(object = %id, "Reloading object");
            if let Err(e) = self.linker.remove_object(&id) {
                warn!(object = %id, error = %e, "Failed to unload previous object");
            }
        }

        self.linker.register_object(&id, table);

        let graph = self.linker.graph_mut();
        for declared in transforms {
            if !elements.iter().any(|e| e.name == declared.element) {
                warn!(
                    object = %id,
                    element = %declared.element,
                    system = %declared.system,
                    "Skipping transform of unknown element"
                );
                continue;
            }
            let key = ElementKey::new(id.clone(), declared.element.as_str());
            graph.declare_transform(&key, &declared.system, declared.transform);
        }
        for alignment in alignments {
            graph.declare_alignment(&id, &alignment.from, &alignment.to, alignment.transform);
        }

        let element_count = elements.len();
        let mut report = self.linker.add_elements(&id, elements);
        if self.current_lost() {
            warn!(object = %id, "Current coordinate system no longer declared, deactivating");
            let issues = std::mem::take(&mut report.issues);
            report = self.linker.deactivate();
            report.issues.extend(issues);
        }

        info!(
            object = %id,
            elements = element_count,
            declared = declared_systems.len(),
            systems = self.list_systems().len(),
            issues = report.issues.len(),
            "Loaded object"
        );
        report
    }

    /// Unload an object, removing its layers and declarations.
    ///
    /// If the current system is no longer declared by any object, the
    /// controller falls back to no active system and hides every layer.
    pub fn unload_object(&mut self, object: &ObjectId) -> Result<LinkReport, ControllerError> {
        self.linker
            .remove_object(object)
            .map_err(|_| ControllerError::UnknownObject(object.clone()))?;

        let report = if self.current_lost() {
            warn!(object = %object, "Current coordinate system no longer declared, deactivating");
            self.linker.deactivate()
        } else {
            self.linker.relink()
        };

        info!(object = %object, systems = self.list_systems().len(), "Unloaded object");
        Ok(report)
    }

    /// Add one element to a loaded object, displayed in `system`.
    ///
    /// Declares the transform, registers the element and links it as one
    /// step. If no system is active yet, `system` becomes the active one.
    ///
    /// # Errors
    ///
    /// - `UnknownObject` if `object` is not loaded
    /// - `RolledBack` if the element has no layer representation or the
    ///   transform is degenerate; registry and graph are left unchanged
    pub fn add_single_element(
        &mut self,
        object: &ObjectId,
        element: Element,
        transform: Transform,
        system: impl Into<CoordinateSystem>,
    ) -> Result<LinkReport, ControllerError> {
        let system = system.into();
        if !self.linker.registry().has_object(object) {
            return Err(ControllerError::UnknownObject(object.clone()));
        }

        self.linker
            .policy()
            .decide(&element)
            .map_err(LinkError::from)?;

        let key = ElementKey::new(object.clone(), element.name.as_str());
        let graph = self.linker.graph_mut();
        let previous = graph.declare_transform(&key, &system, transform);
        if let Err(err) = graph.get_transform(&key, &system) {
            match previous {
                Some(previous) => {
                    graph.declare_transform(&key, &system, previous);
                }
                None => {
                    graph.retract_transform(&key, &system);
                }
            }
            warn!(element = %key, system = %system, error = %err, "Rolled back element");
            return Err(LinkError::from(err).into());
        }

        let report = if self.linker.active_system().is_none() {
            let registered = self.linker.add_elements(object, vec![element]);
            let mut report = self.linker.activate_coordinate_system(&system);
            report.issues.extend(registered.issues);
            report
        } else {
            self.linker.add_element(object, element)
        };

        info!(element = %key, system = %system, "Added element");
        Ok(report)
    }

    /// Replace an object's annotation table and relink its elements.
    pub fn update_table(
        &mut self,
        object: &ObjectId,
        table: Option<AnnotationTable>,
    ) -> Result<LinkReport, ControllerError> {
        self.linker
            .update_table(object, table)
            .map_err(|err| match err {
                RegistryError::UnknownObject(id) => ControllerError::UnknownObject(id),
                other => ControllerError::RolledBack(other.into()),
            })
    }

    /// Whether the active system stopped being declared by any object.
    fn current_lost(&self) -> bool {
        self.linker
            .active_system()
            .is_some_and(|s| !self.linker.graph().contains_system(s.name()))
    }

    // -------------------------------------------------------------------------
    // Layers
    // -------------------------------------------------------------------------

    /// Set the remembered visibility of an element's layer.
    pub fn set_visibility(&mut self, key: &ElementKey, visible: bool) -> Result<(), ControllerError> {
        self.linker
            .set_visibility(key, visible)
            .map_err(|_| ControllerError::UnknownElement(key.clone()))
    }

    /// Relink the current system, picking up threshold and view changes.
    pub fn refresh(&mut self) -> LinkReport {
        self.linker.relink()
    }

    /// Set the view-scale hint used for pyramid level choice.
    pub fn set_view_downsample(&mut self, downsample: Option<f64>) {
        self.linker.policy_mut().set_view_downsample(downsample);
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&LayerRecord> {
        self.linker.layer_by_name(name)
    }

    pub fn record(&self, key: &ElementKey) -> Option<&LayerRecord> {
        self.linker.record(key)
    }

    pub fn records(&self) -> impl Iterator<Item = &LayerRecord> {
        self.linker.records()
    }

    pub fn summaries(&self) -> Vec<LayerSummary> {
        self.linker.summaries()
    }
}
