//! Layer linker keeping one rendered layer per registered element.
//!
//! The linker owns the transform graph, the element registry and the render
//! policy, and keeps a [`LayerRecord`] for every registered element. A relink
//! pass walks the registry in insertion order and, for each element:
//!
//! 1. resolves its transform into the active system
//! 2. asks the render policy for a representation
//! 3. creates or updates the renderer layer, restoring remembered visibility
//!
//! Elements without a usable transform are hidden; their remembered
//! visibility is left alone. Failures are collected per element into a
//! [`LinkReport`] and never abort the pass.
//!
//! The sink is only called when the spec sent for a layer actually changes,
//! so activating the same system twice is free on the renderer side.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::error::{LinkError, RegistryError, TransformError};
use crate::model::{AnnotationTable, CoordinateSystem, Element, ElementKey, ObjectId};
use crate::policy::{RenderDecision, RenderPolicy};
use crate::registry::{ElementRegistry, RegisteredElement};
use crate::transform::{Transform, TransformGraph};

use super::record::{LayerRecord, LayerSummary};
use super::sink::{LayerSink, LayerSpec};

// =============================================================================
// Link Report
// =============================================================================

/// A per-element problem surfaced by a link pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementIssue {
    pub key: ElementKey,
    pub error: LinkError,
}

/// Outcome of a link pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkReport {
    /// System the pass linked into
    pub system: Option<CoordinateSystem>,

    /// Elements displayable in `system`, in registry order
    pub displayed: Vec<ElementKey>,

    /// Elements forced hidden, in registry order
    pub hidden: Vec<ElementKey>,

    /// Surfaced problems; elements merely absent from `system` are not listed
    pub issues: Vec<ElementIssue>,
}

impl LinkReport {
    fn new(system: Option<CoordinateSystem>) -> Self {
        Self {
            system,
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn push_issue(&mut self, key: &ElementKey, error: LinkError) {
        self.issues.push(ElementIssue {
            key: key.clone(),
            error,
        });
    }
}

fn is_surfaced(error: &LinkError) -> bool {
    !matches!(error, LinkError::Transform(TransformError::NotFound { .. }))
}

fn registry_issue(error: RegistryError) -> Option<ElementIssue> {
    let key = match &error {
        RegistryError::AnnotationMismatch { element, .. } => element.clone(),
        RegistryError::UnknownObject(_) => return None,
    };
    Some(ElementIssue {
        key,
        error: error.into(),
    })
}

// =============================================================================
// LayerLinker
// =============================================================================

/// Maps registered elements to renderer layers.
pub struct LayerLinker<S: LayerSink> {
    graph: TransformGraph,
    registry: ElementRegistry,
    policy: RenderPolicy,
    sink: S,

    /// One record per registered element, in registry order
    records: IndexMap<ElementKey, LayerRecord>,

    /// Elements the user hid, kept for the whole session so a reloaded
    /// element comes back hidden. Visible is the default and is not stored,
    /// so the set only holds user-hidden identifiers.
    hidden_by_user: HashSet<ElementKey>,

    active: Option<CoordinateSystem>,
}

impl<S: LayerSink> LayerLinker<S> {
    pub fn new(sink: S, policy: RenderPolicy) -> Self {
        Self {
            graph: TransformGraph::new(),
            registry: ElementRegistry::new(),
            policy,
            sink,
            records: IndexMap::new(),
            hidden_by_user: HashSet::new(),
            active: None,
        }
    }

    pub fn graph(&self) -> &TransformGraph {
        &self.graph
    }

    /// Mutable access to the graph. Changes show up on the next relink.
    pub fn graph_mut(&mut self) -> &mut TransformGraph {
        &mut self.graph
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &RenderPolicy {
        &self.policy
    }

    /// Mutable access to the policy. Changes show up on the next relink.
    pub fn policy_mut(&mut self) -> &mut RenderPolicy {
        &mut self.policy
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn active_system(&self) -> Option<&CoordinateSystem> {
        self.active.as_ref()
    }

    // -------------------------------------------------------------------------
    // Activation
    // -------------------------------------------------------------------------

    /// Link every registered element into `system`.
    pub fn activate_coordinate_system(&mut self, system: &CoordinateSystem) -> LinkReport {
        self.active = Some(system.clone());
        let report = self.relink();
        info!(
            system = %system,
            displayed = report.displayed.len(),
            hidden = report.hidden.len(),
            issues = report.issues.len(),
            "Activated coordinate system"
        );
        report
    }

    /// Drop the active system and hide every layer.
    pub fn deactivate(&mut self) -> LinkReport {
        self.active = None;
        self.relink()
    }

    /// Relink every registered element into the active system.
    pub fn relink(&mut self) -> LinkReport {
        let mut report = LinkReport::new(self.active.clone());
        let keys: Vec<ElementKey> = self
            .registry
            .all_elements()
            .map(|e| e.key.clone())
            .collect();
        for key in &keys {
            self.link(key, &mut report);
        }
        report
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Register an object and its annotation table.
    pub fn register_object(&mut self, object: &ObjectId, table: Option<AnnotationTable>) {
        self.registry.register_object(object, table);
    }

    /// Register an element and link it into the active system.
    ///
    /// The layer starts visible unless a remembered state exists for the
    /// same element identifier.
    pub fn add_element(&mut self, object: &ObjectId, element: Element) -> LinkReport {
        let mut report = LinkReport::new(self.active.clone());
        let registration = self.registry.register(object, element);
        if let Some(issue) = registration.annotation_issue.and_then(registry_issue) {
            report.issues.push(issue);
        }

        self.link(&registration.key, &mut report);
        self.relink_renamed();
        report
    }

    /// Register a batch of elements of `object`, then relink everything.
    ///
    /// Used when loading an object whose alignments may affect elements
    /// already loaded.
    pub fn add_elements(&mut self, object: &ObjectId, elements: Vec<Element>) -> LinkReport {
        let mut registration_issues = Vec::new();
        for element in elements {
            let registration = self.registry.register(object, element);
            registration_issues.extend(registration.annotation_issue.and_then(registry_issue));
        }

        let mut report = self.relink();
        for issue in registration_issues {
            report.push_issue(&issue.key, issue.error);
        }
        report
    }

    /// Remove an object's elements, declarations and layers.
    ///
    /// Remaining elements are not relinked; callers relink once they have
    /// settled the active system.
    pub fn remove_object(&mut self, object: &ObjectId) -> Result<Vec<ElementKey>, RegistryError> {
        let removed = self.registry.unregister(object)?;
        self.graph.remove_object(object);

        for key in &removed {
            if let Some(record) = self.records.shift_remove(key) {
                if let Some(handle) = record.handle {
                    self.sink.remove_layer(handle);
                }
            }
        }

        info!(object = %object, removed = removed.len(), "Removed object layers");
        Ok(removed)
    }

    /// Replace an object's table and relink its elements.
    pub fn update_table(
        &mut self,
        object: &ObjectId,
        table: Option<AnnotationTable>,
    ) -> Result<LinkReport, RegistryError> {
        let issues = self.registry.set_table(object, table)?;

        let mut report = LinkReport::new(self.active.clone());
        report.issues.extend(issues.into_iter().filter_map(registry_issue));

        let keys: Vec<ElementKey> = self
            .registry
            .elements_for_object(object)
            .into_iter()
            .map(|e| e.key.clone())
            .collect();
        for key in &keys {
            self.link(key, &mut report);
        }

        debug!(object = %object, elements = keys.len(), "Updated annotation table");
        Ok(report)
    }

    // -------------------------------------------------------------------------
    // Visibility
    // -------------------------------------------------------------------------

    /// Set the remembered visibility of an element.
    ///
    /// The live layer follows only when the element is displayed in the
    /// active system.
    pub fn set_visibility(&mut self, key: &ElementKey, visible: bool) -> Result<(), LinkError> {
        let record = self
            .records
            .get_mut(key)
            .ok_or_else(|| LinkError::UnknownElement(key.clone()))?;

        record.remembered_visible = visible;
        if visible {
            self.hidden_by_user.remove(key);
        } else {
            self.hidden_by_user.insert(key.clone());
        }

        if record.displayed {
            if let (Some(handle), Some(applied)) = (record.handle, record.applied.as_mut()) {
                if applied.visible != visible {
                    applied.visible = visible;
                    self.sink.update_layer(handle, applied);
                }
            }
        }

        debug!(element = %key, visible, displayed = record.displayed, "Set visibility");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn record(&self, key: &ElementKey) -> Option<&LayerRecord> {
        self.records.get(key)
    }

    /// Records in registry order.
    pub fn records(&self) -> impl Iterator<Item = &LayerRecord> {
        self.records.values()
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&LayerRecord> {
        self.records.values().find(|r| r.layer_name == name)
    }

    /// Elements with a transform path into `system`, in registry order.
    pub fn elements_in_system(&self, system: &CoordinateSystem) -> Vec<ElementKey> {
        self.registry
            .all_elements()
            .filter(|e| self.graph.get_transform(&e.key, system).is_ok())
            .map(|e| e.key.clone())
            .collect()
    }

    pub fn summaries(&self) -> Vec<LayerSummary> {
        self.records
            .values()
            .map(|r| r.summary(self.active.as_ref()))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Linking
    // -------------------------------------------------------------------------

    fn resolve(
        &self,
        registered: &RegisteredElement,
    ) -> Result<Option<(Transform, RenderDecision)>, LinkError> {
        let Some(system) = &self.active else {
            return Ok(None);
        };
        let decision = self.policy.decide(&registered.element)?;
        let transform = self.graph.get_transform(&registered.key, system)?;
        Ok(Some((transform, decision)))
    }

    fn link(&mut self, key: &ElementKey, report: &mut LinkReport) {
        let Some(registered) = self.registry.get(key).cloned() else {
            return;
        };
        let layer_name = self.registry.layer_name(key);
        let outcome = self.resolve(&registered);
        let kind = registered.element.kind();

        let remembered = !self.hidden_by_user.contains(key);
        let record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| LayerRecord::new(key.clone(), kind, layer_name.clone(), remembered));
        record.kind = kind;
        record.layer_name = layer_name;

        match outcome {
            Ok(Some((transform, decision))) => {
                let spec = LayerSpec {
                    key: key.clone(),
                    data: registered.element.clone(),
                    name: record.layer_name.clone(),
                    transform,
                    visible: record.remembered_visible,
                    decision: decision.clone(),
                    annotation: registered.annotation.clone(),
                };
                record.displayed = true;
                record.transform = Some(transform);
                record.decision = Some(decision);
                record.hidden_reason = None;
                apply(&mut self.sink, record, spec);

                debug!(element = %key, layer = %record.layer_name, "Linked element");
                report.displayed.push(key.clone());
            }
            Ok(None) => {
                hide(&mut self.sink, record, None);
                report.hidden.push(key.clone());
            }
            Err(error) => {
                if is_surfaced(&error) {
                    warn!(element = %key, error = %error, "Element hidden");
                    report.push_issue(key, error.clone());
                } else {
                    debug!(element = %key, error = %error, "Element hidden");
                }
                hide(&mut self.sink, record, Some(error));
                report.hidden.push(key.clone());
            }
        }
    }

    /// Relink records whose layer name changed after elements came or went.
    fn relink_renamed(&mut self) {
        let renamed: Vec<ElementKey> = self
            .records
            .values()
            .filter(|r| r.layer_name != self.registry.layer_name(&r.key))
            .map(|r| r.key.clone())
            .collect();

        let mut scratch = LinkReport::new(self.active.clone());
        for key in &renamed {
            self.link(key, &mut scratch);
        }
    }
}

/// Send `spec` for a displayable record, creating its layer on first use.
fn apply<S: LayerSink>(sink: &mut S, record: &mut LayerRecord, spec: LayerSpec) {
    match record.handle {
        None => record.handle = Some(sink.create_layer(&spec)),
        Some(handle) => {
            if record.applied.as_ref() != Some(&spec) {
                sink.update_layer(handle, &spec);
            }
        }
    }
    record.applied = Some(spec);
}

/// Force a record hidden without touching its remembered visibility.
fn hide<S: LayerSink>(sink: &mut S, record: &mut LayerRecord, reason: Option<LinkError>) {
    record.displayed = false;
    record.transform = None;
    record.decision = None;
    record.hidden_reason = reason;

    if let (Some(handle), Some(applied)) = (record.handle, record.applied.as_mut()) {
        if applied.visible || applied.name != record.layer_name {
            applied.visible = false;
            applied.name = record.layer_name.clone();
            sink.update_layer(handle, applied);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
