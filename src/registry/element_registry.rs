//! Element registry for cataloguing loaded elements across objects.
//!
//! The registry provides:
//! - Insertion-ordered storage so layer order never jitters between switches
//! - Per-object grouping and teardown
//! - Annotation resolution against the owning object's table
//! - Layer names that stay unique when several objects share element names

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::model::{AnnotationTable, Element, ElementAnnotation, ElementKey, ObjectId};

// =============================================================================
// Registered Element
// =============================================================================

/// A catalogued element with its resolved annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredElement {
    pub key: ElementKey,
    pub element: Arc<Element>,

    /// Table rows annotating this element, if its object has a matching table
    pub annotation: Option<Arc<ElementAnnotation>>,
}

/// Outcome of [`ElementRegistry::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub key: ElementKey,

    /// Annotation problem; the element is registered without annotation
    pub annotation_issue: Option<RegistryError>,
}

#[derive(Debug, Default)]
struct ObjectEntry {
    table: Option<Arc<AnnotationTable>>,
}

// =============================================================================
// ElementRegistry
// =============================================================================

/// Catalog of loaded elements across SpatialData objects.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    /// Elements in registration order
    entries: IndexMap<ElementKey, RegisteredElement>,

    /// Objects in load order
    objects: IndexMap<ObjectId, ObjectEntry>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Objects
    // -------------------------------------------------------------------------

    /// Register an object and its annotation table.
    ///
    /// Re-registering a known object replaces its table but keeps its
    /// position in load order.
    pub fn register_object(&mut self, object: &ObjectId, table: Option<AnnotationTable>) {
        let entry = self.objects.entry(object.clone()).or_default();
        entry.table = table.map(Arc::new);
    }

    pub fn has_object(&self, object: &ObjectId) -> bool {
        self.objects.contains_key(object)
    }

    /// Position of the object in load order.
    fn object_index(&self, object: &ObjectId) -> Option<usize> {
        self.objects.get_index_of(object)
    }

    pub fn table(&self, object: &ObjectId) -> Option<&AnnotationTable> {
        self.objects.get(object)?.table.as_deref()
    }

    // -------------------------------------------------------------------------
    // Elements
    // -------------------------------------------------------------------------

    /// Register an element of `object`.
    ///
    /// Unknown objects are registered on the fly without a table. Registering
    /// an identifier that already exists replaces the entry in place.
    ///
    /// An element covered by the object's table gets its rows attached. If
    /// instance ids are not unique among those rows, the annotation is
    /// dropped and the problem is returned in `annotation_issue`.
    pub fn register(&mut self, object: &ObjectId, element: Element) -> Registration {
        let key = ElementKey::new(object.clone(), element.name.as_str());
        let table = self
            .objects
            .entry(object.clone())
            .or_default()
            .table
            .clone();

        let (annotation, annotation_issue) = resolve_annotation(table.as_deref(), &key);

        let registered = RegisteredElement {
            key: key.clone(),
            element: Arc::new(element),
            annotation,
        };
        let replaced = self.entries.insert(key.clone(), registered);

        debug!(
            element = %key,
            kind = %self.entries[&key].element.kind(),
            replaced = replaced.is_some(),
            "Registered element"
        );

        Registration {
            key,
            annotation_issue,
        }
    }

    /// Remove an object and all of its elements.
    ///
    /// Returns the removed keys in registration order, for the layer linker
    /// to drop the matching records.
    pub fn unregister(&mut self, object: &ObjectId) -> Result<Vec<ElementKey>, RegistryError> {
        if self.objects.shift_remove(object).is_none() {
            return Err(RegistryError::UnknownObject(object.clone()));
        }

        let removed: Vec<ElementKey> = self
            .entries
            .keys()
            .filter(|key| &key.object == object)
            .cloned()
            .collect();
        self.entries.retain(|key, _| &key.object != object);

        debug!(object = %object, removed = removed.len(), "Unregistered object");
        Ok(removed)
    }

    /// Replace an object's table and re-resolve the annotations of its elements.
    ///
    /// Returns the annotation problems found; affected elements stay
    /// registered without annotation.
    pub fn set_table(
        &mut self,
        object: &ObjectId,
        table: Option<AnnotationTable>,
    ) -> Result<Vec<RegistryError>, RegistryError> {
        let entry = self
            .objects
            .get_mut(object)
            .ok_or_else(|| RegistryError::UnknownObject(object.clone()))?;
        entry.table = table.map(Arc::new);
        let table = entry.table.clone();

        let mut issues = Vec::new();
        for registered in self.entries.values_mut() {
            if &registered.key.object != object {
                continue;
            }
            let (annotation, issue) = resolve_annotation(table.as_deref(), &registered.key);
            registered.annotation = annotation;
            issues.extend(issue);
        }
        Ok(issues)
    }

    pub fn get(&self, key: &ElementKey) -> Option<&RegisteredElement> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &ElementKey) -> bool {
        self.entries.contains_key(key)
    }

    /// All elements in registration order.
    pub fn all_elements(&self) -> impl Iterator<Item = &RegisteredElement> {
        self.entries.values()
    }

    /// Elements of one object in registration order.
    pub fn elements_for_object(&self, object: &ObjectId) -> Vec<&RegisteredElement> {
        self.entries
            .values()
            .filter(|e| &e.key.object == object)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the layer showing `key`.
    ///
    /// The element name, suffixed with `_<object index>` when another loaded
    /// object has an element of the same name. A suffixed name that clashes
    /// with an existing name gets the suffix again until it is unique.
    pub fn layer_name(&self, key: &ElementKey) -> String {
        self.assign_layer_names()
            .into_iter()
            .find(|(assigned, _)| assigned == key)
            .map(|(_, name)| name)
            .unwrap_or_else(|| key.name.to_string())
    }

    /// Layer names of all elements, in registration order.
    ///
    /// Plain element names are reserved first, then suffixed names are
    /// handed out in registration order.
    fn assign_layer_names(&self) -> Vec<(ElementKey, String)> {
        let mut used: HashSet<String> = self.entries.keys().map(|k| k.name.to_string()).collect();
        let mut names = Vec::new();

        for key in self.entries.keys() {
            let shared = self
                .entries
                .keys()
                .any(|other| other.name == key.name && other.object != key.object);
            let name = match (shared, self.object_index(&key.object)) {
                (true, Some(index)) => {
                    let suffix = format!("_{}", index);
                    let mut candidate = format!("{}{}", key.name, suffix);
                    while used.contains(&candidate) {
                        candidate.push_str(&suffix);
                    }
                    used.insert(candidate.clone());
                    candidate
                }
                _ => key.name.to_string(),
            };
            names.push((key.clone(), name));
        }
        names
    }
}

fn resolve_annotation(
    table: Option<&AnnotationTable>,
    key: &ElementKey,
) -> (Option<Arc<ElementAnnotation>>, Option<RegistryError>) {
    let Some(table) = table else {
        return (None, None);
    };
    match table.annotation_for(key) {
        Ok(annotation) => (annotation.map(Arc::new), None),
        Err(err) => {
            warn!(element = %key, error = %err, "Dropping annotation");
            (None, Some(err))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
