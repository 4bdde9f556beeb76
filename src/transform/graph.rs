//! Transform graph for resolving element transforms across coordinate systems.
//!
//! The graph has two kinds of directed edges:
//! - element -> system, declared per element (`declare_transform`)
//! - system -> system alignments, declared per object (`declare_alignment`)
//!
//! Resolving an element into a target system prefers a direct edge and
//! otherwise follows the shortest alignment chain (breadth-first, ties
//! broken by declaration order). Paths through a singular hop are only used
//! to report `DegenerateTransform` when no invertible path exists. The composed transform is the matrix
//! product along the chain. Composed results are kept in an LRU cache that
//! is cleared on every declaration or removal.
//!
//! # Conflicting declarations
//!
//! Element transforms are keyed by `(object, element)`, so two objects never
//! clash on them; re-declaring a pair overwrites it. Alignments for the same
//! `(from, to)` pair may come from several objects: the most recent
//! declaration wins, and removing its object re-exposes the previous one.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;

use indexmap::IndexMap;
use lru::LruCache;
use tracing::debug;

use crate::error::TransformError;
use crate::model::{CoordinateSystem, ElementKey, ObjectId};

use super::affine::Transform;

/// Default number of composed `(element, system)` lookups kept in cache.
pub const DEFAULT_COMPOSED_CACHE_CAPACITY: usize = 4096;

// =============================================================================
// Internal Types
// =============================================================================

type CacheKey = (ElementKey, CoordinateSystem);

/// One object's declaration of an alignment.
#[derive(Debug, Clone)]
struct AlignmentDecl {
    object: ObjectId,
    transform: Transform,
}

/// First non-invertible hop met along a path.
#[derive(Debug, Clone)]
struct DegenerateHop {
    from: String,
    to: String,
    determinant: f64,
}

/// BFS frontier entry.
#[derive(Debug, Clone)]
struct PathState {
    system: CoordinateSystem,
    transform: Transform,
    degenerate: Option<DegenerateHop>,
}

impl PathState {
    fn step(&self, to: &CoordinateSystem, hop: &Transform) -> PathState {
        let degenerate = self.degenerate.clone().or_else(|| {
            (!hop.is_invertible()).then(|| DegenerateHop {
                from: self.system.to_string(),
                to: to.to_string(),
                determinant: hop.determinant(),
            })
        });
        PathState {
            system: to.clone(),
            transform: self.transform.then(hop),
            degenerate,
        }
    }
}

// =============================================================================
// TransformGraph
// =============================================================================

/// Store of element memberships and transforms across all loaded objects.
pub struct TransformGraph {
    /// Direct transforms per element, in declaration order
    element_edges: HashMap<ElementKey, IndexMap<CoordinateSystem, Transform>>,

    /// Alignment declarations per `(from, to)`, oldest first
    alignments: IndexMap<(CoordinateSystem, CoordinateSystem), Vec<AlignmentDecl>>,

    /// Known systems in first-declaration order, with per-object declaration counts
    systems: IndexMap<CoordinateSystem, HashMap<ObjectId, usize>>,

    /// Composed lookups
    cache: RefCell<LruCache<CacheKey, Result<Transform, TransformError>>>,
}

impl Default for TransformGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformGraph {
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_COMPOSED_CACHE_CAPACITY)
    }

    /// Create a graph whose composed-lookup cache holds `capacity` entries.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            element_edges: HashMap::new(),
            alignments: IndexMap::new(),
            systems: IndexMap::new(),
            cache: RefCell::new(LruCache::new(capacity)),
        }
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    /// Declare the transform of `element` into `system`.
    ///
    /// Returns the transform previously declared for the pair, if any.
    pub fn declare_transform(
        &mut self,
        element: &ElementKey,
        system: &CoordinateSystem,
        transform: Transform,
    ) -> Option<Transform> {
        let previous = self
            .element_edges
            .entry(element.clone())
            .or_default()
            .insert(system.clone(), transform);

        if previous.is_none() {
            self.count_declaration(system, &element.object);
        }
        self.invalidate();

        debug!(
            element = %element,
            system = %system,
            replaced = previous.is_some(),
            "Declared element transform"
        );
        previous
    }

    /// Remove the transform of `element` into `system`.
    pub fn retract_transform(
        &mut self,
        element: &ElementKey,
        system: &CoordinateSystem,
    ) -> Option<Transform> {
        let edges = self.element_edges.get_mut(element)?;
        let removed = edges.shift_remove(system)?;
        if edges.is_empty() {
            self.element_edges.remove(element);
        }
        self.uncount_declaration(system, &element.object);
        self.invalidate();
        Some(removed)
    }

    /// Declare a system-to-system alignment on behalf of `object`.
    ///
    /// A later declaration for the same pair takes precedence over earlier
    /// ones, whichever object made them.
    pub fn declare_alignment(
        &mut self,
        object: &ObjectId,
        from: &CoordinateSystem,
        to: &CoordinateSystem,
        transform: Transform,
    ) {
        let decls = self
            .alignments
            .entry((from.clone(), to.clone()))
            .or_default();

        let existing = decls.iter().position(|d| &d.object == object);
        if let Some(index) = existing {
            decls.remove(index);
        }
        decls.push(AlignmentDecl {
            object: object.clone(),
            transform,
        });

        if existing.is_none() {
            self.count_declaration(from, object);
            self.count_declaration(to, object);
        }
        self.invalidate();

        debug!(object = %object, from = %from, to = %to, "Declared alignment");
    }

    /// Remove every declaration made by `object`.
    pub fn remove_object(&mut self, object: &ObjectId) {
        let elements: Vec<ElementKey> = self
            .element_edges
            .keys()
            .filter(|key| &key.object == object)
            .cloned()
            .collect();
        for key in elements {
            self.remove_element(&key);
        }

        let mut emptied = Vec::new();
        let mut uncounted = Vec::new();
        for ((from, to), decls) in self.alignments.iter_mut() {
            let before = decls.len();
            decls.retain(|d| &d.object != object);
            if decls.len() != before {
                uncounted.push(from.clone());
                uncounted.push(to.clone());
            }
            if decls.is_empty() {
                emptied.push((from.clone(), to.clone()));
            }
        }
        for pair in emptied {
            self.alignments.shift_remove(&pair);
        }
        for system in uncounted {
            self.uncount_declaration(&system, object);
        }

        self.invalidate();
        debug!(object = %object, "Removed object declarations");
    }

    /// Remove all direct transforms of one element.
    fn remove_element(&mut self, element: &ElementKey) {
        if let Some(edges) = self.element_edges.remove(element) {
            for system in edges.keys() {
                self.uncount_declaration(system, &element.object);
            }
            self.invalidate();
        }
    }

    fn count_declaration(&mut self, system: &CoordinateSystem, object: &ObjectId) {
        *self
            .systems
            .entry(system.clone())
            .or_default()
            .entry(object.clone())
            .or_default() += 1;
    }

    fn uncount_declaration(&mut self, system: &CoordinateSystem, object: &ObjectId) {
        let Some(declarers) = self.systems.get_mut(system) else {
            return;
        };
        if let Some(count) = declarers.get_mut(object) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                declarers.remove(object);
            }
        }
        if declarers.is_empty() {
            self.systems.shift_remove(system);
        }
    }

    fn invalidate(&self) {
        self.cache.borrow_mut().clear();
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Resolve the transform of `element` into `target`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if neither a direct transform nor an alignment chain
    ///   reaches `target`
    /// - `DegenerateTransform` if every path reaching `target` has a
    ///   singular hop
    pub fn get_transform(
        &self,
        element: &ElementKey,
        target: &CoordinateSystem,
    ) -> Result<Transform, TransformError> {
        let key = (element.clone(), target.clone());
        if let Some(cached) = self.cache.borrow_mut().get(&key) {
            return cached.clone();
        }

        let resolved = self.resolve(element, target);
        self.cache.borrow_mut().put(key, resolved.clone());
        resolved
    }

    fn resolve(
        &self,
        element: &ElementKey,
        target: &CoordinateSystem,
    ) -> Result<Transform, TransformError> {
        let not_found = || TransformError::NotFound {
            element: element.clone(),
            system: target.clone(),
        };

        let edges = self.element_edges.get(element).ok_or_else(not_found)?;
        let origin = PathState {
            system: CoordinateSystem::new(element.to_string()),
            transform: Transform::IDENTITY,
            degenerate: None,
        };

        if let Some(state) = self.shortest_path(&origin, edges, target, true) {
            return Ok(state.transform);
        }

        // No invertible path: report the singular hop of the path that would
        // have been taken.
        let state = self
            .shortest_path(&origin, edges, target, false)
            .ok_or_else(not_found)?;
        match state.degenerate {
            Some(hop) => Err(TransformError::DegenerateTransform {
                element: element.clone(),
                system: target.clone(),
                from: hop.from,
                to: hop.to,
                determinant: hop.determinant,
            }),
            None => Ok(state.transform),
        }
    }

    /// Breadth-first search from an element's direct edges to `target`.
    ///
    /// With `invertible_only`, paths are never extended through a singular
    /// hop.
    fn shortest_path(
        &self,
        origin: &PathState,
        edges: &IndexMap<CoordinateSystem, Transform>,
        target: &CoordinateSystem,
        invertible_only: bool,
    ) -> Option<PathState> {
        let admissible = |state: &PathState| !invertible_only || state.degenerate.is_none();

        if let Some(direct) = edges
            .get(target)
            .map(|t| origin.step(target, t))
            .filter(|state| admissible(state))
        {
            return Some(direct);
        }

        let mut visited: HashSet<&CoordinateSystem> = HashSet::new();
        let mut queue: VecDeque<PathState> = VecDeque::new();
        for (system, t) in edges {
            let state = origin.step(system, t);
            if admissible(&state) && visited.insert(system) {
                queue.push_back(state);
            }
        }

        while let Some(state) = queue.pop_front() {
            for ((from, to), decls) in &self.alignments {
                if from != &state.system || visited.contains(to) {
                    continue;
                }
                let Some(active) = decls.last() else {
                    continue;
                };
                let next = state.step(to, &active.transform);
                if !admissible(&next) {
                    continue;
                }
                if to == target {
                    return Some(next);
                }
                visited.insert(to);
                queue.push_back(next);
            }
        }
        None
    }

    /// Systems `element` has a direct transform into, in declaration order.
    pub fn list_systems_for(&self, element: &ElementKey) -> Vec<CoordinateSystem> {
        self.element_edges
            .get(element)
            .map(|edges| edges.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Union of systems declared by all objects, in first-declaration order.
    pub fn list_all_systems(&self) -> Vec<CoordinateSystem> {
        self.systems.keys().cloned().collect()
    }

    pub fn contains_system(&self, name: &str) -> bool {
        self.systems.contains_key(name)
    }
}

// =============================================================================
// Tests
// =============================================================================
