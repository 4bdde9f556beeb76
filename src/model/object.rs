//! SpatialData objects as handed over by the storage collaborator.

use serde::{Deserialize, Serialize};

use crate::model::{AnnotationTable, CoordinateSystem, Element, ObjectId};
use crate::transform::Transform;

/// Transform of one element into one coordinate system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTransform {
    pub element: String,
    pub system: CoordinateSystem,
    pub transform: Transform,
}

/// System-to-system alignment, e.g. `"global" -> "aligned"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemAlignment {
    pub from: CoordinateSystem,
    pub to: CoordinateSystem,
    pub transform: Transform,
}

/// A fully parsed SpatialData object.
///
/// Owns its elements, its optional annotation table and its transform set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialDataObject {
    pub id: ObjectId,

    #[serde(default)]
    pub elements: Vec<Element>,

    #[serde(default)]
    pub table: Option<AnnotationTable>,

    #[serde(default)]
    pub transforms: Vec<ElementTransform>,

    #[serde(default)]
    pub alignments: Vec<SystemAlignment>,
}

impl SpatialDataObject {
    pub fn new(id: impl Into<ObjectId>) -> Self {
        Self {
            id: id.into(),
            elements: Vec::new(),
            table: None,
            transforms: Vec::new(),
            alignments: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_transform(
        mut self,
        element: impl Into<String>,
        system: impl Into<CoordinateSystem>,
        transform: Transform,
    ) -> Self {
        self.transforms.push(ElementTransform {
            element: element.into(),
            system: system.into(),
            transform,
        });
        self
    }

    pub fn with_alignment(
        mut self,
        from: impl Into<CoordinateSystem>,
        to: impl Into<CoordinateSystem>,
        transform: Transform,
    ) -> Self {
        self.alignments.push(SystemAlignment {
            from: from.into(),
            to: to.into(),
            transform,
        });
        self
    }

    pub fn with_table(mut self, table: AnnotationTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Coordinate systems this object declares, in declaration order.
    pub fn coordinate_systems(&self) -> Vec<CoordinateSystem> {
        let mut systems: Vec<CoordinateSystem> = Vec::new();
        let declared = self
            .transforms
            .iter()
            .map(|t| &t.system)
            .chain(self.alignments.iter().flat_map(|a| [&a.from, &a.to]));
        for system in declared {
            if !systems.contains(system) {
                systems.push(system.clone());
            }
        }
        systems
    }
}
