//! Per-element layer records.

use serde::Serialize;

use crate::error::LinkError;
use crate::model::{CoordinateSystem, ElementKey, ElementKind};
use crate::policy::RenderDecision;
use crate::transform::Transform;

use super::sink::{LayerHandle, LayerSpec};

/// Link state of one registered element.
///
/// Remembered visibility (`remembered_visible`) is what the user asked for;
/// `displayed` is whether the element can be shown in the active system. The
/// layer is visible when both hold. Forced hiding never touches the
/// remembered flag.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    pub key: ElementKey,
    pub kind: ElementKind,
    pub layer_name: String,

    /// Renderer handle, created the first time the element is displayable
    pub handle: Option<LayerHandle>,

    pub remembered_visible: bool,
    pub displayed: bool,

    /// Transform into the active system, when displayed
    pub transform: Option<Transform>,

    /// Render decision, when displayed
    pub decision: Option<RenderDecision>,

    /// Why the element is not displayed in the active system
    pub hidden_reason: Option<LinkError>,

    /// Last spec sent to the sink
    pub(crate) applied: Option<LayerSpec>,
}

impl LayerRecord {
    pub(crate) fn new(
        key: ElementKey,
        kind: ElementKind,
        layer_name: String,
        remembered_visible: bool,
    ) -> Self {
        Self {
            key,
            kind,
            layer_name,
            handle: None,
            remembered_visible,
            displayed: false,
            transform: None,
            decision: None,
            hidden_reason: None,
            applied: None,
        }
    }

    /// Whether the layer is currently shown.
    pub fn visible(&self) -> bool {
        self.displayed && self.remembered_visible
    }

    /// Last spec sent to the renderer.
    pub fn applied_spec(&self) -> Option<&LayerSpec> {
        self.applied.as_ref()
    }

    pub fn summary(&self, system: Option<&CoordinateSystem>) -> LayerSummary {
        LayerSummary {
            element: self.key.to_string(),
            layer: self.layer_name.clone(),
            kind: self.kind,
            system: system.map(|s| s.to_string()),
            displayed: self.displayed,
            visible: self.visible(),
            level: self.decision.as_ref().and_then(|d| d.level),
            subsampled: self.decision.as_ref().is_some_and(|d| d.subsample),
            matrix: self.transform.map(|t| t.to_matrix()),
            reason: self.hidden_reason.as_ref().map(|e| e.to_string()),
        }
    }
}

/// Flat, serializable view of a record for reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub element: String,
    pub layer: String,
    pub kind: ElementKind,
    pub system: Option<String>,
    pub displayed: bool,
    pub visible: bool,
    pub level: Option<usize>,
    pub subsampled: bool,
    pub matrix: Option<[[f64; 3]; 3]>,
    pub reason: Option<String>,
}
