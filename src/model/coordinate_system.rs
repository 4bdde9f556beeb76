//! Identifiers shared by every component.
//!
//! Coordinate systems and objects are identified by interned names: cloning
//! an identifier only bumps a reference count, and two identifiers compare
//! equal when their names do, whichever object declared them.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// =============================================================================
// CoordinateSystem
// =============================================================================

/// A named frame of reference such as `"global"` or `"aligned"`.
///
/// Not owned by any object: several objects may declare transforms into the
/// same system, and they then share it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CoordinateSystem(Arc<str>);

impl CoordinateSystem {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CoordinateSystem {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CoordinateSystem {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<CoordinateSystem> for String {
    fn from(system: CoordinateSystem) -> Self {
        system.0.to_string()
    }
}

impl Borrow<str> for CoordinateSystem {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// ObjectId
// =============================================================================

/// Identifier of a loaded SpatialData object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ObjectId(Arc<str>);

impl ObjectId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0.to_string()
    }
}

// =============================================================================
// ElementKey
// =============================================================================

/// Fully qualified element identity: owning object plus element name.
///
/// Element names are only unique within their object, so the pair is what
/// the registry, the transform graph and the layer records are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementKey {
    pub object: ObjectId,
    pub name: Arc<str>,
}

impl ElementKey {
    pub fn new(object: impl Into<ObjectId>, name: impl Into<Arc<str>>) -> Self {
        Self {
            object: object.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object, self.name)
    }
}
