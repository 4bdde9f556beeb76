//! Coordinate-system transforms.
//!
//! - [`Transform`]: 2-D affine map with composition and invertibility checks
//! - [`TransformGraph`]: per-element memberships, system alignments and
//!   cached path composition
//!
//! ```text
//!   cells ──(scale)──▶ global ──(alignment)──▶ aligned
//!                        │
//!   image ──(affine)─────┘
//! ```

mod affine;
mod graph;

pub use affine::{Transform, TransformSpec, DEGENERATE_EPSILON};
pub use graph::{TransformGraph, DEFAULT_COMPOSED_CACHE_CAPACITY};
