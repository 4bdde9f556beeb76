//! Coordinate-system orchestration.
//!
//! - [`CoordinateSystemController`]: lists systems, switches between them and
//!   loads/unloads objects
//! - [`SharedController`]: an `Arc`-shared handle queuing actions from
//!   concurrent tasks

mod coordinate_system;
mod shared;

pub use coordinate_system::CoordinateSystemController;
pub use shared::SharedController;
