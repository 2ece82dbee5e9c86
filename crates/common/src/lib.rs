//! Shared handles and the geometric kernel for the cubeworld engine.
//!
//! # Invariants
//! - Geometry here is pure math: no game state, no allocation.
//! - Handles are plain indices into tables owned by the kernel's `World`.

pub mod geometry;
pub mod types;

pub use geometry::{Bounce, LineSegment, Plane, Triangle, sweep_sphere};
pub use types::{BodyId, CubeId, SideId, TextureId, TriggerId, WallId};
