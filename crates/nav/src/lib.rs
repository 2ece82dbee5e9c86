//! Navigation: A* pathfinding over the cube graph.
//!
//! # Invariants
//! - Paths only cross sides a flying body can pass.
//! - A path ends at the requested destination position.

mod astar;
mod heap;

pub use astar::CubePos;
pub use heap::IndexedHeap;

pub fn crate_info() -> &'static str {
    "cubeworld-nav v0.1.0"
}
