//! World Kernel: the cube-cell graph, walls and doors, triggers, moving bodies
//! and the per-tick movement integrator.
//!
//! # Invariants
//! - Both sides of a shared doorway report the same passability.
//! - Every live body is listed in exactly one cube, at the slot it records.
//! - All state mutations flow through explicit operations and are logged.
//! - A step is deterministic for a given seed, level and frame time.

pub mod body;
pub mod collide;
pub mod config;
pub mod cube;
pub mod doors;
pub mod error;
pub mod event;
pub mod level;
mod movement;
pub mod physics;
pub mod surface;
pub mod trigger;
pub mod wall;
pub mod world;

pub use body::{Body, BodyType, Mover, PhysicsFlags, PhysicsInfo, PowerupKind, Role};
pub use collide::{CollisionHandler, CollisionTable, Dispatch};
pub use config::SimConfig;
pub use cube::{Cube, DoorwayFlags, Neighbor, Side};
pub use doors::{CloakingWall, ExplodingWall};
pub use error::{LevelError, SimError};
pub use event::{SoundEvent, WorldEvent};
pub use level::{BodySpawn, CubeData, LevelData, TriggerData, WallData};
pub use surface::{SideSurface, SurfaceLookup, TextureTable};
pub use trigger::{Trigger, TriggerFlags, TriggerType};
pub use wall::{DoorClip, DoorState, KeyFlags, Wall, WallFlags, WallType};
pub use world::World;

/// Crate version, reported by tooling.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
