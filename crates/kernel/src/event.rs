use cubeworld_common::{BodyId, CubeId, SideId, TextureId, TriggerId, WallId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::trigger::TriggerType;
use crate::wall::DoorState;

/// Sounds the audio layer should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEvent {
    DoorOpen,
    DoorClose,
    DoorLocked,
    WallHit,
    WallExplode,
    CloakOn,
    CloakOff,
    PowerupPickup,
    HostageRescue,
}

/// An event record produced by every observable mutation.
///
/// Render, audio and UI layers poll and drain the log once per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// Simulation advanced one tick with the given seed.
    Stepped { tick: u64, seed: u64 },
    WallStateChanged { wall: WallId, state: DoorState },
    WallFrameChanged { wall: WallId, frame: u16 },
    WallBlasted { wall: WallId },
    /// A destructible overlay was replaced.
    TextureSwapped { side: SideId, texture: TextureId },
    ExplosionSpawned { cube: CubeId, position: Vec3, size: f32 },
    Sound { sound: SoundEvent, position: Vec3 },
    TriggerFired { trigger: TriggerId, kind: TriggerType },
    BodySpawned { body: BodyId, cube: CubeId },
    BodyRemoved { body: BodyId },
    BodyChangedCube { body: BodyId, from: CubeId, to: CubeId },
    HostageRescued { hostage: BodyId, player: BodyId },
    PowerupConsumed { powerup: BodyId, player: BodyId },
    ReactorDestroyed { reactor: BodyId },
    LevelExit { secret: bool },
}
