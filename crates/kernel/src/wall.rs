//! Walls: passability and animated state attached to a side.

use bitflags::bitflags;
use cubeworld_common::{SideId, TriggerId, WallId};
use serde::{Deserialize, Serialize};

use crate::error::LevelError;

/// Behaviour class of a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallType {
    Normal,
    Blastable,
    Door,
    Illusion,
    Open,
    Closed,
    Overlay,
    Cloaked,
}

impl TryFrom<u8> for WallType {
    type Error = LevelError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Normal,
            1 => Self::Blastable,
            2 => Self::Door,
            3 => Self::Illusion,
            4 => Self::Open,
            5 => Self::Closed,
            6 => Self::Overlay,
            7 => Self::Cloaked,
            other => return Err(LevelError::UnknownWallType(other)),
        })
    }
}

bitflags! {
    /// Persistent wall state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct WallFlags: u8 {
        const BLASTED = 1;
        /// Set from the half-way frame of an opening door until the half-way frame of closing.
        const DOOR_OPENED = 2;
        const DOOR_LOCKED = 8;
        const DOOR_AUTO = 16;
        const ILLUSION_OFF = 32;
        const SWITCH = 64;
    }
}

bitflags! {
    /// Keys required by a door or held by a player.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct KeyFlags: u8 {
        const BLUE = 2;
        const RED = 4;
        const GOLD = 8;
    }
}

/// Animation state of a door or cloaking wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DoorState {
    #[default]
    Closed,
    Opening,
    Waiting,
    Closing,
    Open,
    Cloaking,
    Decloaking,
}

/// Door/blast animation shared by every wall that references it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoorClip {
    pub frames: u16,
    pub play_time: f32,
    /// Blasting this wall runs an exploding-wall timeline instead of an instant swap.
    #[serde(default)]
    pub explodes: bool,
}

impl Default for DoorClip {
    fn default() -> Self {
        Self {
            frames: 1,
            play_time: 1.0,
            explodes: false,
        }
    }
}

impl DoorClip {
    pub fn last_frame(&self) -> u16 {
        self.frames.saturating_sub(1)
    }

    /// Frame shown `elapsed` seconds into an opening animation.
    pub fn frame_at(&self, elapsed: f32) -> u16 {
        if self.play_time <= 0.0 {
            return self.last_frame();
        }
        let t = (elapsed / self.play_time).clamp(0.0, 1.0);
        ((t * self.frames as f32) as u16).min(self.last_frame())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    pub side: SideId,
    /// The wall on the mirrored side of the same doorway.
    pub other: Option<WallId>,
    pub kind: WallType,
    pub flags: WallFlags,
    pub state: DoorState,
    pub hit_points: f32,
    /// Second leaf of a double door.
    pub linked: Option<WallId>,
    pub trigger: Option<TriggerId>,
    pub clip: Option<usize>,
    pub keys: KeyFlags,
    pub cloak_value: f32,
    pub frame: u16,
    pub(crate) timer: f32,
}

impl Wall {
    pub fn new(side: SideId, kind: WallType) -> Self {
        Self {
            side,
            other: None,
            kind,
            flags: WallFlags::empty(),
            state: DoorState::Closed,
            hit_points: 0.0,
            linked: None,
            trigger: None,
            clip: None,
            keys: KeyFlags::empty(),
            cloak_value: 0.0,
            frame: 0,
            timer: 0.0,
        }
    }

    pub fn is_door(&self) -> bool {
        self.kind == WallType::Door
    }

    pub fn is_locked(&self) -> bool {
        self.flags.contains(WallFlags::DOOR_LOCKED)
    }

    pub fn is_blasted(&self) -> bool {
        self.flags.contains(WallFlags::BLASTED)
    }

    pub fn is_door_opened(&self) -> bool {
        self.flags.contains(WallFlags::DOOR_OPENED)
    }

    /// Seconds into the current door or cloak animation.
    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Whether `keys` satisfy this door's key requirement.
    pub fn accepts_keys(&self, keys: KeyFlags) -> bool {
        keys.contains(self.keys)
    }
}
