//! Triggers: scripted effects fired when a player crosses or shoots a wall.

use bitflags::bitflags;
use cubeworld_common::{BodyId, SideId, TriggerId, WallId};
use serde::{Deserialize, Serialize};

use crate::body::BodyType;
use crate::error::LevelError;
use crate::event::WorldEvent;
use crate::wall::{WallFlags, WallType};
use crate::world::World;

/// Sides a single trigger may act on.
pub const MAX_TRIGGER_LINKS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerType {
    OpenDoor,
    CloseDoor,
    Matcen,
    Exit,
    SecretExit,
    IllusionOff,
    IllusionOn,
    UnlockDoor,
    LockDoor,
    OpenWall,
    CloseWall,
    IllusoryWall,
    LightOff,
    LightOn,
}

impl TryFrom<u8> for TriggerType {
    type Error = LevelError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::OpenDoor,
            1 => Self::CloseDoor,
            2 => Self::Matcen,
            3 => Self::Exit,
            4 => Self::SecretExit,
            5 => Self::IllusionOff,
            6 => Self::IllusionOn,
            7 => Self::UnlockDoor,
            8 => Self::LockDoor,
            9 => Self::OpenWall,
            10 => Self::CloseWall,
            11 => Self::IllusoryWall,
            12 => Self::LightOff,
            13 => Self::LightOn,
            other => return Err(LevelError::UnknownTriggerType(other)),
        })
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TriggerFlags: u8 {
        const NO_MESSAGE = 1;
        /// Disables itself after firing once.
        const ONE_SHOT = 2;
        const DISABLED = 4;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub kind: TriggerType,
    pub flags: TriggerFlags,
    /// Sides whose walls this trigger acts on.
    pub links: Vec<SideId>,
    /// Type-specific parameter, e.g. a light level.
    pub value: f32,
}

impl Trigger {
    pub fn new(kind: TriggerType) -> Self {
        Self {
            kind,
            flags: TriggerFlags::empty(),
            links: Vec::new(),
            value: 0.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.flags.contains(TriggerFlags::DISABLED)
    }
}

impl World {
    /// Fire `trigger` on behalf of `body`. Only players fire triggers.
    ///
    /// Returns whether the trigger ran.
    pub fn fire_trigger(&mut self, trigger: TriggerId, body: BodyId) -> bool {
        if self.body(body).map(|b| b.kind) != Some(BodyType::Player) {
            return false;
        }
        let Some(t) = self.triggers.get_mut(trigger.index()) else {
            return false;
        };
        if !t.is_enabled() {
            return false;
        }
        if t.flags.contains(TriggerFlags::ONE_SHOT) {
            t.flags.insert(TriggerFlags::DISABLED);
        }
        let kind = t.kind;
        let links = t.links.clone();
        tracing::debug!(trigger = trigger.0, ?kind, %body, "trigger fired");
        self.push_event(WorldEvent::TriggerFired { trigger, kind });

        let walls: Vec<WallId> = links.iter().filter_map(|&s| self.wall_on(s)).collect();
        match kind {
            TriggerType::OpenDoor => {
                for w in walls {
                    match self.walls[w.index()].kind {
                        WallType::Blastable => self.blast_wall(w),
                        WallType::Door => {
                            self.open_door(w);
                        }
                        _ => {}
                    }
                }
            }
            TriggerType::CloseDoor => {
                for w in walls {
                    self.close_door(w);
                }
            }
            TriggerType::OpenWall => {
                for w in walls {
                    if self.is_force_field(w) {
                        self.set_wall_kind(w, WallType::Open);
                    } else {
                        self.start_cloak(w);
                    }
                }
            }
            TriggerType::CloseWall => {
                for w in walls {
                    if self.is_force_field(w) {
                        self.set_wall_kind(w, WallType::Closed);
                    } else {
                        self.start_decloak(w);
                    }
                }
            }
            TriggerType::LockDoor => {
                for w in walls {
                    self.update_wall_pair(w, |wall| wall.flags.insert(WallFlags::DOOR_LOCKED));
                }
            }
            TriggerType::UnlockDoor => {
                for w in walls {
                    self.update_wall_pair(w, |wall| {
                        wall.flags.remove(WallFlags::DOOR_LOCKED);
                        wall.keys = Default::default();
                    });
                }
            }
            TriggerType::IllusionOff => {
                for w in walls {
                    self.update_wall_pair(w, |wall| wall.flags.insert(WallFlags::ILLUSION_OFF));
                }
            }
            TriggerType::IllusionOn => {
                for w in walls {
                    self.update_wall_pair(w, |wall| wall.flags.remove(WallFlags::ILLUSION_OFF));
                }
            }
            TriggerType::IllusoryWall => {
                for w in walls {
                    self.set_wall_kind(w, WallType::Illusion);
                }
            }
            TriggerType::Exit => self.push_event(WorldEvent::LevelExit { secret: false }),
            TriggerType::SecretExit => self.push_event(WorldEvent::LevelExit { secret: true }),
            // Producers and lighting live outside the kernel; the event is enough.
            TriggerType::Matcen | TriggerType::LightOff | TriggerType::LightOn => {}
        }
        true
    }

    fn is_force_field(&self, wall: WallId) -> bool {
        self.side(self.walls[wall.index()].side)
            .is_some_and(|s| self.surfaces.is_force_field(s.surface.texture))
    }

    fn set_wall_kind(&mut self, wall: WallId, kind: WallType) {
        self.update_wall_pair(wall, |w| {
            w.kind = kind;
            w.state = Default::default();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::config::SimConfig;
    use crate::cube::{BACK, FRONT};
    use crate::level::{LevelData, TriggerData, WallData};
    use crate::wall::DoorState;
    use cubeworld_common::CubeId;
    use glam::Vec3;

    /// Two-cube corridor: a wall pair on the shared doorway and a trigger on cube 0's back side.
    fn rigged(kind: u8, trigger: TriggerType, flags: u8) -> (World, BodyId) {
        let mut level = LevelData::corridor(2, 100.0, 100.0);
        level.walls.push(WallData {
            trigger: 0,
            ..WallData::new(0, BACK, 4)
        });
        level.walls.push(WallData::new(0, FRONT, kind));
        level.walls.push(WallData::new(1, BACK, kind));
        level.triggers.push(TriggerData {
            kind: trigger as u8,
            flags,
            links: vec![(0, FRONT)],
            value: 0.0,
        });
        let mut world = World::build(&level, SimConfig::default()).unwrap();
        let player = world
            .spawn_body(Body::player(Vec3::new(0.0, 0.0, 50.0), 2.0), CubeId(0))
            .unwrap();
        (world, player)
    }

    #[test]
    fn trigger_codes() {
        assert_eq!(TriggerType::try_from(9).unwrap(), TriggerType::OpenWall);
        assert!(matches!(
            TriggerType::try_from(14),
            Err(LevelError::UnknownTriggerType(14))
        ));
    }

    #[test]
    fn only_players_fire() {
        let (mut world, _) = rigged(2, TriggerType::OpenDoor, 0);
        let robot = world
            .spawn_body(Body::robot(Vec3::new(0.0, 0.0, 40.0), 2.0), CubeId(0))
            .unwrap();
        assert!(!world.fire_trigger(TriggerId(0), robot));
        assert_eq!(world.walls()[1].state, DoorState::Closed);
    }

    #[test]
    fn open_door_trigger_starts_opening() {
        let (mut world, player) = rigged(2, TriggerType::OpenDoor, 0);
        assert!(world.fire_trigger(TriggerId(0), player));
        assert_eq!(world.walls()[1].state, DoorState::Opening);
        assert_eq!(world.walls()[2].state, DoorState::Opening);
        assert!(world.events().iter().any(|e| matches!(
            e,
            WorldEvent::TriggerFired {
                kind: TriggerType::OpenDoor,
                ..
            }
        )));
    }

    #[test]
    fn open_door_trigger_blasts_blastables() {
        let (mut world, player) = rigged(1, TriggerType::OpenDoor, 0);
        world.fire_trigger(TriggerId(0), player);
        assert!(world.walls()[1].is_blasted());
        assert!(world.walls()[2].is_blasted());
    }

    #[test]
    fn one_shot_disables_itself() {
        let (mut world, player) = rigged(2, TriggerType::OpenDoor, TriggerFlags::ONE_SHOT.bits());
        assert!(world.fire_trigger(TriggerId(0), player));
        assert!(!world.trigger(TriggerId(0)).unwrap().is_enabled());
        assert!(!world.fire_trigger(TriggerId(0), player));
    }

    #[test]
    fn disabled_trigger_is_noop() {
        let (mut world, player) = rigged(2, TriggerType::OpenDoor, TriggerFlags::DISABLED.bits());
        assert!(!world.fire_trigger(TriggerId(0), player));
        assert_eq!(world.walls()[1].state, DoorState::Closed);
    }

    #[test]
    fn lock_and_unlock_mirror_onto_both_walls() {
        let (mut world, player) = rigged(2, TriggerType::LockDoor, 0);
        world.fire_trigger(TriggerId(0), player);
        assert!(world.walls()[1].is_locked());
        assert!(world.walls()[2].is_locked());

        world.triggers[0].kind = TriggerType::UnlockDoor;
        world.fire_trigger(TriggerId(0), player);
        assert!(!world.walls()[1].is_locked());
        assert!(!world.walls()[2].is_locked());
    }

    #[test]
    fn illusion_switches() {
        let (mut world, player) = rigged(3, TriggerType::IllusionOff, 0);
        world.fire_trigger(TriggerId(0), player);
        assert!(world.walls()[2].flags.contains(WallFlags::ILLUSION_OFF));
        world.triggers[0].kind = TriggerType::IllusionOn;
        world.fire_trigger(TriggerId(0), player);
        assert!(!world.walls()[1].flags.contains(WallFlags::ILLUSION_OFF));
    }

    #[test]
    fn open_wall_cloaks_closed_walls() {
        let (mut world, player) = rigged(5, TriggerType::OpenWall, 0);
        world.fire_trigger(TriggerId(0), player);
        assert_eq!(world.walls()[1].kind, WallType::Cloaked);
        assert_eq!(world.walls()[1].state, DoorState::Cloaking);
        assert_eq!(world.cloaking_walls().len(), 1);
    }

    #[test]
    fn exit_trigger_reports_level_exit() {
        let (mut world, player) = rigged(5, TriggerType::SecretExit, 0);
        world.fire_trigger(TriggerId(0), player);
        assert!(
            world
                .events()
                .contains(&WorldEvent::LevelExit { secret: true })
        );
    }
}
