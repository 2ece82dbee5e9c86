//! Moving bodies: type tags, movers and per-role gameplay state.

use bitflags::bitflags;
use cubeworld_common::{BodyId, CubeId};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::LevelError;
use crate::wall::KeyFlags;

pub const MAX_SHIELDS: f32 = 200.0;
pub const MAX_ENERGY: f32 = 200.0;
pub const POWERUP_BOOST: f32 = 18.0;

/// Type tag used for collision-handler lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BodyType {
    Wall,
    Fireball,
    Robot,
    Hostage,
    Player,
    Weapon,
    Camera,
    Powerup,
    Debris,
    Reactor,
    Flare,
    Clutter,
    Ghost,
    Light,
    Coop,
    Marker,
}

impl BodyType {
    pub const COUNT: usize = 16;

    pub const ALL: [BodyType; Self::COUNT] = [
        Self::Wall,
        Self::Fireball,
        Self::Robot,
        Self::Hostage,
        Self::Player,
        Self::Weapon,
        Self::Camera,
        Self::Powerup,
        Self::Debris,
        Self::Reactor,
        Self::Flare,
        Self::Clutter,
        Self::Ghost,
        Self::Light,
        Self::Coop,
        Self::Marker,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for BodyType {
    type Error = LevelError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(LevelError::UnknownBodyType(code))
    }
}

/// What drives a body's decisions. Stored for the AI and effects layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlType {
    None,
    Ai,
    Explosion,
    Flying,
    Slew,
    Flythrough,
    Weapon,
    RepairCenter,
    Morph,
    Debris,
    Powerup,
    Light,
    Remote,
    Reactor,
}

impl TryFrom<u8> for ControlType {
    type Error = LevelError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::None,
            1 => Self::Ai,
            2 => Self::Explosion,
            4 => Self::Flying,
            5 => Self::Slew,
            6 => Self::Flythrough,
            9 => Self::Weapon,
            10 => Self::RepairCenter,
            11 => Self::Morph,
            12 => Self::Debris,
            13 => Self::Powerup,
            14 => Self::Light,
            15 => Self::Remote,
            16 => Self::Reactor,
            other => return Err(LevelError::UnknownControlType(other)),
        })
    }
}

/// How a body is drawn. Stored for the render layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderType {
    None,
    Polyobj,
    Fireball,
    Laser,
    Hostage,
    Powerup,
    Morph,
    WeaponVclip,
}

impl TryFrom<u8> for RenderType {
    type Error = LevelError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::None,
            1 => Self::Polyobj,
            2 => Self::Fireball,
            3 => Self::Laser,
            4 => Self::Hostage,
            5 => Self::Powerup,
            6 => Self::Morph,
            7 => Self::WeaponVclip,
            other => return Err(LevelError::UnknownRenderType(other)),
        })
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct PhysicsFlags: u16 {
        /// Bank into turns.
        const TURNROLL = 1;
        /// Reflect off walls instead of stopping or detonating.
        const BOUNCE = 4;
        const USES_THRUST = 64;
    }
}

/// Linear and angular state for physically simulated bodies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsInfo {
    pub velocity: Vec3,
    /// Per-frame velocity impulse requested by the controller.
    pub thrust: Vec3,
    pub mass: f32,
    pub drag: f32,
    /// Angular velocity around the local axes (pitch, heading, bank), radians/s.
    pub rot_velocity: Vec3,
    pub rot_thrust: Vec3,
    /// Current bank angle contributed by turn-roll.
    pub turnroll: f32,
    pub flags: PhysicsFlags,
}

impl Default for PhysicsInfo {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            thrust: Vec3::ZERO,
            mass: 1.0,
            drag: 0.0,
            rot_velocity: Vec3::ZERO,
            rot_thrust: Vec3::ZERO,
            turnroll: 0.0,
            flags: PhysicsFlags::empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Mover {
    None,
    Physics(PhysicsInfo),
    /// Pure rotation at a fixed angular velocity.
    Spinning(Vec3),
}

impl Mover {
    pub fn decode(code: u8, physics: PhysicsInfo) -> Result<Self, LevelError> {
        Ok(match code {
            0 => Self::None,
            1 => Self::Physics(physics),
            3 => Self::Spinning(physics.rot_velocity),
            other => return Err(LevelError::UnknownMoverType(other)),
        })
    }

    pub fn physics(&self) -> Option<&PhysicsInfo> {
        match self {
            Self::Physics(p) => Some(p),
            _ => None,
        }
    }

    pub fn physics_mut(&mut self) -> Option<&mut PhysicsInfo> {
        match self {
            Self::Physics(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerupKind {
    ExtraLife,
    Energy,
    Shield,
    Key(KeyFlags),
    Other(u16),
}

impl PowerupKind {
    pub fn from_subtype(subtype: u16) -> Self {
        match subtype {
            0 => Self::ExtraLife,
            1 => Self::Energy,
            2 => Self::Shield,
            4 => Self::Key(KeyFlags::BLUE),
            5 => Self::Key(KeyFlags::RED),
            6 => Self::Key(KeyFlags::GOLD),
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub keys: KeyFlags,
    pub energy: f32,
    pub lives: u32,
    pub hostages_rescued: u32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            keys: KeyFlags::empty(),
            energy: 100.0,
            lives: 3,
            hostages_rescued: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponState {
    pub damage: f32,
    /// Harmless weapons (flares) are never consumed by what they hit.
    pub harmless: bool,
    pub bounces: u32,
}

/// Gameplay state that only some body types carry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Role {
    None,
    Player(PlayerState),
    Weapon(WeaponState),
    Powerup(PowerupKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub kind: BodyType,
    pub subtype: u16,
    pub position: Vec3,
    pub orientation: Quat,
    pub radius: f32,
    pub mover: Mover,
    pub control: ControlType,
    pub render: RenderType,
    pub shields: f32,
    /// Body that fired this one; weapons never collide with their owner.
    pub owner: Option<BodyId>,
    pub role: Role,
    pub(crate) cube: Option<CubeId>,
    pub(crate) slot: usize,
}

impl Body {
    pub fn new(kind: BodyType, position: Vec3, radius: f32) -> Self {
        Self {
            kind,
            subtype: 0,
            position,
            orientation: Quat::IDENTITY,
            radius,
            mover: Mover::None,
            control: ControlType::None,
            render: RenderType::None,
            shields: 100.0,
            owner: None,
            role: Role::None,
            cube: None,
            slot: 0,
        }
    }

    pub fn player(position: Vec3, radius: f32) -> Self {
        Self {
            mover: Mover::Physics(PhysicsInfo {
                mass: 4.0,
                drag: 0.5,
                flags: PhysicsFlags::TURNROLL | PhysicsFlags::USES_THRUST,
                ..PhysicsInfo::default()
            }),
            control: ControlType::Flying,
            render: RenderType::Polyobj,
            role: Role::Player(PlayerState::default()),
            ..Self::new(BodyType::Player, position, radius)
        }
    }

    pub fn robot(position: Vec3, radius: f32) -> Self {
        Self {
            mover: Mover::Physics(PhysicsInfo {
                mass: 4.0,
                ..PhysicsInfo::default()
            }),
            control: ControlType::Ai,
            render: RenderType::Polyobj,
            ..Self::new(BodyType::Robot, position, radius)
        }
    }

    pub fn weapon(position: Vec3, velocity: Vec3, radius: f32, damage: f32) -> Self {
        Self {
            mover: Mover::Physics(PhysicsInfo {
                velocity,
                mass: 0.1,
                ..PhysicsInfo::default()
            }),
            control: ControlType::Weapon,
            render: RenderType::Laser,
            role: Role::Weapon(WeaponState {
                damage,
                harmless: false,
                bounces: 0,
            }),
            ..Self::new(BodyType::Weapon, position, radius)
        }
    }

    pub fn powerup(position: Vec3, radius: f32, kind: PowerupKind) -> Self {
        Self {
            control: ControlType::Powerup,
            render: RenderType::Powerup,
            role: Role::Powerup(kind),
            ..Self::new(BodyType::Powerup, position, radius)
        }
    }

    pub fn hostage(position: Vec3, radius: f32) -> Self {
        Self {
            render: RenderType::Hostage,
            ..Self::new(BodyType::Hostage, position, radius)
        }
    }

    pub fn reactor(position: Vec3, radius: f32) -> Self {
        Self {
            control: ControlType::Reactor,
            render: RenderType::Polyobj,
            shields: 200.0,
            ..Self::new(BodyType::Reactor, position, radius)
        }
    }

    pub fn with_owner(mut self, owner: BodyId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_physics(mut self, physics: PhysicsInfo) -> Self {
        self.mover = Mover::Physics(physics);
        self
    }

    /// Cube whose body list holds this body.
    pub fn cube(&self) -> Option<CubeId> {
        self.cube
    }

    /// Position of this body within its cube's body list.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn velocity(&self) -> Vec3 {
        self.mover.physics().map_or(Vec3::ZERO, |p| p.velocity)
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        if let Some(p) = self.mover.physics_mut() {
            p.velocity = velocity;
        }
    }

    pub fn mass(&self) -> f32 {
        self.mover.physics().map_or(f32::INFINITY, |p| p.mass)
    }

    pub fn keys(&self) -> KeyFlags {
        match &self.role {
            Role::Player(p) => p.keys,
            _ => KeyFlags::empty(),
        }
    }

    pub fn weapon_state(&self) -> Option<&WeaponState> {
        match &self.role {
            Role::Weapon(w) => Some(w),
            _ => None,
        }
    }

    pub fn is_weapon(&self) -> bool {
        self.kind == BodyType::Weapon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_type_codes() {
        assert_eq!(BodyType::try_from(4).unwrap(), BodyType::Player);
        assert_eq!(BodyType::try_from(9).unwrap(), BodyType::Reactor);
        assert!(matches!(
            BodyType::try_from(99),
            Err(LevelError::UnknownBodyType(99))
        ));
        for (i, kind) in BodyType::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn control_and_render_codes_reject_gaps() {
        assert_eq!(ControlType::try_from(9).unwrap(), ControlType::Weapon);
        assert!(ControlType::try_from(3).is_err());
        assert_eq!(RenderType::try_from(5).unwrap(), RenderType::Powerup);
        assert!(RenderType::try_from(8).is_err());
    }

    #[test]
    fn mover_decoding() {
        let physics = PhysicsInfo {
            rot_velocity: Vec3::Y,
            ..PhysicsInfo::default()
        };
        assert!(matches!(Mover::decode(1, physics), Ok(Mover::Physics(_))));
        assert!(matches!(Mover::decode(3, physics), Ok(Mover::Spinning(v)) if v == Vec3::Y));
        assert!(matches!(
            Mover::decode(2, physics),
            Err(LevelError::UnknownMoverType(2))
        ));
    }

    #[test]
    fn powerup_subtypes() {
        assert_eq!(PowerupKind::from_subtype(5), PowerupKind::Key(KeyFlags::RED));
        assert_eq!(PowerupKind::from_subtype(30), PowerupKind::Other(30));
    }

    #[test]
    fn builders_set_roles() {
        let w = Body::weapon(Vec3::ZERO, Vec3::Z, 1.0, 10.0);
        assert!(w.is_weapon());
        assert_eq!(w.velocity(), Vec3::Z);
        assert_eq!(w.weapon_state().map(|s| s.damage), Some(10.0));
        let p = Body::player(Vec3::ZERO, 2.0);
        assert!(p.keys().is_empty());
        assert_eq!(Body::hostage(Vec3::ZERO, 1.0).mass(), f32::INFINITY);
    }
}
