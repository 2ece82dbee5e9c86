//! Body-versus-body collision responses keyed by the pair of body types.

use std::fmt;

use cubeworld_common::BodyId;
use glam::Vec3;

use crate::body::{BodyType, MAX_ENERGY, MAX_SHIELDS, POWERUP_BOOST, PowerupKind, Role};
use crate::event::{SoundEvent, WorldEvent};
use crate::world::World;

/// Response to a contact between two bodies.
///
/// Receives the world, game time, the contact point and the two bodies in
/// registration order. Returns a body that should be removed, if any.
pub type CollisionHandler = fn(&mut World, f32, Vec3, BodyId, BodyId) -> Option<BodyId>;

/// A resolved table entry, ready to be invoked on a concrete pair of bodies.
#[derive(Clone, Copy)]
pub struct Dispatch {
    handler: CollisionHandler,
    /// Registered for the mirrored pair; arguments are swapped before the call.
    swapped: bool,
}

impl Dispatch {
    /// Call the handler with `a` striking `b`, in registration order.
    pub fn invoke(self, world: &mut World, time: f32, contact: Vec3, a: BodyId, b: BodyId) -> Option<BodyId> {
        if self.swapped {
            (self.handler)(world, time, contact, b, a)
        } else {
            (self.handler)(world, time, contact, a, b)
        }
    }

    pub fn is_mirrored(self) -> bool {
        self.swapped
    }
}

/// Square lookup table of collision handlers indexed by body type.
#[derive(Clone)]
pub struct CollisionTable {
    entries: [[Option<Dispatch>; BodyType::COUNT]; BodyType::COUNT],
}

impl fmt::Debug for CollisionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<(BodyType, BodyType)> = BodyType::ALL
            .iter()
            .flat_map(|&a| BodyType::ALL.iter().map(move |&b| (a, b)))
            .filter(|&(a, b)| self.handles(a, b))
            .collect();
        f.debug_struct("CollisionTable").field("pairs", &pairs).finish()
    }
}

impl Default for CollisionTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl CollisionTable {
    /// A table with no responses; every contact is ignored.
    pub fn empty() -> Self {
        Self {
            entries: [[None; BodyType::COUNT]; BodyType::COUNT],
        }
    }

    /// Responses for the built-in body types.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(BodyType::Player, BodyType::Hostage, player_rescues_hostage);
        table.register(BodyType::Player, BodyType::Powerup, player_picks_up_powerup);
        table.register(BodyType::Player, BodyType::Robot, bump);
        table.register(BodyType::Player, BodyType::Coop, bump);
        table.register(BodyType::Player, BodyType::Reactor, bump);
        table.register(BodyType::Robot, BodyType::Robot, bump);
        table.register(BodyType::Robot, BodyType::Weapon, target_hit_by_weapon);
        table.register(BodyType::Reactor, BodyType::Weapon, target_hit_by_weapon);
        table.register(BodyType::Player, BodyType::Weapon, player_hit_by_weapon);
        table
    }

    /// Register `handler` for `(a, b)`, and the mirrored pair with swapped arguments.
    pub fn register(&mut self, a: BodyType, b: BodyType, handler: CollisionHandler) {
        self.entries[a.index()][b.index()] = Some(Dispatch {
            handler,
            swapped: false,
        });
        if a != b {
            self.entries[b.index()][a.index()] = Some(Dispatch {
                handler,
                swapped: true,
            });
        }
    }

    /// Look up the response for a body of type `a` striking one of type `b`.
    pub fn dispatch(&self, a: BodyType, b: BodyType) -> Option<Dispatch> {
        self.entries[a.index()][b.index()]
    }

    pub fn handles(&self, a: BodyType, b: BodyType) -> bool {
        self.dispatch(a, b).is_some()
    }
}

impl World {
    /// Run the response for `a` striking `b`. Returns the body the handler
    /// wants removed.
    pub fn collide(&mut self, a: BodyId, b: BodyId, contact: Vec3) -> Option<BodyId> {
        let kind_a = self.body(a)?.kind;
        let kind_b = self.body(b)?.kind;
        let dispatch = self.collisions.dispatch(kind_a, kind_b)?;
        let time = self.time();
        tracing::trace!(?kind_a, ?kind_b, "collision");
        dispatch.invoke(self, time, contact, a, b)
    }

    /// Subtract shields; destroys robots and reactors that drop below zero.
    pub fn damage_body(&mut self, id: BodyId, amount: f32) -> bool {
        let Some(body) = self.body_mut(id) else {
            return false;
        };
        body.shields -= amount;
        if body.shields >= 0.0 || !matches!(body.kind, BodyType::Robot | BodyType::Reactor) {
            return false;
        }
        let (kind, position, radius) = (body.kind, body.position, body.radius);
        let cube = body.cube();
        if let Some(cube) = cube {
            self.push_event(WorldEvent::ExplosionSpawned {
                cube,
                position,
                size: radius * 2.5,
            });
        }
        if kind == BodyType::Reactor {
            tracing::info!(%id, "reactor destroyed");
            self.push_event(WorldEvent::ReactorDestroyed { reactor: id });
        }
        self.remove_body(id);
        true
    }

    /// Apply a powerup to a player. Returns whether it was used up.
    fn apply_powerup(&mut self, player: BodyId, kind: PowerupKind) -> bool {
        let Some(body) = self.body_mut(player) else {
            return false;
        };
        let shields = &mut body.shields;
        let Role::Player(state) = &mut body.role else {
            return false;
        };
        match kind {
            PowerupKind::ExtraLife => state.lives += 1,
            PowerupKind::Energy if state.energy < MAX_ENERGY => {
                state.energy = (state.energy + POWERUP_BOOST).min(MAX_ENERGY);
            }
            PowerupKind::Shield if *shields < MAX_SHIELDS => {
                *shields = (*shields + POWERUP_BOOST).min(MAX_SHIELDS);
            }
            PowerupKind::Energy | PowerupKind::Shield => return false,
            PowerupKind::Key(key) => state.keys.insert(key),
            PowerupKind::Other(_) => {}
        }
        true
    }
}

fn player_rescues_hostage(
    world: &mut World,
    _time: f32,
    contact: Vec3,
    player: BodyId,
    hostage: BodyId,
) -> Option<BodyId> {
    if let Some(Role::Player(state)) = world.body_mut(player).map(|b| &mut b.role) {
        state.hostages_rescued += 1;
    }
    world.push_event(WorldEvent::HostageRescued { hostage, player });
    world.push_event(WorldEvent::Sound {
        sound: SoundEvent::HostageRescue,
        position: contact,
    });
    Some(hostage)
}

fn player_picks_up_powerup(
    world: &mut World,
    _time: f32,
    contact: Vec3,
    player: BodyId,
    powerup: BodyId,
) -> Option<BodyId> {
    let Role::Powerup(kind) = world.body(powerup)?.role else {
        return None;
    };
    if !world.apply_powerup(player, kind) {
        return None;
    }
    world.push_event(WorldEvent::PowerupConsumed { powerup, player });
    world.push_event(WorldEvent::Sound {
        sound: SoundEvent::PowerupPickup,
        position: contact,
    });
    Some(powerup)
}

/// Elastic exchange of momentum along the line between centres.
fn bump(world: &mut World, _time: f32, _contact: Vec3, a: BodyId, b: BodyId) -> Option<BodyId> {
    let (pa, va, ma) = world.body(a).map(|x| (x.position, x.velocity(), x.mass()))?;
    let (pb, vb, mb) = world.body(b).map(|x| (x.position, x.velocity(), x.mass()))?;
    let normal = (pb - pa).normalize_or_zero();
    let closing = (va - vb).dot(normal);
    if closing <= 0.0 {
        return None;
    }
    let inverse = |m: f32| if m.is_finite() && m > 0.0 { 1.0 / m } else { 0.0 };
    let (ia, ib) = (inverse(ma), inverse(mb));
    if ia + ib <= 0.0 {
        return None;
    }
    let impulse = 2.0 * closing / (ia + ib);
    if let Some(body) = world.body_mut(a) {
        body.set_velocity(va - normal * (impulse * ia));
    }
    if let Some(body) = world.body_mut(b) {
        body.set_velocity(vb + normal * (impulse * ib));
    }
    None
}

fn target_hit_by_weapon(
    world: &mut World,
    _time: f32,
    _contact: Vec3,
    target: BodyId,
    weapon: BodyId,
) -> Option<BodyId> {
    let body = world.body(weapon)?;
    if body.owner == Some(target) {
        return None;
    }
    let state = *body.weapon_state()?;
    if state.harmless {
        return None;
    }
    world.damage_body(target, state.damage);
    Some(weapon)
}

fn player_hit_by_weapon(
    world: &mut World,
    _time: f32,
    _contact: Vec3,
    player: BodyId,
    weapon: BodyId,
) -> Option<BodyId> {
    let body = world.body(weapon)?;
    if body.owner == Some(player) {
        return None;
    }
    let state = *body.weapon_state()?;
    if state.harmless {
        return None;
    }
    if let Some(p) = world.body_mut(player) {
        p.shields -= state.damage;
    }
    Some(weapon)
}
