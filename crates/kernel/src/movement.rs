//! The per-body movement integrator.
//!
//! A body's step is a short loop of sweep tests: the nearest contact against
//! the current cube's sides or the bodies inside it is resolved, the rest of
//! the motion is adjusted, and the loop repeats until the motion is used up or
//! the bounce budget runs out.

use cubeworld_common::{Bounce, BodyId, CubeId, LineSegment, WallId, sweep_sphere};
use glam::Vec3;

use crate::body::{BodyType, Mover, PhysicsFlags, Role};
use crate::config::SimConfig;
use crate::error::SimError;
use crate::event::{SoundEvent, WorldEvent};
use crate::physics;
use crate::wall::{KeyFlags, WallFlags, WallType};
use crate::world::World;

/// Nearest contact found during one pass of the integrator.
enum Hit {
    Wall(Bounce),
    Body(BodyId, Bounce),
}

impl Hit {
    fn distance(&self) -> f32 {
        match self {
            Self::Wall(b) | Self::Body(_, b) => b.distance,
        }
    }
}

/// What happened when a weapon struck a solid side.
enum WeaponImpact {
    PassThrough,
    Reflect,
    Detonate,
}

impl World {
    /// Advance one body by `frame_time`: drag and rotation for physics
    /// movers, spin for spinning ones, then [`World::move_body`]. Returns
    /// whether the body is still alive.
    pub fn simulate_body(&mut self, id: BodyId, frame_time: f32) -> Result<bool, SimError> {
        let config = self.config.clone();
        let body = self.body_mut(id).ok_or(SimError::DeadBody(id))?;
        let mut phys = match body.mover {
            Mover::None => return Ok(true),
            Mover::Spinning(rot) => {
                body.orientation = physics::spin(body.orientation, rot, frame_time);
                return Ok(true);
            }
            Mover::Physics(p) => p,
        };
        physics::apply_drag(&mut phys, frame_time, &config);
        body.orientation = physics::integrate_rotation(body.orientation, &mut phys, frame_time, &config);
        body.mover = Mover::Physics(phys);
        self.move_body(id, frame_time)
    }

    /// Swept movement with collision response at the body's current
    /// velocity. Returns whether the body is still alive.
    pub fn move_body(&mut self, id: BodyId, frame_time: f32) -> Result<bool, SimError> {
        let config = self.config.clone();
        let body = self.body(id).ok_or(SimError::DeadBody(id))?;
        let start_cube = body.cube().ok_or(SimError::DeadBody(id))?;
        let start = body.position;
        let radius = body.radius;
        let is_weapon = body.is_weapon();
        let mut velocity = body.velocity();
        if frame_time <= 0.0 || velocity.length_squared() <= f32::EPSILON {
            return Ok(true);
        }

        let _span = tracing::trace_span!("move_body", %id).entered();
        let mut pos = start;
        let mut target = pos + velocity * frame_time;
        let mut remaining = frame_time;
        let mut cube = start_cube;
        let mut hit_bodies: Vec<BodyId> = Vec::new();

        for _ in 0..config.bounce_budget {
            let segment = LineSegment::new(pos, target);
            if segment.is_degenerate() {
                pos = target;
                break;
            }
            let wall = self
                .nearest_wall_hit(cube, &segment, radius + config.collision_epsilon)
                .map(Hit::Wall);
            let other = self.nearest_body_hit(id, cube, &segment, &hit_bodies);
            let hit = match (wall, other) {
                (Some(w), Some(b)) => Some(if b.distance() < w.distance() { b } else { w }),
                (w, b) => w.or(b),
            };
            let Some(hit) = hit else {
                pos = target;
                break;
            };
            let travelled = (hit.distance() / segment.length).clamp(0.0, 1.0);
            remaining *= 1.0 - travelled;

            match hit {
                Hit::Body(other, bounce) => {
                    pos = bounce.point;
                    hit_bodies.push(other);
                    if let Some(removed) = self.collide(id, other, bounce.surface) {
                        self.remove_body(removed);
                    }
                    let Some(me) = self.body(id) else {
                        return Ok(false);
                    };
                    velocity = me.velocity();
                    target = pos + velocity * remaining;
                }
                Hit::Wall(bounce) => {
                    let Some(side_id) = bounce.side else {
                        pos = bounce.point;
                        break;
                    };
                    let Some(side) = self.side(side_id) else {
                        pos = bounce.point;
                        break;
                    };
                    let neighbor = side.neighbor.cube();
                    let wall_id = side.wall;
                    let solid = side.is_solid(&self.walls, self.surfaces.as_ref());

                    if !solid {
                        if let Some(trigger) = wall_id.and_then(|w| self.walls[w.index()].trigger) {
                            self.fire_trigger(trigger, id);
                        }
                        pos = bounce.point;
                        if let Some(next) = neighbor {
                            cube = next;
                        }
                        continue;
                    }

                    if !is_weapon {
                        let keys = self
                            .body(id)
                            .filter(|b| b.kind == BodyType::Player)
                            .map(|b| b.keys());
                        if let (Some(wall), Some(keys)) = (wall_id, keys) {
                            self.wall_hit_process(wall, keys, bounce.surface);
                        }
                        pos = bounce.point;
                        velocity -= bounce.normal * velocity.dot(bounce.normal);
                        target = bounce.contact_plane().reflect(target);
                        continue;
                    }

                    match self.weapon_impact(id, &bounce, &config) {
                        WeaponImpact::PassThrough => {
                            pos = self
                                .side(side_id)
                                .and_then(|s| s.bounce(&segment, 0.0))
                                .map_or(bounce.point, |b| b.point);
                            if let Some(next) = neighbor {
                                cube = next;
                            }
                        }
                        WeaponImpact::Reflect => {
                            pos = bounce.point;
                            velocity -= bounce.normal * (2.0 * velocity.dot(bounce.normal));
                            target = bounce.contact_plane().reflect(target);
                        }
                        WeaponImpact::Detonate => {
                            self.weapon_hit_wall(id, &bounce, wall_id, &config);
                            return Ok(false);
                        }
                    }
                }
            }
        }

        if !self.cubes[cube.index()].is_point_inside(pos) {
            let c = &self.cubes[cube.index()];
            let probe = LineSegment::new(c.center, pos);
            match c.bounce(&probe, 0.0) {
                Some(b) => {
                    pos = probe.at((b.distance - config.collision_epsilon).max(0.0));
                    tracing::debug!(%id, cube = %cube, "clamped body back inside cube");
                }
                None => {
                    tracing::warn!(%id, cube = %cube, "body escaped its cube; move abandoned");
                    pos = start;
                    cube = start_cube;
                }
            }
        }

        let body = self.body_mut(id).ok_or(SimError::DeadBody(id))?;
        body.position = pos;
        body.set_velocity(velocity);
        if cube != start_cube {
            self.link(id, cube)?;
            self.push_event(WorldEvent::BodyChangedCube {
                body: id,
                from: start_cube,
                to: cube,
            });
        }
        Ok(true)
    }

    /// Nearest side contact. Passable sides are tested with radius zero so a
    /// body's centre decides when it crosses.
    fn nearest_wall_hit(&self, cube: CubeId, segment: &LineSegment, radius: f32) -> Option<Bounce> {
        let walls = &self.walls;
        let surfaces = self.surfaces.as_ref();
        self.cubes.get(cube.index())?.bounce_with(segment, |side| {
            Some(if side.is_solid(walls, surfaces) { radius } else { 0.0 })
        })
    }

    fn nearest_body_hit(
        &self,
        id: BodyId,
        cube: CubeId,
        segment: &LineSegment,
        skip: &[BodyId],
    ) -> Option<Hit> {
        let me = self.body(id)?;
        let mut best: Option<(BodyId, Bounce)> = None;
        for &other in self.cubes.get(cube.index())?.bodies() {
            if other == id || skip.contains(&other) {
                continue;
            }
            let Some(body) = self.body(other) else {
                continue;
            };
            if !self.collisions.handles(me.kind, body.kind) {
                continue;
            }
            // Same-type pairs are resolved by whichever moved first.
            if body.kind == me.kind && other.index < id.index {
                continue;
            }
            if me.owner == Some(other) || body.owner == Some(id) {
                continue;
            }
            let Some(distance) = sweep_sphere(segment, body.position, me.radius, body.radius) else {
                continue;
            };
            if best.as_ref().is_some_and(|(_, b)| b.distance <= distance) {
                continue;
            }
            let point = segment.at(distance);
            let normal = (point - body.position).normalize_or_zero();
            best = Some((
                other,
                Bounce {
                    point,
                    surface: body.position + normal * body.radius,
                    normal,
                    distance,
                    triangle: None,
                    side: None,
                    cube: Some(cube),
                },
            ));
        }
        best.map(|(other, b)| Hit::Body(other, b))
    }

    fn weapon_impact(&mut self, id: BodyId, bounce: &Bounce, config: &SimConfig) -> WeaponImpact {
        let Some(side) = bounce.side.and_then(|s| self.side(s)) else {
            return WeaponImpact::Detonate;
        };
        let uv = side.uv_at(bounce.triangle.unwrap_or(0), bounce.surface);
        if side.neighbor.cube().is_some() && self.surfaces.is_transparent_at(&side.surface, uv) {
            return WeaponImpact::PassThrough;
        }
        let force_field = self.surfaces.is_force_field(side.surface.texture);
        let Some(body) = self.body_mut(id) else {
            return WeaponImpact::Detonate;
        };
        let bounces = body
            .mover
            .physics()
            .is_some_and(|p| p.flags.contains(PhysicsFlags::BOUNCE));
        let Role::Weapon(state) = &mut body.role else {
            return WeaponImpact::Detonate;
        };
        if force_field {
            return WeaponImpact::Reflect;
        }
        if bounces && state.bounces < config.max_weapon_bounces {
            state.bounces += 1;
            self.push_event(WorldEvent::Sound {
                sound: SoundEvent::WallHit,
                position: bounce.surface,
            });
            return WeaponImpact::Reflect;
        }
        WeaponImpact::Detonate
    }

    /// Detonate a weapon against a wall: impact explosion, overlay
    /// destruction, wall damage and switches.
    fn weapon_hit_wall(
        &mut self,
        id: BodyId,
        bounce: &Bounce,
        wall: Option<WallId>,
        config: &SimConfig,
    ) {
        let Some(body) = self.body(id) else {
            return;
        };
        let owner = body.owner;
        let damage = body.weapon_state().map_or(0.0, |w| w.damage);
        let cube = bounce.cube.unwrap_or_else(|| body.cube().unwrap_or(CubeId(0)));

        self.push_event(WorldEvent::ExplosionSpawned {
            cube,
            position: bounce.point,
            size: config.impact_explosion_size,
        });
        self.push_event(WorldEvent::Sound {
            sound: SoundEvent::WallHit,
            position: bounce.surface,
        });

        if let Some(side_id) = bounce.side {
            let overlay = self.side(side_id).and_then(|s| s.surface.overlay);
            if let Some(destroyed) = overlay.and_then(|o| self.surfaces.destroyed_overlay(o)) {
                if let Some(side) = self.side_mut(side_id) {
                    side.surface.overlay = Some(destroyed.texture);
                }
                self.push_event(WorldEvent::TextureSwapped {
                    side: side_id,
                    texture: destroyed.texture,
                });
                if destroyed.explodes {
                    self.push_event(WorldEvent::ExplosionSpawned {
                        cube,
                        position: bounce.surface,
                        size: config.impact_explosion_size * 2.0,
                    });
                }
            }
        }

        if let Some(wall) = wall {
            let (kind, flags, trigger) = {
                let w = &self.walls[wall.index()];
                (w.kind, w.flags, w.trigger)
            };
            match kind {
                WallType::Blastable => {
                    self.damage_wall(wall, damage);
                }
                WallType::Door => {
                    let keys = owner
                        .and_then(|o| self.body(o))
                        .map_or(KeyFlags::empty(), |b| b.keys());
                    self.wall_hit_process(wall, keys, bounce.surface);
                }
                _ => {}
            }
            if flags.contains(WallFlags::SWITCH) {
                if let (Some(trigger), Some(owner)) = (trigger, owner) {
                    self.fire_trigger(trigger, owner);
                }
            }
        }

        self.remove_body(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Body, BodyType, PhysicsInfo};
    use crate::config::SimConfig;
    use crate::cube::{BACK, FRONT};
    use crate::doors::ExplodingWall;
    use crate::level::{LevelData, TriggerData, WallData};
    use crate::surface::{PixelMask, SideSurface, TRANSPARENT_INDEX, TextureInfo, TextureTable};
    use crate::trigger::TriggerType;
    use crate::wall::{DoorClip, DoorState};
    use cubeworld_common::{SideId, TextureId};

    fn world(level: &LevelData) -> World {
        World::build(level, SimConfig::default()).unwrap()
    }

    fn at(z: f32) -> Vec3 {
        Vec3::new(0.0, 0.0, z)
    }

    #[test]
    fn weapon_detonates_on_front_wall() {
        let mut w = world(&LevelData::corridor(1, 100.0, 100.0));
        let shot = w
            .spawn_body(Body::weapon(at(50.0), Vec3::new(0.0, 0.0, 100.0), 1.0, 10.0), CubeId(0))
            .unwrap();
        assert!(!w.simulate_body(shot, 1.0).unwrap());
        assert!(!w.is_alive(shot));
        assert!(w.cube(CubeId(0)).unwrap().bodies().is_empty());
        let explosion = w.events().iter().find_map(|e| match e {
            WorldEvent::ExplosionSpawned { position, .. } => Some(*position),
            _ => None,
        });
        let position = explosion.expect("impact explosion");
        assert!((position.z - 99.0).abs() < 0.05, "{position:?}");
    }

    #[test]
    fn free_flight_moves_full_distance() {
        let mut w = world(&LevelData::corridor(1, 100.0, 100.0));
        let shot = w
            .spawn_body(Body::weapon(at(20.0), Vec3::new(0.0, 0.0, 30.0), 1.0, 10.0), CubeId(0))
            .unwrap();
        assert!(w.simulate_body(shot, 1.0).unwrap());
        assert!((w.body(shot).unwrap().position - at(50.0)).length() < 1e-4);
    }

    #[test]
    fn move_body_skips_drag() {
        let mut w = world(&LevelData::corridor(1, 100.0, 100.0));
        let drifting = Body::robot(at(20.0), 2.0).with_physics(PhysicsInfo {
            velocity: Vec3::new(0.0, 0.0, 30.0),
            mass: 4.0,
            drag: 1.0,
            ..PhysicsInfo::default()
        });
        let robot = w.spawn_body(drifting, CubeId(0)).unwrap();

        assert!(w.move_body(robot, 1.0).unwrap());
        let body = w.body(robot).unwrap();
        assert!((body.position - at(50.0)).length() < 1e-4);
        assert_eq!(body.velocity(), Vec3::new(0.0, 0.0, 30.0));

        assert!(w.simulate_body(robot, 0.5).unwrap());
        let body = w.body(robot).unwrap();
        assert!(body.velocity().z < 30.0);
        assert!(body.position.z > 50.0 && body.position.z < 65.0);
    }

    #[test]
    fn body_crosses_open_side_into_neighbour() {
        let mut w = world(&LevelData::corridor(2, 100.0, 100.0));
        let robot = w
            .spawn_body(
                Body::robot(at(80.0), 2.0).with_physics(PhysicsInfo {
                    velocity: Vec3::new(0.0, 0.0, 40.0),
                    mass: 4.0,
                    ..PhysicsInfo::default()
                }),
                CubeId(0),
            )
            .unwrap();
        assert!(w.simulate_body(robot, 1.0).unwrap());
        let body = w.body(robot).unwrap();
        assert_eq!(body.cube(), Some(CubeId(1)));
        assert!((body.position - at(120.0)).length() < 1e-3);
        assert!(w.cube(CubeId(0)).unwrap().bodies().is_empty());
        assert!(w.events().contains(&WorldEvent::BodyChangedCube {
            body: robot,
            from: CubeId(0),
            to: CubeId(1),
        }));
    }

    #[test]
    fn sliding_removes_normal_velocity() {
        let mut w = world(&LevelData::corridor(1, 100.0, 100.0));
        let robot = w
            .spawn_body(
                Body::robot(at(90.0), 2.0).with_physics(PhysicsInfo {
                    velocity: Vec3::new(10.0, 0.0, 20.0),
                    mass: 4.0,
                    ..PhysicsInfo::default()
                }),
                CubeId(0),
            )
            .unwrap();
        assert!(w.simulate_body(robot, 1.0).unwrap());
        let body = w.body(robot).unwrap();
        assert!(body.velocity().z.abs() < 1e-4);
        assert!((body.velocity().x - 10.0).abs() < 1e-4);
        assert!(w.cube(CubeId(0)).unwrap().is_point_inside(body.position));
        assert!(body.position.z <= 100.0 - 2.0);
    }

    #[test]
    fn bouncing_weapon_reflects_then_detonates() {
        let mut w = world(&LevelData::corridor(1, 100.0, 100.0));
        let shot = w
            .spawn_body(
                Body::weapon(at(50.0), Vec3::ZERO, 1.0, 10.0).with_physics(PhysicsInfo {
                    velocity: Vec3::new(0.0, 0.0, 60.0),
                    mass: 0.1,
                    flags: PhysicsFlags::BOUNCE,
                    ..PhysicsInfo::default()
                }),
                CubeId(0),
            )
            .unwrap();
        assert!(w.simulate_body(shot, 1.0).unwrap());
        let body = w.body(shot).unwrap();
        assert!(body.velocity().z < 0.0);
        assert_eq!(body.weapon_state().unwrap().bounces, 1);
        // Two more wall strikes exhaust the bounce allowance.
        w.simulate_body(shot, 2.0).unwrap();
        let alive = w.is_alive(shot) && w.simulate_body(shot, 2.0).unwrap();
        assert!(!alive);
    }

    #[test]
    fn transparent_texel_lets_weapons_through() {
        let mut level = LevelData::corridor(2, 100.0, 100.0);
        level.textures.insert(
            TextureId(7),
            TextureInfo {
                mask: Some(PixelMask {
                    width: 1,
                    height: 1,
                    pixels: vec![TRANSPARENT_INDEX],
                }),
                ..TextureInfo::default()
            },
        );
        let grate = SideSurface {
            texture: TextureId(7),
            ..SideSurface::default()
        };
        let mut surfaces = [SideSurface::default(); 6];
        surfaces[FRONT as usize] = grate;
        level.cubes[0].surfaces = Some(surfaces);
        level.walls.push(WallData::new(0, FRONT, 5));
        level.walls.push(WallData::new(1, BACK, 5));
        let mut w = world(&level);
        assert!(w.is_side_solid(SideId::new(CubeId(0), FRONT)));

        let shot = w
            .spawn_body(Body::weapon(at(80.0), Vec3::new(0.0, 0.0, 40.0), 1.0, 10.0), CubeId(0))
            .unwrap();
        assert!(w.simulate_body(shot, 1.0).unwrap());
        assert_eq!(w.body(shot).unwrap().cube(), Some(CubeId(1)));

        let robot = w
            .spawn_body(
                Body::robot(at(80.0), 2.0).with_physics(PhysicsInfo {
                    velocity: Vec3::new(0.0, 0.0, 40.0),
                    mass: 4.0,
                    ..PhysicsInfo::default()
                }),
                CubeId(0),
            )
            .unwrap();
        w.simulate_body(robot, 1.0).unwrap();
        assert_eq!(w.body(robot).unwrap().cube(), Some(CubeId(0)));
    }

    #[test]
    fn crossing_fires_wall_trigger() {
        let mut level = LevelData::corridor(3, 100.0, 100.0);
        level.walls.push(WallData {
            trigger: 0,
            ..WallData::new(0, FRONT, 4)
        });
        level.walls.push(WallData::new(1, FRONT, 2));
        level.walls.push(WallData::new(2, BACK, 2));
        level.triggers.push(TriggerData {
            kind: TriggerType::OpenDoor as u8,
            flags: 0,
            links: vec![(1, FRONT)],
            value: 0.0,
        });
        let mut w = world(&level);
        let player = w
            .spawn_body(
                Body::player(at(80.0), 2.0).with_physics(PhysicsInfo {
                    velocity: Vec3::new(0.0, 0.0, 40.0),
                    mass: 4.0,
                    ..PhysicsInfo::default()
                }),
                CubeId(0),
            )
            .unwrap();
        w.simulate_body(player, 1.0).unwrap();
        assert_eq!(w.body(player).unwrap().cube(), Some(CubeId(1)));
        assert_eq!(w.walls()[1].state, DoorState::Opening);
    }

    #[test]
    fn player_bump_opens_unlocked_door() {
        let mut level = LevelData::corridor(2, 100.0, 100.0);
        level.walls.push(WallData::new(0, FRONT, 2));
        level.walls.push(WallData::new(1, BACK, 2));
        let mut w = world(&level);
        let player = w
            .spawn_body(
                Body::player(at(90.0), 2.0).with_physics(PhysicsInfo {
                    velocity: Vec3::new(0.0, 0.0, 20.0),
                    mass: 4.0,
                    ..PhysicsInfo::default()
                }),
                CubeId(0),
            )
            .unwrap();
        w.simulate_body(player, 1.0).unwrap();
        assert_eq!(w.body(player).unwrap().cube(), Some(CubeId(0)));
        assert_eq!(w.walls()[0].state, DoorState::Opening);
    }

    #[test]
    fn weapon_damages_blastable_wall() {
        let mut level = LevelData::corridor(2, 100.0, 100.0);
        level.door_clips.push(DoorClip {
            frames: 3,
            play_time: 1.0,
            explodes: false,
        });
        for (cube, side) in [(0, FRONT), (1, BACK)] {
            level.walls.push(WallData {
                clip: 0,
                ..WallData::new(cube, side, 1)
            });
        }
        let mut w = world(&level);
        for _ in 0..2 {
            let shot = w
                .spawn_body(Body::weapon(at(50.0), Vec3::new(0.0, 0.0, 100.0), 1.0, 60.0), CubeId(0))
                .unwrap();
            w.simulate_body(shot, 1.0).unwrap();
        }
        assert!(w.walls()[0].is_blasted());
        assert!(w.exploding_walls().iter().all(|e: &ExplodingWall| e.wall != WallId(0)));
        assert!(!w.is_side_solid(SideId::new(CubeId(0), FRONT)));
    }

    #[test]
    fn destructible_overlay_is_swapped() {
        let mut level = LevelData::corridor(1, 100.0, 100.0);
        let mut table = TextureTable::new();
        table.insert(
            TextureId(3),
            TextureInfo {
                destroyed: Some(crate::surface::DestroyedOverlay {
                    texture: TextureId(4),
                    explodes: true,
                }),
                ..TextureInfo::default()
            },
        );
        level.textures = table;
        let mut surfaces = [SideSurface::default(); 6];
        surfaces[FRONT as usize].overlay = Some(TextureId(3));
        level.cubes[0].surfaces = Some(surfaces);
        let mut w = world(&level);
        let shot = w
            .spawn_body(Body::weapon(at(50.0), Vec3::new(0.0, 0.0, 100.0), 1.0, 10.0), CubeId(0))
            .unwrap();
        w.simulate_body(shot, 1.0).unwrap();
        let side = SideId::new(CubeId(0), FRONT);
        assert_eq!(w.side(side).unwrap().surface.overlay, Some(TextureId(4)));
        assert!(w.events().contains(&WorldEvent::TextureSwapped {
            side,
            texture: TextureId(4),
        }));
    }

    #[test]
    fn weapon_hits_robot_in_flight() {
        let mut w = world(&LevelData::corridor(1, 100.0, 100.0));
        let robot = w.spawn_body(Body::robot(at(70.0), 3.0), CubeId(0)).unwrap();
        let shot = w
            .spawn_body(Body::weapon(at(30.0), Vec3::new(0.0, 0.0, 100.0), 1.0, 500.0), CubeId(0))
            .unwrap();
        assert!(!w.simulate_body(shot, 1.0).unwrap());
        assert!(!w.is_alive(robot));
        assert!(!w.is_alive(shot));
        assert!(w.cube(CubeId(0)).unwrap().bodies().is_empty());
    }

    #[test]
    fn weapons_ignore_their_owner() {
        let mut w = world(&LevelData::corridor(1, 100.0, 100.0));
        let player = w.spawn_body(Body::player(at(50.0), 3.0), CubeId(0)).unwrap();
        let shot = w
            .spawn_body(
                Body::weapon(at(50.0), Vec3::new(0.0, 0.0, 20.0), 1.0, 10.0).with_owner(player),
                CubeId(0),
            )
            .unwrap();
        assert!(w.simulate_body(shot, 1.0).unwrap());
        assert!(w.is_alive(player));
        assert!((w.body(shot).unwrap().position - at(70.0)).length() < 1e-4);
    }

    #[test]
    fn player_collects_powerup_while_moving() {
        let mut w = world(&LevelData::corridor(1, 100.0, 100.0));
        let orb = w
            .spawn_body(
                Body::powerup(at(60.0), 1.0, crate::body::PowerupKind::Shield),
                CubeId(0),
            )
            .unwrap();
        let player = w
            .spawn_body(
                Body::player(at(40.0), 2.0).with_physics(PhysicsInfo {
                    velocity: Vec3::new(0.0, 0.0, 30.0),
                    mass: 4.0,
                    ..PhysicsInfo::default()
                }),
                CubeId(0),
            )
            .unwrap();
        assert!(w.simulate_body(player, 1.0).unwrap());
        assert!(!w.is_alive(orb));
        let body = w.body(player).unwrap();
        assert!((body.position - at(70.0)).length() < 1e-3);
        assert_eq!(body.kind, BodyType::Player);
    }

    #[test]
    fn step_never_visits_removed_bodies() {
        let mut w = world(&LevelData::corridor(1, 100.0, 100.0));
        // The weapon moves first and destroys the robot queued after it.
        w.spawn_body(Body::weapon(at(30.0), Vec3::new(0.0, 0.0, 100.0), 1.0, 500.0), CubeId(0))
            .unwrap();
        let robot = w.spawn_body(Body::robot(at(70.0), 3.0), CubeId(0)).unwrap();
        w.step(1.0);
        assert!(!w.is_alive(robot));
        assert_eq!(w.body_count(), 0);
        for cube in w.cubes() {
            for id in cube.bodies() {
                assert!(w.is_alive(*id));
            }
        }
    }

    #[test]
    fn spinning_bodies_only_rotate() {
        let mut w = world(&LevelData::corridor(1, 100.0, 100.0));
        let mut body = Body::new(BodyType::Clutter, at(50.0), 1.0);
        body.mover = Mover::Spinning(Vec3::new(0.0, 1.0, 0.0));
        let id = w.spawn_body(body, CubeId(0)).unwrap();
        w.simulate_body(id, 0.5).unwrap();
        let b = w.body(id).unwrap();
        assert_eq!(b.position, at(50.0));
        assert!(b.orientation.angle_between(glam::Quat::IDENTITY) > 0.4);
    }
}
