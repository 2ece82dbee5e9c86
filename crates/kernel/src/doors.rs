//! Wall animations: doors, cloaking walls and exploding walls.
//!
//! Every change is applied to both walls of a doorway so the two halves never
//! disagree, and is reported through the event log.

use cubeworld_common::WallId;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::event::{SoundEvent, WorldEvent};
use crate::wall::{DoorClip, DoorState, KeyFlags, Wall, WallFlags, WallType};
use crate::world::World;

/// Slack so that accumulated float timers still finish on the expected tick.
const TIMER_EPSILON: f32 = 1e-4;

/// Base size of fireballs thrown by an exploding wall.
const EXPLODING_WALL_FIREBALL_SIZE: f32 = 4.5;

/// A wall fading into or out of cloak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloakingWall {
    pub front: WallId,
    pub back: Option<WallId>,
    pub timer: f32,
}

/// A blasted wall working through its explosion timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplodingWall {
    pub wall: WallId,
    pub timer: f32,
    pub fireballs: u32,
}

impl World {
    fn clip_of(&self, wall: WallId) -> DoorClip {
        self.walls[wall.index()]
            .clip
            .and_then(|c| self.door_clips.get(c))
            .copied()
            .unwrap_or_default()
    }

    /// Apply `f` to `wall` and to the wall on the mirrored side.
    pub(crate) fn update_wall_pair(&mut self, wall: WallId, f: impl Fn(&mut Wall)) {
        let other = self.walls.get(wall.index()).and_then(|w| w.other);
        for id in std::iter::once(wall).chain(other) {
            if let Some(w) = self.walls.get_mut(id.index()) {
                f(w);
            }
        }
    }

    fn set_door_state(&mut self, wall: WallId, state: DoorState) {
        if self.walls[wall.index()].state == state {
            return;
        }
        self.update_wall_pair(wall, |w| w.state = state);
        tracing::debug!(wall = wall.0, ?state, "wall state");
        self.push_event(WorldEvent::WallStateChanged { wall, state });
    }

    fn set_door_frame(&mut self, wall: WallId, frame: u16) {
        if self.walls[wall.index()].frame == frame {
            return;
        }
        self.update_wall_pair(wall, |w| w.frame = frame);
        self.push_event(WorldEvent::WallFrameChanged { wall, frame });
    }

    fn set_door_timer(&mut self, wall: WallId, timer: f32) {
        self.update_wall_pair(wall, |w| w.timer = timer);
    }

    fn set_door_opened(&mut self, wall: WallId, opened: bool) {
        self.update_wall_pair(wall, |w| w.flags.set(WallFlags::DOOR_OPENED, opened));
    }

    fn wall_center(&self, wall: WallId) -> Vec3 {
        self.side(self.walls[wall.index()].side)
            .map(|s| s.corners.iter().copied().sum::<Vec3>() / 4.0)
            .unwrap_or(Vec3::ZERO)
    }

    fn play_sound(&mut self, sound: SoundEvent, position: Vec3) {
        self.push_event(WorldEvent::Sound { sound, position });
    }

    fn activate_door(&mut self, wall: WallId) {
        let other = self.walls[wall.index()].other;
        let active = self
            .active_doors
            .iter()
            .any(|&d| d == wall || Some(d) == other);
        if !active {
            self.active_doors.push(wall);
        }
    }

    /// Start opening a door (and its linked leaf). Returns whether anything changed.
    pub fn open_door(&mut self, wall: WallId) -> bool {
        let Some(w) = self.walls.get(wall.index()) else {
            return false;
        };
        if !w.is_door() {
            return false;
        }
        let (state, timer, linked) = (w.state, w.timer, w.linked);
        match state {
            DoorState::Closed => self.set_door_timer(wall, 0.0),
            DoorState::Closing => {
                let play_time = self.clip_of(wall).play_time;
                self.set_door_timer(wall, (play_time - timer).max(0.0));
            }
            _ => return false,
        }
        self.set_door_state(wall, DoorState::Opening);
        self.activate_door(wall);
        let center = self.wall_center(wall);
        self.play_sound(SoundEvent::DoorOpen, center);
        if let Some(linked) = linked {
            self.open_door(linked);
        }
        true
    }

    /// Start closing an open or opening door. Returns whether anything changed.
    pub fn close_door(&mut self, wall: WallId) -> bool {
        let Some(w) = self.walls.get(wall.index()) else {
            return false;
        };
        if !w.is_door() {
            return false;
        }
        let (state, timer, linked) = (w.state, w.timer, w.linked);
        match state {
            DoorState::Open | DoorState::Waiting => {
                if self.door_obstructed(wall) {
                    return false;
                }
                self.set_door_timer(wall, 0.0);
            }
            DoorState::Opening => {
                let play_time = self.clip_of(wall).play_time;
                self.set_door_timer(wall, (play_time - timer).max(0.0));
            }
            _ => return false,
        }
        self.set_door_state(wall, DoorState::Closing);
        self.activate_door(wall);
        let center = self.wall_center(wall);
        self.play_sound(SoundEvent::DoorClose, center);
        if let Some(linked) = linked {
            self.close_door(linked);
        }
        true
    }

    /// A body in either cube overlaps the doorway plane.
    fn door_obstructed(&self, wall: WallId) -> bool {
        let Some(side) = self.side(self.walls[wall.index()].side) else {
            return false;
        };
        let plane = side.triangles[0].plane;
        let cubes = std::iter::once(side.id.cube).chain(side.neighbor.cube());
        cubes
            .filter_map(|c| self.cube(c))
            .flat_map(|c| c.bodies().iter())
            .filter_map(|&id| self.body(id))
            .any(|b| {
                let inside = side
                    .triangles
                    .iter()
                    .any(|t| t.contains(t.plane.project(b.position)));
                plane.distance_to(b.position).abs() < b.radius && inside
            })
    }

    /// Advance one animating door. Returns `false` once it needs no more updates.
    pub fn update_door(&mut self, wall: WallId, frame_time: f32) -> bool {
        let Some(w) = self.walls.get(wall.index()) else {
            return false;
        };
        let clip = self.clip_of(wall);
        let (state, auto) = (w.state, w.flags.contains(WallFlags::DOOR_AUTO));
        let timer = w.timer + frame_time;
        self.set_door_timer(wall, timer);

        match state {
            DoorState::Opening => {
                self.set_door_frame(wall, clip.frame_at(timer));
                if timer >= clip.play_time * 0.5 {
                    self.set_door_opened(wall, true);
                }
                if timer + TIMER_EPSILON < clip.play_time {
                    return true;
                }
                self.set_door_frame(wall, clip.last_frame());
                self.set_door_opened(wall, true);
                if auto {
                    self.set_door_timer(wall, (timer - clip.play_time).max(0.0));
                    self.set_door_state(wall, DoorState::Waiting);
                    true
                } else {
                    self.set_door_timer(wall, 0.0);
                    self.set_door_state(wall, DoorState::Open);
                    false
                }
            }
            DoorState::Waiting => {
                let wait = self.config.door_wait_time;
                if timer + TIMER_EPSILON < wait {
                    return true;
                }
                if self.door_obstructed(wall) {
                    self.set_door_timer(wall, wait);
                    return true;
                }
                self.set_door_timer(wall, (timer - wait).max(0.0));
                self.set_door_state(wall, DoorState::Closing);
                let center = self.wall_center(wall);
                self.play_sound(SoundEvent::DoorClose, center);
                true
            }
            DoorState::Closing => {
                let remaining = (clip.play_time - timer).max(0.0);
                self.set_door_frame(wall, clip.frame_at(remaining));
                if timer >= clip.play_time * 0.5 {
                    self.set_door_opened(wall, false);
                }
                if timer + TIMER_EPSILON < clip.play_time {
                    return true;
                }
                self.set_door_opened(wall, false);
                self.set_door_frame(wall, 0);
                self.set_door_timer(wall, 0.0);
                self.set_door_state(wall, DoorState::Closed);
                false
            }
            _ => false,
        }
    }

    /// Advance every animating door, dropping the ones that finished.
    pub fn update_doors(&mut self, frame_time: f32) {
        let mut i = self.active_doors.len();
        while i > 0 {
            i -= 1;
            let wall = self.active_doors[i];
            if !self.update_door(wall, frame_time) {
                self.active_doors.swap_remove(i);
            }
        }
    }

    /// Open a door struck by a body carrying `keys`, or report it locked.
    pub(crate) fn wall_hit_process(&mut self, wall: WallId, keys: KeyFlags, position: Vec3) -> bool {
        let Some(w) = self.walls.get(wall.index()) else {
            return false;
        };
        if !w.is_door() {
            return false;
        }
        if w.is_locked() || !w.accepts_keys(keys) {
            self.play_sound(SoundEvent::DoorLocked, position);
            return false;
        }
        match w.state {
            DoorState::Closed | DoorState::Closing => self.open_door(wall),
            _ => false,
        }
    }

    // --- Cloaking ---

    fn cloak_entry(&self, wall: WallId) -> Option<usize> {
        self.cloaking_walls
            .iter()
            .position(|c| c.front == wall || c.back == Some(wall))
    }

    /// Begin fading a closed wall out. Returns whether anything changed.
    pub fn start_cloak(&mut self, wall: WallId) -> bool {
        let Some(w) = self.walls.get(wall.index()) else {
            return false;
        };
        let (state, kind, other) = (w.state, w.kind, w.other);
        match state {
            DoorState::Cloaking => return false,
            DoorState::Decloaking => {
                let cloak_time = self.config.cloak_time;
                if let Some(i) = self.cloak_entry(wall) {
                    let entry = &mut self.cloaking_walls[i];
                    entry.timer = (cloak_time - entry.timer).max(0.0);
                }
            }
            _ => {
                if !matches!(kind, WallType::Closed | WallType::Cloaked) {
                    return false;
                }
                self.update_wall_pair(wall, |w| {
                    w.kind = WallType::Cloaked;
                    w.cloak_value = 0.0;
                });
                self.cloaking_walls.push(CloakingWall {
                    front: wall,
                    back: other,
                    timer: 0.0,
                });
            }
        }
        self.set_door_state(wall, DoorState::Cloaking);
        let center = self.wall_center(wall);
        self.play_sound(SoundEvent::CloakOn, center);
        true
    }

    /// Begin fading an open (or cloaking) wall back in. Returns whether anything changed.
    pub fn start_decloak(&mut self, wall: WallId) -> bool {
        let Some(w) = self.walls.get(wall.index()) else {
            return false;
        };
        let (state, kind, other) = (w.state, w.kind, w.other);
        match state {
            DoorState::Decloaking => return false,
            DoorState::Cloaking => {
                let cloak_time = self.config.cloak_time;
                if let Some(i) = self.cloak_entry(wall) {
                    let entry = &mut self.cloaking_walls[i];
                    entry.timer = (cloak_time - entry.timer).max(0.0);
                }
            }
            _ => {
                if !matches!(kind, WallType::Open | WallType::Cloaked) {
                    return false;
                }
                self.update_wall_pair(wall, |w| {
                    w.kind = WallType::Cloaked;
                    w.cloak_value = 1.0;
                });
                self.cloaking_walls.push(CloakingWall {
                    front: wall,
                    back: other,
                    timer: 0.0,
                });
            }
        }
        self.set_door_state(wall, DoorState::Decloaking);
        let center = self.wall_center(wall);
        self.play_sound(SoundEvent::CloakOff, center);
        true
    }

    pub fn update_cloaking_walls(&mut self, frame_time: f32) {
        let cloak_time = self.config.cloak_time;
        let mut i = self.cloaking_walls.len();
        while i > 0 {
            i -= 1;
            let entry = &mut self.cloaking_walls[i];
            entry.timer += frame_time;
            let (front, timer) = (entry.front, entry.timer);
            let progress = if cloak_time > 0.0 {
                (timer / cloak_time).min(1.0)
            } else {
                1.0
            };
            let finished = timer + TIMER_EPSILON >= cloak_time;
            match self.walls[front.index()].state {
                DoorState::Cloaking if finished => {
                    self.update_wall_pair(front, |w| {
                        w.kind = WallType::Open;
                        w.cloak_value = 1.0;
                    });
                    self.set_door_state(front, DoorState::Open);
                }
                DoorState::Cloaking => self.update_wall_pair(front, |w| w.cloak_value = progress),
                DoorState::Decloaking if finished => {
                    self.update_wall_pair(front, |w| {
                        w.kind = WallType::Closed;
                        w.cloak_value = 0.0;
                    });
                    self.set_door_state(front, DoorState::Closed);
                }
                DoorState::Decloaking => {
                    self.update_wall_pair(front, |w| w.cloak_value = 1.0 - progress)
                }
                // Something else took over the wall.
                _ => {
                    self.cloaking_walls.swap_remove(i);
                    continue;
                }
            }
            if finished {
                self.cloaking_walls.swap_remove(i);
            }
        }
    }

    // --- Blastable walls ---

    fn is_exploding(&self, wall: WallId) -> bool {
        let other = self.walls[wall.index()].other;
        self.exploding_walls
            .iter()
            .any(|e| e.wall == wall || Some(e.wall) == other)
    }

    /// Apply weapon damage to a blastable wall. Returns whether it was blasted.
    pub fn damage_wall(&mut self, wall: WallId, amount: f32) -> bool {
        let Some(w) = self.walls.get(wall.index()) else {
            return false;
        };
        if w.kind != WallType::Blastable || w.is_blasted() || self.is_exploding(wall) {
            return false;
        }
        let hit_points = w.hit_points - amount;
        self.update_wall_pair(wall, |w| w.hit_points = hit_points);
        if hit_points <= 0.0 {
            self.blast_wall(wall);
            return true;
        }
        let clip = self.clip_of(wall);
        let max = self.config.wall_hit_points;
        let damage = if max > 0.0 {
            (1.0 - hit_points / max).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let frame = ((damage * clip.last_frame() as f32) as u16).min(clip.frames.saturating_sub(2));
        if frame > self.walls[wall.index()].frame {
            self.set_door_frame(wall, frame);
        }
        false
    }

    /// Destroy a blastable wall outright.
    pub fn blast_wall(&mut self, wall: WallId) {
        let Some(w) = self.walls.get(wall.index()) else {
            return;
        };
        if w.kind != WallType::Blastable || w.is_blasted() || self.is_exploding(wall) {
            return;
        }
        self.update_wall_pair(wall, |w| w.hit_points = 0.0);
        let clip = self.clip_of(wall);
        if clip.explodes {
            tracing::debug!(wall = wall.0, "wall exploding");
            self.exploding_walls.push(ExplodingWall {
                wall,
                timer: 0.0,
                fireballs: 0,
            });
            let center = self.wall_center(wall);
            self.play_sound(SoundEvent::WallExplode, center);
        } else {
            self.finish_blast(wall, clip);
        }
    }

    fn finish_blast(&mut self, wall: WallId, clip: DoorClip) {
        self.update_wall_pair(wall, |w| w.flags.insert(WallFlags::BLASTED));
        self.set_door_frame(wall, clip.last_frame());
        self.push_event(WorldEvent::WallBlasted { wall });
    }

    /// Advance exploding walls: fireballs spread over the timeline, the wall
    /// opens half-way through.
    pub fn update_exploding_walls(&mut self, frame_time: f32) {
        let total = self.config.exploding_wall_time;
        let count = self.config.exploding_wall_fireballs;
        let mut i = self.exploding_walls.len();
        while i > 0 {
            i -= 1;
            self.exploding_walls[i].timer += frame_time;
            let ExplodingWall { wall, timer, .. } = self.exploding_walls[i];
            let progress = if total > 0.0 { (timer / total).min(1.0) } else { 1.0 };

            if progress >= 0.5 && !self.walls[wall.index()].is_blasted() {
                let clip = self.clip_of(wall);
                self.finish_blast(wall, clip);
            }

            let target = (progress * count as f32) as u32;
            while self.exploding_walls[i].fireballs < target {
                self.exploding_walls[i].fireballs += 1;
                self.emit_wall_fireball(wall, progress);
            }

            if progress >= 1.0 {
                self.exploding_walls.swap_remove(i);
            }
        }
    }

    fn emit_wall_fireball(&mut self, wall: WallId, progress: f32) {
        let (pick, r1, r2, scale) = (
            self.random_unit(),
            self.random_unit(),
            self.random_unit(),
            self.random_unit(),
        );
        let Some(side) = self.side(self.walls[wall.index()].side) else {
            return;
        };
        let triangle = side.triangles[usize::from(pick >= 0.5)];
        let [a, b, c] = triangle.vertices;
        let s = r1.sqrt();
        let point = a * (1.0 - s) + b * (s * (1.0 - r2)) + c * (s * r2);
        let size = EXPLODING_WALL_FIREBALL_SIZE * (0.5 + 0.5 * scale) * (1.0 - 0.5 * progress);
        let position = point + triangle.normal() * (size * 0.5);
        let cube = side.id.cube;
        self.push_event(WorldEvent::ExplosionSpawned {
            cube,
            position,
            size,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::config::SimConfig;
    use crate::cube::{BACK, FRONT};
    use crate::level::{LevelData, WallData};
    use cubeworld_common::CubeId;

    const FT: f32 = 0.25;

    fn door_world(flags: WallFlags) -> World {
        let mut level = LevelData::corridor(2, 100.0, 100.0);
        level.door_clips.push(DoorClip {
            frames: 5,
            play_time: 1.0,
            explodes: false,
        });
        for (cube, side) in [(0, FRONT), (1, BACK)] {
            level.walls.push(WallData {
                flags: flags.bits(),
                clip: 0,
                ..WallData::new(cube, side, 2)
            });
        }
        World::build(&level, SimConfig::default()).unwrap()
    }

    fn blast_world(explodes: bool) -> World {
        let mut level = LevelData::corridor(2, 100.0, 100.0);
        level.door_clips.push(DoorClip {
            frames: 5,
            play_time: 1.0,
            explodes,
        });
        for (cube, side) in [(0, FRONT), (1, BACK)] {
            level.walls.push(WallData {
                clip: 0,
                ..WallData::new(cube, side, 1)
            });
        }
        World::build(&level, SimConfig::default()).unwrap()
    }

    #[test]
    fn auto_door_full_cycle() {
        let mut world = door_world(WallFlags::DOOR_AUTO);
        let door = WallId(0);
        assert!(world.is_side_solid(world.walls()[0].side));
        assert!(world.open_door(door));
        assert_eq!(world.active_doors(), &[door]);

        let mut opened_at = None;
        for call in 1..=4 {
            world.update_doors(FT);
            if opened_at.is_none() && world.walls()[0].is_door_opened() {
                opened_at = Some(call);
            }
        }
        assert_eq!(opened_at, Some(2));
        assert_eq!(world.walls()[0].state, DoorState::Waiting);
        assert_eq!(world.walls()[1].state, DoorState::Waiting);
        assert_eq!(world.walls()[0].frame, 4);
        assert!(!world.is_side_solid(world.walls()[1].side));

        for _ in 0..20 {
            world.update_doors(FT);
        }
        assert_eq!(world.walls()[0].state, DoorState::Closing);
        for _ in 0..4 {
            world.update_doors(FT);
        }
        assert_eq!(world.walls()[0].state, DoorState::Closed);
        assert_eq!(world.walls()[1].state, DoorState::Closed);
        assert_eq!(world.walls()[0].frame, 0);
        assert!(!world.walls()[0].is_door_opened());
        assert!(world.active_doors().is_empty());
        assert!(world.is_side_solid(world.walls()[0].side));
    }

    #[test]
    fn manual_door_stays_open() {
        let mut world = door_world(WallFlags::empty());
        world.open_door(WallId(1));
        for _ in 0..4 {
            world.update_doors(FT);
        }
        assert_eq!(world.walls()[0].state, DoorState::Open);
        assert!(world.active_doors().is_empty());
        assert!(world.close_door(WallId(0)));
        for _ in 0..4 {
            world.update_doors(FT);
        }
        assert_eq!(world.walls()[1].state, DoorState::Closed);
    }

    #[test]
    fn reopening_mid_close_keeps_timeline() {
        let mut world = door_world(WallFlags::empty());
        world.open_door(WallId(0));
        for _ in 0..4 {
            world.update_doors(FT);
        }
        world.close_door(WallId(0));
        world.update_doors(FT);
        assert!((world.walls()[0].timer() - 0.25).abs() < 1e-5);
        assert!(world.open_door(WallId(0)));
        assert!((world.walls()[0].timer() - 0.75).abs() < 1e-5);
        world.update_doors(FT);
        assert_eq!(world.walls()[0].state, DoorState::Open);
    }

    #[test]
    fn open_door_ignores_open_and_non_doors() {
        let mut world = door_world(WallFlags::empty());
        world.open_door(WallId(0));
        assert!(!world.open_door(WallId(0)));
        let mut blast = blast_world(false);
        assert!(!blast.open_door(WallId(0)));
    }

    #[test]
    fn obstruction_holds_door_open() {
        let mut world = door_world(WallFlags::DOOR_AUTO);
        world.open_door(WallId(0));
        for _ in 0..4 {
            world.update_doors(FT);
        }
        // Straddling the doorway plane at z = 100.
        world
            .spawn_body(Body::hostage(Vec3::new(0.0, 0.0, 99.0), 3.0), CubeId(0))
            .unwrap();
        for _ in 0..40 {
            world.update_doors(FT);
        }
        assert_eq!(world.walls()[0].state, DoorState::Waiting);
    }

    #[test]
    fn locked_door_rejects_bump() {
        let mut world = door_world(WallFlags::DOOR_LOCKED);
        assert!(!world.wall_hit_process(WallId(0), KeyFlags::all(), Vec3::ZERO));
        assert!(world.events().iter().any(|e| matches!(
            e,
            WorldEvent::Sound {
                sound: SoundEvent::DoorLocked,
                ..
            }
        )));
        let mut keyed = door_world(WallFlags::empty());
        keyed.walls[0].keys = KeyFlags::RED;
        assert!(!keyed.wall_hit_process(WallId(0), KeyFlags::BLUE, Vec3::ZERO));
        assert!(keyed.wall_hit_process(WallId(0), KeyFlags::RED | KeyFlags::BLUE, Vec3::ZERO));
    }

    #[test]
    fn cloak_and_decloak() {
        let mut level = LevelData::corridor(2, 100.0, 100.0);
        level.walls.push(WallData::new(0, FRONT, 5));
        level.walls.push(WallData::new(1, BACK, 5));
        let mut world = World::build(&level, SimConfig::default()).unwrap();

        assert!(world.start_cloak(WallId(0)));
        assert!(!world.start_cloak(WallId(0)));
        world.update_cloaking_walls(0.5);
        assert!((world.walls()[1].cloak_value - 0.5).abs() < 1e-5);
        world.update_cloaking_walls(0.5);
        assert_eq!(world.walls()[0].kind, WallType::Open);
        assert!(world.cloaking_walls().is_empty());
        assert!(!world.is_side_solid(world.walls()[0].side));

        assert!(world.start_decloak(WallId(1)));
        world.update_cloaking_walls(1.0);
        assert_eq!(world.walls()[0].kind, WallType::Closed);
        assert_eq!(world.walls()[0].state, DoorState::Closed);
        assert!(world.is_side_solid(world.walls()[0].side));
    }

    #[test]
    fn damage_advances_frames_then_blasts() {
        let mut world = blast_world(false);
        assert!(!world.damage_wall(WallId(0), 50.0));
        assert_eq!(world.walls()[0].frame, 2);
        assert_eq!(world.walls()[1].hit_points, 50.0);
        assert!(world.damage_wall(WallId(1), 60.0));
        assert!(world.walls()[0].is_blasted());
        assert_eq!(world.walls()[0].frame, 4);
        assert!(!world.is_side_solid(world.walls()[0].side));
        assert!(!world.damage_wall(WallId(0), 10.0));
    }

    #[test]
    fn exploding_wall_timeline() {
        let mut world = blast_world(true);
        world.blast_wall(WallId(0));
        assert_eq!(world.exploding_walls().len(), 1);
        assert!(!world.walls()[0].is_blasted());
        world.update_exploding_walls(0.25);
        assert!(!world.walls()[0].is_blasted());
        world.update_exploding_walls(0.25);
        assert!(world.walls()[0].is_blasted());
        world.update_exploding_walls(0.5);
        assert!(world.exploding_walls().is_empty());
        let fireballs = world
            .events()
            .iter()
            .filter(|e| matches!(e, WorldEvent::ExplosionSpawned { .. }))
            .count();
        assert_eq!(fireballs, SimConfig::default().exploding_wall_fireballs as usize);
    }
}
