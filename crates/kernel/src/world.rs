use cubeworld_common::{BodyId, CubeId, SideId, TriggerId, WallId};
use glam::Vec3;

use crate::body::{Body, Mover};
use crate::collide::CollisionTable;
use crate::config::SimConfig;
use crate::cube::{Cube, DoorwayFlags, Side};
use crate::doors::{CloakingWall, ExplodingWall};
use crate::error::SimError;
use crate::event::WorldEvent;
use crate::surface::SurfaceLookup;
use crate::trigger::Trigger;
use crate::wall::{DoorClip, Wall};

#[derive(Debug, Clone, Default)]
struct BodySlot {
    generation: u32,
    body: Option<Body>,
}

/// The authoritative world state.
///
/// Owns the cube graph, walls, triggers and the body arena, plus the lists of
/// walls mid-transition. All mutations go through explicit operations and are
/// recorded in an append-only event log that render/audio layers drain once
/// per frame.
#[derive(Debug)]
pub struct World {
    pub(crate) cubes: Vec<Cube>,
    pub(crate) walls: Vec<Wall>,
    pub(crate) triggers: Vec<Trigger>,
    pub(crate) door_clips: Vec<DoorClip>,
    slots: Vec<BodySlot>,
    free_slots: Vec<u32>,
    pub(crate) active_doors: Vec<WallId>,
    pub(crate) cloaking_walls: Vec<CloakingWall>,
    pub(crate) exploding_walls: Vec<ExplodingWall>,
    pub(crate) surfaces: Box<dyn SurfaceLookup>,
    pub(crate) collisions: CollisionTable,
    pub(crate) config: SimConfig,
    tick: u64,
    /// Seed for deterministic RNG. Advanced each step for reproducibility.
    seed: u64,
    rng: u64,
    time: f32,
    /// Append-only event log of all mutations.
    event_log: Vec<WorldEvent>,
}

impl World {
    pub(crate) fn from_parts(
        cubes: Vec<Cube>,
        walls: Vec<Wall>,
        triggers: Vec<Trigger>,
        door_clips: Vec<DoorClip>,
        surfaces: Box<dyn SurfaceLookup>,
        config: SimConfig,
    ) -> Self {
        Self {
            cubes,
            walls,
            triggers,
            door_clips,
            slots: Vec::new(),
            free_slots: Vec::new(),
            active_doors: Vec::new(),
            cloaking_walls: Vec::new(),
            exploding_walls: Vec::new(),
            surfaces,
            collisions: CollisionTable::standard(),
            config,
            tick: 0,
            seed: 0,
            rng: 0,
            time: 0.0,
            event_log: Vec::new(),
        }
    }

    /// Reseed the world RNG for deterministic replay.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = seed;
        self
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current RNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Game time in seconds accumulated over all steps.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn surfaces(&self) -> &dyn SurfaceLookup {
        self.surfaces.as_ref()
    }

    /// Replace the collision-handler table.
    pub fn set_collision_table(&mut self, table: CollisionTable) {
        self.collisions = table;
    }

    pub fn collision_table(&self) -> &CollisionTable {
        &self.collisions
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    pub(crate) fn push_event(&mut self, event: WorldEvent) {
        self.event_log.push(event);
    }

    // --- Cell graph ---

    pub fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    pub fn cube(&self, id: CubeId) -> Option<&Cube> {
        self.cubes.get(id.index())
    }

    pub fn side(&self, id: SideId) -> Option<&Side> {
        self.cube(id.cube).and_then(|c| c.sides.get(id.side as usize))
    }

    pub(crate) fn side_mut(&mut self, id: SideId) -> Option<&mut Side> {
        self.cubes
            .get_mut(id.cube.index())
            .and_then(|c| c.sides.get_mut(id.side as usize))
    }

    pub fn doorway_flags(&self, id: SideId) -> DoorwayFlags {
        self.side(id)
            .map(|s| s.doorway_flags(&self.walls, self.surfaces.as_ref()))
            .unwrap_or_default()
    }

    pub fn is_side_solid(&self, id: SideId) -> bool {
        !self.doorway_flags(id).contains(DoorwayFlags::FLY)
    }

    /// Install the visibility set computed by an external worker.
    pub fn set_visible_neighbors(&mut self, cube: CubeId, visible: Vec<CubeId>) -> Result<(), SimError> {
        let c = self
            .cubes
            .get_mut(cube.index())
            .ok_or(SimError::UnknownCube(cube))?;
        c.set_visible(visible);
        Ok(())
    }

    /// Locate the cube containing `pos`, trying `hint` and its neighbours first.
    pub fn find_cube(&self, pos: Vec3, hint: Option<CubeId>) -> Option<CubeId> {
        if let Some(hint) = hint.and_then(|h| self.cube(h)) {
            if hint.is_point_inside(pos) {
                return Some(hint.id);
            }
            for side in &hint.sides {
                if let Some(n) = side.neighbor.cube().and_then(|n| self.cube(n)) {
                    if n.is_point_inside(pos) {
                        return Some(n.id);
                    }
                }
            }
        }
        self.cubes
            .iter()
            .find(|c| c.is_point_inside(pos))
            .map(|c| c.id)
    }

    // --- Walls and triggers ---

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.get(id.index())
    }

    pub fn wall_on(&self, side: SideId) -> Option<WallId> {
        self.side(side).and_then(|s| s.wall)
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn trigger(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.get(id.index())
    }

    pub fn door_clip(&self, index: usize) -> Option<&DoorClip> {
        self.door_clips.get(index)
    }

    /// Doors currently animating, updated once per tick.
    pub fn active_doors(&self) -> &[WallId] {
        &self.active_doors
    }

    pub fn cloaking_walls(&self) -> &[CloakingWall] {
        &self.cloaking_walls
    }

    pub fn exploding_walls(&self) -> &[ExplodingWall] {
        &self.exploding_walls
    }

    // --- Bodies ---

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.body.as_ref())
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.body.as_mut())
    }

    pub fn is_alive(&self, id: BodyId) -> bool {
        self.body(id).is_some()
    }

    /// Live bodies in arena order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.body
                .as_ref()
                .map(|b| (BodyId::new(i as u32, s.generation), b))
        })
    }

    pub fn body_count(&self) -> usize {
        self.slots.iter().filter(|s| s.body.is_some()).count()
    }

    /// Place a body into the arena and link it into `cube`.
    pub fn spawn_body(&mut self, body: Body, cube: CubeId) -> Result<BodyId, SimError> {
        if self.cube(cube).is_none() {
            return Err(SimError::UnknownCube(cube));
        }
        let id = match self.free_slots.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.body = Some(body);
                BodyId::new(index, slot.generation)
            }
            None => {
                self.slots.push(BodySlot {
                    generation: 0,
                    body: Some(body),
                });
                BodyId::new(self.slots.len() as u32 - 1, 0)
            }
        };
        if let Some(b) = self.body_mut(id) {
            b.cube = None;
        }
        self.link(id, cube)?;
        tracing::trace!(%id, %cube, "body spawned");
        self.event_log.push(WorldEvent::BodySpawned { body: id, cube });
        Ok(id)
    }

    /// Unlink and free a body. Returns it if it was alive.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        if !self.is_alive(id) {
            return None;
        }
        self.unlink(id).ok()?;
        let slot = self.slots.get_mut(id.index as usize)?;
        let body = slot.body.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(id.index);
        tracing::trace!(%id, "body removed");
        self.event_log.push(WorldEvent::BodyRemoved { body: id });
        body
    }

    /// Move a body's membership to `cube`, leaving its previous cube's list dense.
    pub fn link(&mut self, id: BodyId, cube: CubeId) -> Result<(), SimError> {
        if self.cube(cube).is_none() {
            return Err(SimError::UnknownCube(cube));
        }
        self.unlink(id)?;
        let list = &mut self.cubes[cube.index()].bodies;
        let slot = list.len();
        list.push(id);
        let body = self.body_mut(id).ok_or(SimError::DeadBody(id))?;
        body.cube = Some(cube);
        body.slot = slot;
        Ok(())
    }

    /// Remove a body from its cube's list by swapping the last entry into its slot.
    pub fn unlink(&mut self, id: BodyId) -> Result<(), SimError> {
        let body = self.body_mut(id).ok_or(SimError::DeadBody(id))?;
        let Some(cube) = body.cube.take() else {
            return Ok(());
        };
        let slot = body.slot;
        let list = &mut self.cubes[cube.index()].bodies;
        if slot < list.len() && list[slot] == id {
            list.swap_remove(slot);
            if let Some(&moved) = list.get(slot) {
                if let Some(b) = self.body_mut(moved) {
                    b.slot = slot;
                }
            }
        }
        Ok(())
    }

    /// Uniform sample in `[0, 1)` from the world's deterministic stream.
    pub(crate) fn random_unit(&mut self) -> f32 {
        self.rng = splitmix64(self.rng);
        (self.rng >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Advance the simulation by one tick of `frame_time` seconds.
    ///
    /// Doors and cloaking walls advance first, then exploding walls, then
    /// every moving body in arena order.
    pub fn step(&mut self, frame_time: f32) {
        let _span = tracing::debug_span!("world_step", tick = self.tick + 1).entered();
        self.tick += 1;
        self.time += frame_time;
        // Mix the seed with splitmix64 so replay stays reproducible across
        // platforms without depending on floating-point ordering.
        self.seed = splitmix64(self.seed);

        self.update_doors(frame_time);
        self.update_cloaking_walls(frame_time);
        self.update_exploding_walls(frame_time);

        let movers: Vec<BodyId> = self
            .bodies()
            .filter(|(_, b)| !matches!(b.mover, Mover::None))
            .map(|(id, _)| id)
            .collect();
        for id in movers {
            // Bodies removed earlier this tick are skipped.
            if self.is_alive(id) {
                if let Err(err) = self.simulate_body(id, frame_time) {
                    tracing::warn!(%id, %err, "body move failed");
                }
            }
        }

        self.event_log.push(WorldEvent::Stepped {
            tick: self.tick,
            seed: self.seed,
        });
    }
}

/// Splitmix64 ... a fast, high-quality deterministic PRNG step function.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
