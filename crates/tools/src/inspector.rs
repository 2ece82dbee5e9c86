use std::collections::BTreeMap;

use cubeworld_common::{BodyId, CubeId};
use cubeworld_kernel::{BodyType, DoorState, World, WorldEvent};
use glam::Vec3;

/// World inspector for developer tooling.
///
/// Read-only queries against the world state for debugging and the CLI.
pub struct WorldInspector;

impl WorldInspector {
    /// Produce a summary of the world state.
    pub fn summary(world: &World) -> WorldSummary {
        WorldSummary {
            tick: world.tick(),
            seed: world.seed(),
            time: world.time(),
            cube_count: world.cubes().len(),
            wall_count: world.walls().len(),
            trigger_count: world.triggers().len(),
            body_count: world.body_count(),
            active_doors: world.active_doors().len(),
            cloaking_walls: world.cloaking_walls().len(),
            exploding_walls: world.exploding_walls().len(),
            pending_events: world.events().len(),
        }
    }

    pub fn inspect_body(world: &World, id: BodyId) -> Option<BodyInfo> {
        world.body(id).map(|body| BodyInfo {
            id,
            kind: body.kind,
            cube: body.cube(),
            position: body.position,
            velocity: body.velocity(),
            radius: body.radius,
            shields: body.shields,
        })
    }

    pub fn inspect_cube(world: &World, id: CubeId) -> Option<CubeInfo> {
        let cube = world.cube(id)?;
        let neighbors = cube
            .sides
            .iter()
            .filter_map(|side| side.neighbor.cube().map(|n| (side.id.side, n)))
            .collect();
        let solid_sides = cube
            .sides
            .iter()
            .filter(|side| world.is_side_solid(side.id))
            .count();
        let doors = cube
            .sides
            .iter()
            .filter_map(|side| side.wall)
            .filter_map(|w| world.wall(w))
            .map(|wall| (wall.side.side, wall.state))
            .collect();
        Some(CubeInfo {
            id,
            center: cube.center,
            neighbors,
            solid_sides,
            doors,
            bodies: cube.bodies().to_vec(),
        })
    }

    /// Live bodies in arena order.
    pub fn list_bodies(world: &World) -> Vec<BodyId> {
        world.bodies().map(|(id, _)| id).collect()
    }

    /// Pending events grouped by variant name.
    pub fn event_counts(world: &World) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for event in world.events() {
            *counts.entry(event_name(event)).or_insert(0) += 1;
        }
        counts
    }
}

pub fn event_name(event: &WorldEvent) -> &'static str {
    match event {
        WorldEvent::Stepped { .. } => "stepped",
        WorldEvent::WallStateChanged { .. } => "wall_state_changed",
        WorldEvent::WallFrameChanged { .. } => "wall_frame_changed",
        WorldEvent::WallBlasted { .. } => "wall_blasted",
        WorldEvent::TextureSwapped { .. } => "texture_swapped",
        WorldEvent::ExplosionSpawned { .. } => "explosion_spawned",
        WorldEvent::Sound { .. } => "sound",
        WorldEvent::TriggerFired { .. } => "trigger_fired",
        WorldEvent::BodySpawned { .. } => "body_spawned",
        WorldEvent::BodyRemoved { .. } => "body_removed",
        WorldEvent::BodyChangedCube { .. } => "body_changed_cube",
        WorldEvent::HostageRescued { .. } => "hostage_rescued",
        WorldEvent::PowerupConsumed { .. } => "powerup_consumed",
        WorldEvent::ReactorDestroyed { .. } => "reactor_destroyed",
        WorldEvent::LevelExit { .. } => "level_exit",
    }
}

/// Summary of world state for the inspector.
#[derive(Debug, Clone)]
pub struct WorldSummary {
    pub tick: u64,
    pub seed: u64,
    pub time: f32,
    pub cube_count: usize,
    pub wall_count: usize,
    pub trigger_count: usize,
    pub body_count: usize,
    pub active_doors: usize,
    pub cloaking_walls: usize,
    pub exploding_walls: usize,
    pub pending_events: usize,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "World: tick={} seed={} time={:.2}s cubes={} walls={} triggers={} bodies={} \
             doors_active={} cloaking={} exploding={} pending_events={}",
            self.tick,
            self.seed,
            self.time,
            self.cube_count,
            self.wall_count,
            self.trigger_count,
            self.body_count,
            self.active_doors,
            self.cloaking_walls,
            self.exploding_walls,
            self.pending_events
        )
    }
}

/// Snapshot of a single body.
#[derive(Debug, Clone)]
pub struct BodyInfo {
    pub id: BodyId,
    pub kind: BodyType,
    pub cube: Option<CubeId>,
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    pub shields: f32,
}

impl std::fmt::Display for BodyInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cube = self.cube.map_or_else(|| "-".to_string(), |c| c.to_string());
        write!(
            f,
            "Body {} {:?} in {} pos=({:.2}, {:.2}, {:.2}) vel=({:.2}, {:.2}, {:.2}) r={:.2} shields={:.1}",
            self.id,
            self.kind,
            cube,
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
            self.radius,
            self.shields,
        )
    }
}

/// Snapshot of a single cube and its doorways.
#[derive(Debug, Clone)]
pub struct CubeInfo {
    pub id: CubeId,
    pub center: Vec3,
    /// `(side, neighbor)` for every connected side.
    pub neighbors: Vec<(u8, CubeId)>,
    pub solid_sides: usize,
    /// `(side, state)` for every side carrying a wall.
    pub doors: Vec<(u8, DoorState)>,
    pub bodies: Vec<BodyId>,
}

impl std::fmt::Display for CubeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cube {} center=({:.2}, {:.2}, {:.2}) neighbors={} solid={} walls={} bodies={}",
            self.id,
            self.center.x,
            self.center.y,
            self.center.z,
            self.neighbors.len(),
            self.solid_sides,
            self.doors.len(),
            self.bodies.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubeworld_kernel::cube::{BACK, FRONT};
    use cubeworld_kernel::{Body, LevelData, SimConfig, WallData};

    fn corridor(n: usize) -> World {
        World::build(&LevelData::corridor(n, 100.0, 100.0), SimConfig::default()).unwrap()
    }

    #[test]
    fn summary_empty_corridor() {
        let world = corridor(3);
        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.tick, 0);
        assert_eq!(summary.cube_count, 3);
        assert_eq!(summary.body_count, 0);
        assert_eq!(summary.pending_events, 0);
    }

    #[test]
    fn summary_after_step() {
        let mut world = corridor(2);
        world
            .spawn_body(Body::robot(Vec3::new(0.0, 0.0, 50.0), 5.0), CubeId(0))
            .unwrap();
        world.step(0.1);

        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.body_count, 1);
        let counts = WorldInspector::event_counts(&world);
        assert_eq!(counts.get("body_spawned"), Some(&1));
        assert_eq!(counts.get("stepped"), Some(&1));
    }

    #[test]
    fn inspect_body_found_and_missing() {
        let mut world = corridor(1);
        let id = world
            .spawn_body(Body::robot(Vec3::new(1.0, 2.0, 30.0), 5.0), CubeId(0))
            .unwrap();
        let info = WorldInspector::inspect_body(&world, id).unwrap();
        assert_eq!(info.position, Vec3::new(1.0, 2.0, 30.0));
        assert_eq!(info.cube, Some(CubeId(0)));
        assert_eq!(info.kind, BodyType::Robot);

        world.remove_body(id);
        assert!(WorldInspector::inspect_body(&world, id).is_none());
        assert!(WorldInspector::list_bodies(&world).is_empty());
    }

    #[test]
    fn inspect_cube_reports_doorways() {
        let mut level = LevelData::corridor(3, 100.0, 100.0);
        level.walls.push(WallData::new(1, FRONT, 5));
        level.walls.push(WallData::new(2, BACK, 5));
        let world = World::build(&level, SimConfig::default()).unwrap();

        let middle = WorldInspector::inspect_cube(&world, CubeId(1)).unwrap();
        assert_eq!(middle.neighbors, vec![(BACK, CubeId(0)), (FRONT, CubeId(2))]);
        // Four boundary sides plus the closed wall.
        assert_eq!(middle.solid_sides, 5);
        assert_eq!(middle.doors, vec![(FRONT, DoorState::Closed)]);
        assert!(WorldInspector::inspect_cube(&world, CubeId(9)).is_none());
    }

    #[test]
    fn displays() {
        let mut world = corridor(1);
        let id = world
            .spawn_body(Body::robot(Vec3::new(0.0, 0.0, 50.0), 5.0), CubeId(0))
            .unwrap();
        let summary = format!("{}", WorldInspector::summary(&world));
        assert!(summary.contains("tick=0"));
        assert!(summary.contains("bodies=1"));
        let body = format!("{}", WorldInspector::inspect_body(&world, id).unwrap());
        assert!(body.contains("Robot"));
        let cube = format!("{}", WorldInspector::inspect_cube(&world, CubeId(0)).unwrap());
        assert!(cube.contains("solid=6"));
    }
}
