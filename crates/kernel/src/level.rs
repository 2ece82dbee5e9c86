//! Level data: the serialized form of a world and the builder that links it.
//!
//! Indices into other tables use `-1` for "none". Neighbour codes use `-1`
//! for an outer boundary and `-2` for a deliberately disconnected side.

use cubeworld_common::{CubeId, SideId, TriggerId, WallId};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::body::{
    Body, BodyType, ControlType, Mover, PhysicsFlags, PhysicsInfo, PowerupKind, RenderType,
};
use crate::config::SimConfig;
use crate::cube::{BACK, Cube, FRONT, Neighbor, SIDE_COUNT};
use crate::error::LevelError;
use crate::surface::{SideSurface, TextureTable};
use crate::trigger::{MAX_TRIGGER_LINKS, Trigger, TriggerFlags, TriggerType};
use crate::wall::{DoorClip, DoorState, KeyFlags, Wall, WallFlags, WallType};
use crate::world::World;

pub const NEIGHBOR_BOUNDARY: i32 = -1;
pub const NEIGHBOR_DISCONNECTED: i32 = -2;

fn no_index() -> i32 {
    -1
}

fn one() -> f32 {
    1.0
}

fn identity() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    pub vertices: Vec<[f32; 3]>,
    pub cubes: Vec<CubeData>,
    #[serde(default)]
    pub walls: Vec<WallData>,
    #[serde(default)]
    pub triggers: Vec<TriggerData>,
    #[serde(default)]
    pub door_clips: Vec<DoorClip>,
    #[serde(default)]
    pub bodies: Vec<BodySpawn>,
    #[serde(default)]
    pub textures: TextureTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeData {
    /// Indices into the level's vertex table.
    pub vertices: [u32; 8],
    pub neighbors: [i32; SIDE_COUNT],
    #[serde(default)]
    pub surfaces: Option<[SideSurface; SIDE_COUNT]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallData {
    pub cube: u32,
    pub side: u8,
    pub kind: u8,
    #[serde(default)]
    pub flags: u8,
    /// Defaults to the configured blastable wall strength.
    #[serde(default)]
    pub hit_points: Option<f32>,
    #[serde(default = "no_index")]
    pub linked_wall: i32,
    #[serde(default = "no_index")]
    pub trigger: i32,
    #[serde(default = "no_index")]
    pub clip: i32,
    #[serde(default)]
    pub keys: u8,
    #[serde(default)]
    pub cloak_value: f32,
}

impl WallData {
    pub fn new(cube: u32, side: u8, kind: u8) -> Self {
        Self {
            cube,
            side,
            kind,
            flags: 0,
            hit_points: None,
            linked_wall: -1,
            trigger: -1,
            clip: -1,
            keys: 0,
            cloak_value: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerData {
    pub kind: u8,
    #[serde(default)]
    pub flags: u8,
    /// `(cube, side)` pairs.
    #[serde(default)]
    pub links: Vec<(u32, u8)>,
    #[serde(default)]
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySpawn {
    pub kind: u8,
    #[serde(default)]
    pub subtype: u16,
    pub cube: u32,
    pub position: [f32; 3],
    #[serde(default = "identity")]
    pub orientation: [f32; 4],
    #[serde(default = "one")]
    pub radius: f32,
    #[serde(default)]
    pub mover: u8,
    #[serde(default)]
    pub control: u8,
    #[serde(default)]
    pub render: u8,
    #[serde(default = "one")]
    pub mass: f32,
    #[serde(default)]
    pub drag: f32,
    #[serde(default)]
    pub physics_flags: u16,
    #[serde(default)]
    pub velocity: [f32; 3],
    #[serde(default)]
    pub rot_velocity: [f32; 3],
    #[serde(default)]
    pub shields: Option<f32>,
}

impl BodySpawn {
    fn decode(&self) -> Result<Body, LevelError> {
        let kind = BodyType::try_from(self.kind)?;
        let physics = PhysicsInfo {
            velocity: Vec3::from(self.velocity),
            mass: self.mass,
            drag: self.drag,
            rot_velocity: Vec3::from(self.rot_velocity),
            flags: PhysicsFlags::from_bits_truncate(self.physics_flags),
            ..PhysicsInfo::default()
        };
        let position = Vec3::from(self.position);
        let mut body = match kind {
            BodyType::Player => Body::player(position, self.radius),
            BodyType::Hostage => Body::hostage(position, self.radius),
            BodyType::Reactor => Body::reactor(position, self.radius),
            BodyType::Powerup => {
                Body::powerup(position, self.radius, PowerupKind::from_subtype(self.subtype))
            }
            BodyType::Weapon => Body::weapon(position, physics.velocity, self.radius, 0.0),
            _ => Body::new(kind, position, self.radius),
        };
        body.subtype = self.subtype;
        body.orientation = Quat::from_array(self.orientation).normalize();
        body.mover = Mover::decode(self.mover, physics)?;
        body.control = ControlType::try_from(self.control)?;
        body.render = RenderType::try_from(self.render)?;
        if let Some(shields) = self.shields {
            body.shields = shields;
        }
        Ok(body)
    }
}

impl LevelData {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// A straight run of `cubes` boxes along +Z, each `width` square and
    /// `depth` long. Cube `i` spans `z = i*depth ..= (i+1)*depth`.
    pub fn corridor(cubes: usize, width: f32, depth: f32) -> Self {
        let h = width * 0.5;
        let vertices = (0..=cubes)
            .flat_map(|k| {
                let z = k as f32 * depth;
                [[h, h, z], [h, -h, z], [-h, -h, z], [-h, h, z]]
            })
            .collect();
        let cubes = (0..cubes)
            .map(|i| {
                let back = 4 * i as u32;
                let front = back + 4;
                let mut neighbors = [NEIGHBOR_BOUNDARY; SIDE_COUNT];
                if i > 0 {
                    neighbors[BACK as usize] = i as i32 - 1;
                }
                if i + 1 < cubes {
                    neighbors[FRONT as usize] = i as i32 + 1;
                }
                CubeData {
                    vertices: [
                        front,
                        front + 1,
                        front + 2,
                        front + 3,
                        back,
                        back + 1,
                        back + 2,
                        back + 3,
                    ],
                    neighbors,
                    surfaces: None,
                }
            })
            .collect();
        Self {
            vertices,
            cubes,
            ..Self::default()
        }
    }
}

fn optional_index(what: &'static str, index: i32, count: usize) -> Result<Option<u32>, LevelError> {
    match index {
        i if i < 0 => Ok(None),
        i if (i as usize) < count => Ok(Some(i as u32)),
        i => Err(LevelError::IndexOutOfRange {
            what,
            index: i64::from(i),
            count,
        }),
    }
}

impl World {
    /// Decode `level`, link the cell graph and place its bodies.
    pub fn build(level: &LevelData, config: SimConfig) -> Result<World, LevelError> {
        let _span = tracing::info_span!("level_build", cubes = level.cubes.len()).entered();
        let vertices: Vec<Vec3> = level.vertices.iter().copied().map(Vec3::from).collect();
        let cube_count = level.cubes.len();

        let mut cubes = Vec::with_capacity(cube_count);
        for (i, data) in level.cubes.iter().enumerate() {
            let mut corners = [Vec3::ZERO; 8];
            for (slot, &v) in data.vertices.iter().enumerate() {
                corners[slot] = *vertices.get(v as usize).ok_or(LevelError::VertexOutOfRange {
                    cube: i as u32,
                    vertex: v,
                    count: vertices.len(),
                })?;
            }
            let mut neighbors = [Neighbor::Boundary; SIDE_COUNT];
            for (s, &code) in data.neighbors.iter().enumerate() {
                neighbors[s] = match code {
                    NEIGHBOR_BOUNDARY => Neighbor::Boundary,
                    NEIGHBOR_DISCONNECTED => Neighbor::Disconnected,
                    n if n >= 0 && (n as usize) < cube_count => Neighbor::Cube(CubeId(n as u32)),
                    n => {
                        return Err(LevelError::CubeOutOfRange {
                            cube: i as u32,
                            side: s as u8,
                            neighbor: n,
                            count: cube_count,
                        });
                    }
                };
            }
            let surfaces = data.surfaces.unwrap_or_default();
            cubes.push(Cube::new(CubeId(i as u32), data.vertices, corners, neighbors, surfaces));
        }

        link_sides(&mut cubes)?;

        let walls = decode_walls(level, &mut cubes, &config)?;
        let triggers = decode_triggers(level)?;

        let mut world = World::from_parts(
            cubes,
            walls,
            triggers,
            level.door_clips.clone(),
            Box::new(level.textures.clone()),
            config,
        );

        for (index, spawn) in level.bodies.iter().enumerate() {
            let body = spawn.decode()?;
            let hint = (spawn.cube as usize) < cube_count;
            let cube = if hint && world.cubes[spawn.cube as usize].is_point_inside(body.position) {
                CubeId(spawn.cube)
            } else {
                match world.find_cube(body.position, hint.then_some(CubeId(spawn.cube))) {
                    Some(found) => {
                        tracing::warn!(index, cube = spawn.cube, %found, "body relocated to the cube containing it");
                        found
                    }
                    None => {
                        return Err(LevelError::BodyOutsideLevel {
                            index,
                            position: spawn.position,
                        });
                    }
                }
            };
            if let Err(err) = world.spawn_body(body, cube) {
                tracing::error!(index, %err, "failed to place body");
            }
        }

        tracing::info!(
            cubes = world.cubes.len(),
            walls = world.walls.len(),
            triggers = world.triggers.len(),
            bodies = world.body_count(),
            "level built"
        );
        world.drain_events();
        Ok(world)
    }

    pub fn from_json(json: &str, config: SimConfig) -> Result<World, LevelError> {
        World::build(&LevelData::from_json(json)?, config)
    }
}

/// Resolve each shared side's mirror in the neighbour and make both use the
/// same diagonal. The side visited first keeps its triangulation.
fn link_sides(cubes: &mut [Cube]) -> Result<(), LevelError> {
    for c in 0..cubes.len() {
        for s in 0..SIDE_COUNT {
            let Neighbor::Cube(n) = cubes[c].sides[s].neighbor else {
                continue;
            };
            let here = CubeId(c as u32);
            let side = &cubes[c].sides[s];
            let mut matches = cubes[n.index()]
                .sides
                .iter()
                .filter(|o| o.neighbor == Neighbor::Cube(here) && o.shares_vertices_with(side))
                .map(|o| o.id);
            let other = matches.next().ok_or(LevelError::MismatchedSide {
                cube: here,
                side: s as u8,
                neighbor: n,
            })?;
            if matches.next().is_some() {
                return Err(LevelError::DuplicateOtherSide {
                    cube: here,
                    side: s as u8,
                    neighbor: n,
                });
            }
            let this = side.id;
            cubes[c].sides[s].other_side = Some(other);

            if this < other {
                let diagonal = cubes[c].sides[s].diagonal();
                let neighbor = &mut cubes[n.index()];
                let center = neighbor.center;
                let mirror = &mut neighbor.sides[other.side as usize];
                let offset = mirror
                    .offset_for_diagonal(diagonal)
                    .ok_or(LevelError::MismatchedSide {
                        cube: here,
                        side: s as u8,
                        neighbor: n,
                    })?;
                if offset != mirror.vertex_offset {
                    mirror.triangulate(offset, center);
                }
            }
        }
    }
    Ok(())
}

fn decode_walls(level: &LevelData, cubes: &mut [Cube], config: &SimConfig) -> Result<Vec<Wall>, LevelError> {
    let wall_count = level.walls.len();
    let mut walls = Vec::with_capacity(wall_count);
    for (i, data) in level.walls.iter().enumerate() {
        let cube = cubes
            .get_mut(data.cube as usize)
            .ok_or(LevelError::IndexOutOfRange {
                what: "wall cube",
                index: i64::from(data.cube),
                count: level.cubes.len(),
            })?;
        let side = cube
            .sides
            .get_mut(data.side as usize)
            .ok_or(LevelError::IndexOutOfRange {
                what: "wall side",
                index: i64::from(data.side),
                count: SIDE_COUNT,
            })?;
        if side.wall.is_some() {
            return Err(LevelError::SideAlreadyWalled {
                cube: data.cube,
                side: data.side,
            });
        }
        side.wall = Some(WallId(i as u32));

        let kind = WallType::try_from(data.kind)?;
        let mut wall = Wall::new(side.id, kind);
        wall.flags = WallFlags::from_bits_truncate(data.flags);
        wall.hit_points = match kind {
            WallType::Blastable => data.hit_points.unwrap_or(config.wall_hit_points),
            _ => data.hit_points.unwrap_or(0.0),
        };
        wall.linked = optional_index("linked wall", data.linked_wall, wall_count)?.map(WallId);
        wall.trigger = optional_index("trigger", data.trigger, level.triggers.len())?.map(TriggerId);
        wall.clip = optional_index("door clip", data.clip, level.door_clips.len())?.map(|c| c as usize);
        wall.keys = KeyFlags::from_bits_truncate(data.keys);
        wall.cloak_value = data.cloak_value;
        if kind == WallType::Door && wall.is_door_opened() {
            wall.state = DoorState::Open;
            wall.frame = wall
                .clip
                .and_then(|c| level.door_clips.get(c))
                .map_or(0, DoorClip::last_frame);
        }
        if kind == WallType::Blastable && wall.is_blasted() {
            wall.frame = wall
                .clip
                .and_then(|c| level.door_clips.get(c))
                .map_or(0, DoorClip::last_frame);
        }
        walls.push(wall);
    }

    for wall in walls.iter_mut() {
        let other_side = cubes[wall.side.cube.index()].sides[wall.side.side as usize].other_side;
        wall.other = other_side.and_then(|o: SideId| cubes[o.cube.index()].sides[o.side as usize].wall);
    }
    Ok(walls)
}

fn decode_triggers(level: &LevelData) -> Result<Vec<Trigger>, LevelError> {
    level
        .triggers
        .iter()
        .enumerate()
        .map(|(i, data)| {
            if data.links.len() > MAX_TRIGGER_LINKS {
                return Err(LevelError::TooManyTriggerLinks {
                    trigger: i,
                    count: data.links.len(),
                    max: MAX_TRIGGER_LINKS,
                });
            }
            let links = data
                .links
                .iter()
                .map(|&(cube, side)| {
                    if cube as usize >= level.cubes.len() {
                        return Err(LevelError::IndexOutOfRange {
                            what: "trigger link cube",
                            index: i64::from(cube),
                            count: level.cubes.len(),
                        });
                    }
                    if side as usize >= SIDE_COUNT {
                        return Err(LevelError::IndexOutOfRange {
                            what: "trigger link side",
                            index: i64::from(side),
                            count: SIDE_COUNT,
                        });
                    }
                    Ok(SideId::new(CubeId(cube), side))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Trigger {
                kind: TriggerType::try_from(data.kind)?,
                flags: TriggerFlags::from_bits_truncate(data.flags),
                links,
                value: data.value,
            })
        })
        .collect()
}
