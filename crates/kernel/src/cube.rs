//! Cell graph: convex hexahedral cubes and their six sides.

use bitflags::bitflags;
use cubeworld_common::{BodyId, Bounce, CubeId, LineSegment, SideId, Triangle, WallId};
use glam::{Vec2, Vec3};

use crate::surface::{SideSurface, SurfaceLookup};
use crate::wall::{DoorState, Wall, WallFlags, WallType};

pub const SIDE_COUNT: usize = 6;

pub const LEFT: u8 = 0;
pub const TOP: u8 = 1;
pub const RIGHT: u8 = 2;
pub const BOTTOM: u8 = 3;
pub const BACK: u8 = 4;
pub const FRONT: u8 = 5;

/// Cube corner indices for each side, in winding order.
pub const SIDE_VERTS: [[usize; 4]; SIDE_COUNT] = [
    [7, 6, 2, 3],
    [0, 4, 7, 3],
    [0, 1, 5, 4],
    [2, 6, 5, 1],
    [4, 5, 6, 7],
    [3, 2, 1, 0],
];

/// Non-planarity below this is treated as flat.
const PLANE_TOLERANCE: f32 = 1e-3;

/// Slack for point-in-cube tests so points on a face count as inside.
const CONTAINMENT_TOLERANCE: f32 = 1e-3;

bitflags! {
    /// Passability and visibility summary of a side.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DoorwayFlags: u8 {
        const FLY = 1;
        const RENDER = 2;
        const RENDPAST = 4;
        const CLOAKED = 8;
    }
}

/// What lies beyond a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbor {
    Cube(CubeId),
    Boundary,
    Disconnected,
}

impl Neighbor {
    pub fn cube(self) -> Option<CubeId> {
        match self {
            Self::Cube(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Side {
    pub id: SideId,
    pub corners: [Vec3; 4],
    pub vertex_ids: [u32; 4],
    pub neighbor: Neighbor,
    pub wall: Option<WallId>,
    pub other_side: Option<SideId>,
    pub surface: SideSurface,
    pub triangles: [Triangle; 2],
    pub normal: Vec3,
    /// 0 splits along corners 0-2, 1 along corners 1-3.
    pub vertex_offset: u8,
    /// The triangle pair folds inwards, seen from inside the cube.
    pub concave: bool,
    /// Which corner each triangle vertex came from.
    corner_map: [[usize; 3]; 2],
}

impl Side {
    pub(crate) fn new(
        id: SideId,
        vertex_ids: [u32; 4],
        corners: [Vec3; 4],
        neighbor: Neighbor,
        surface: SideSurface,
        center: Vec3,
    ) -> Self {
        let mut side = Self {
            id,
            corners,
            vertex_ids,
            neighbor,
            wall: None,
            other_side: None,
            surface,
            triangles: [Triangle::new(corners[0], corners[1], corners[2]); 2],
            normal: Vec3::ZERO,
            vertex_offset: 0,
            concave: false,
            corner_map: [[0, 1, 2], [0, 2, 3]],
        };
        side.triangulate(0, center);
        if side.concave {
            side.triangulate(1, center);
        }
        side
    }

    /// Split the quad along the diagonal picked by `offset`, with both
    /// triangle normals facing `center`.
    pub(crate) fn triangulate(&mut self, offset: u8, center: Vec3) {
        let maps = if offset == 0 {
            [[0, 1, 2], [0, 2, 3]]
        } else {
            [[1, 2, 3], [1, 3, 0]]
        };
        let mut triangles = [Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y); 2];
        let mut corner_map = maps;
        for (t, map) in maps.iter().enumerate() {
            let tri = Triangle::new(
                self.corners[map[0]],
                self.corners[map[1]],
                self.corners[map[2]],
            );
            if tri.plane.distance_to(center) < 0.0 {
                triangles[t] = tri.flipped();
                corner_map[t] = [map[0], map[2], map[1]];
            } else {
                triangles[t] = tri;
            }
        }
        let fold = self.corners[if offset == 0 { 3 } else { 0 }];
        self.concave = triangles[0].plane.distance_to(fold) > PLANE_TOLERANCE;
        let summed = triangles[0].normal() + triangles[1].normal();
        self.normal = if summed.length_squared() > f32::EPSILON {
            summed.normalize()
        } else {
            triangles[0].normal()
        };
        self.triangles = triangles;
        self.corner_map = corner_map;
        self.vertex_offset = offset;
    }

    /// Vertex ids at the ends of the chosen diagonal, smaller id first.
    pub fn diagonal(&self) -> (u32, u32) {
        let (a, b) = if self.vertex_offset == 0 {
            (self.vertex_ids[0], self.vertex_ids[2])
        } else {
            (self.vertex_ids[1], self.vertex_ids[3])
        };
        (a.min(b), a.max(b))
    }

    /// The offset that splits this side along the vertex pair `diagonal`, if any.
    pub(crate) fn offset_for_diagonal(&self, diagonal: (u32, u32)) -> Option<u8> {
        let pair = |a: u32, b: u32| (a.min(b), a.max(b));
        if pair(self.vertex_ids[0], self.vertex_ids[2]) == diagonal {
            Some(0)
        } else if pair(self.vertex_ids[1], self.vertex_ids[3]) == diagonal {
            Some(1)
        } else {
            None
        }
    }

    /// Same four vertices, any order.
    pub(crate) fn shares_vertices_with(&self, other: &Side) -> bool {
        let mut a = self.vertex_ids;
        let mut b = other.vertex_ids;
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        let d0 = self.triangles[0].plane.distance_to(p);
        let d1 = self.triangles[1].plane.distance_to(p);
        if self.concave {
            d0 >= -CONTAINMENT_TOLERANCE || d1 >= -CONTAINMENT_TOLERANCE
        } else {
            d0 >= -CONTAINMENT_TOLERANCE && d1 >= -CONTAINMENT_TOLERANCE
        }
    }

    /// Nearest contact of a swept sphere with either triangle.
    pub fn bounce(&self, segment: &LineSegment, radius: f32) -> Option<Bounce> {
        let mut best = None;
        for (index, triangle) in self.triangles.iter().enumerate() {
            let hit = triangle.bounce(segment, radius).map(|mut b| {
                b.triangle = Some(index as u8);
                b.side = Some(self.id);
                b
            });
            best = Bounce::nearest(best, hit);
        }
        best
    }

    /// Texture coordinate of a surface point, interpolated over the struck triangle.
    pub fn uv_at(&self, triangle: u8, surface_point: Vec3) -> Vec2 {
        let t = (triangle as usize).min(1);
        let bary = self.triangles[t].barycentric(surface_point);
        let map = self.corner_map[t];
        self.surface.uvs[map[0]] * bary.x
            + self.surface.uvs[map[1]] * bary.y
            + self.surface.uvs[map[2]] * bary.z
    }

    pub fn doorway_flags(&self, walls: &[Wall], surfaces: &dyn SurfaceLookup) -> DoorwayFlags {
        if self.neighbor.cube().is_none() {
            return DoorwayFlags::RENDER;
        }
        let Some(wall) = self.wall.and_then(|w| walls.get(w.index())) else {
            return DoorwayFlags::FLY | DoorwayFlags::RENDPAST;
        };
        let see_through = surfaces.is_transparent(self.surface.texture);
        let solid = if see_through {
            DoorwayFlags::RENDER | DoorwayFlags::RENDPAST
        } else {
            DoorwayFlags::RENDER
        };
        match wall.kind {
            WallType::Open => DoorwayFlags::FLY | DoorwayFlags::RENDPAST,
            WallType::Illusion if wall.flags.contains(WallFlags::ILLUSION_OFF) => {
                DoorwayFlags::FLY | DoorwayFlags::RENDPAST
            }
            WallType::Illusion => DoorwayFlags::FLY | DoorwayFlags::RENDER | DoorwayFlags::RENDPAST,
            WallType::Blastable if wall.is_blasted() => {
                DoorwayFlags::FLY | DoorwayFlags::RENDER | DoorwayFlags::RENDPAST
            }
            WallType::Cloaked => DoorwayFlags::RENDER | DoorwayFlags::RENDPAST | DoorwayFlags::CLOAKED,
            WallType::Door if wall.is_door_opened() => {
                DoorwayFlags::FLY | DoorwayFlags::RENDER | DoorwayFlags::RENDPAST
            }
            WallType::Door if wall.state == DoorState::Opening => {
                DoorwayFlags::RENDER | DoorwayFlags::RENDPAST
            }
            WallType::Blastable
            | WallType::Door
            | WallType::Normal
            | WallType::Closed
            | WallType::Overlay => solid,
        }
    }

    pub fn is_solid(&self, walls: &[Wall], surfaces: &dyn SurfaceLookup) -> bool {
        !self.doorway_flags(walls, surfaces).contains(DoorwayFlags::FLY)
    }

    pub fn is_visible(&self, walls: &[Wall], surfaces: &dyn SurfaceLookup) -> bool {
        self.doorway_flags(walls, surfaces).contains(DoorwayFlags::RENDER)
    }
}

#[derive(Debug, Clone)]
pub struct Cube {
    pub id: CubeId,
    pub vertices: [Vec3; 8],
    pub vertex_ids: [u32; 8],
    pub sides: [Side; SIDE_COUNT],
    pub center: Vec3,
    pub radius: f32,
    visible: Option<Vec<CubeId>>,
    pub(crate) bodies: Vec<BodyId>,
}

impl Cube {
    pub(crate) fn new(
        id: CubeId,
        vertex_ids: [u32; 8],
        vertices: [Vec3; 8],
        neighbors: [Neighbor; SIDE_COUNT],
        surfaces: [SideSurface; SIDE_COUNT],
    ) -> Self {
        let center = vertices.iter().copied().sum::<Vec3>() / 8.0;
        let radius = vertices
            .iter()
            .map(|v| v.distance(center))
            .fold(0.0_f32, f32::max);
        let sides = std::array::from_fn(|s| {
            let map = SIDE_VERTS[s];
            Side::new(
                SideId::new(id, s as u8),
                map.map(|i| vertex_ids[i]),
                map.map(|i| vertices[i]),
                neighbors[s],
                surfaces[s],
                center,
            )
        });
        Self {
            id,
            vertices,
            vertex_ids,
            sides,
            center,
            radius,
            visible: None,
            bodies: Vec::new(),
        }
    }

    pub fn side(&self, side: u8) -> &Side {
        &self.sides[side as usize]
    }

    /// Bodies currently inside this cube.
    pub fn bodies(&self) -> &[BodyId] {
        &self.bodies
    }

    /// Externally computed visibility set; empty until it has been resolved.
    pub fn visible_neighbors(&self) -> &[CubeId] {
        self.visible.as_deref().unwrap_or(&[])
    }

    pub fn visibility_resolved(&self) -> bool {
        self.visible.is_some()
    }

    pub(crate) fn set_visible(&mut self, cubes: Vec<CubeId>) {
        self.visible = Some(cubes);
    }

    pub fn is_point_inside(&self, p: Vec3) -> bool {
        self.sides.iter().all(|side| side.contains_point(p))
    }

    /// Nearest contact against any side.
    pub fn bounce(&self, segment: &LineSegment, radius: f32) -> Option<Bounce> {
        self.bounce_with(segment, |_| Some(radius))
    }

    /// Nearest contact, with a per-side sphere radius; `None` skips the side.
    pub fn bounce_with(
        &self,
        segment: &LineSegment,
        mut radius_for: impl FnMut(&Side) -> Option<f32>,
    ) -> Option<Bounce> {
        let mut best = None;
        for side in &self.sides {
            let Some(radius) = radius_for(side) else {
                continue;
            };
            best = Bounce::nearest(best, side.bounce(segment, radius));
        }
        best.map(|mut b| {
            b.cube = Some(self.id);
            b
        })
    }
}
