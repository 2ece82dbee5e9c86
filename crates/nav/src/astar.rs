use std::collections::HashMap;

use cubeworld_common::CubeId;
use cubeworld_kernel::{DoorwayFlags, World};
use glam::Vec3;

use crate::heap::IndexedHeap;

/// A position together with the cube that contains it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubePos {
    pub cube: CubeId,
    pub pos: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    /// Accumulated squared centre-to-centre distance from the start.
    cost: f32,
    prev: Option<CubeId>,
    closed: bool,
}

impl CubePos {
    pub fn new(cube: CubeId, pos: Vec3) -> Self {
        Self { cube, pos }
    }

    /// A* over the cube graph, crossing only sides a body can fly through.
    ///
    /// Waypoints are the centres of the cubes along the way, ending with
    /// `dest` itself. Returns `None` when `dest` cannot be reached.
    pub fn create_path_to(&self, world: &World, dest: &CubePos) -> Option<Vec<CubePos>> {
        world.cube(self.cube)?;
        world.cube(dest.cube)?;

        let mut nodes: HashMap<CubeId, Node> = HashMap::new();
        let mut open = IndexedHeap::new();
        nodes.insert(
            self.cube,
            Node {
                cost: 0.0,
                prev: None,
                closed: false,
            },
        );
        open.push(self.cube, 0.0);

        while let Some((current, _)) = open.pop() {
            if current == dest.cube {
                let path = reconstruct(world, &nodes, current, dest);
                tracing::debug!(
                    from = %self.cube,
                    to = %dest.cube,
                    explored = nodes.len(),
                    waypoints = path.len(),
                    "path found"
                );
                return Some(path);
            }
            let Some(node) = nodes.get_mut(&current) else {
                continue;
            };
            node.closed = true;
            let cost = node.cost;
            let Some(cube) = world.cube(current) else {
                continue;
            };

            for side in &cube.sides {
                let Some(next) = side.neighbor.cube() else {
                    continue;
                };
                if !world.doorway_flags(side.id).contains(DoorwayFlags::FLY) {
                    continue;
                }
                let Some(next_cube) = world.cube(next) else {
                    continue;
                };
                let g = cost + cube.center.distance_squared(next_cube.center);
                if let Some(known) = nodes.get(&next) {
                    if known.closed || known.cost <= g {
                        continue;
                    }
                    // Cheaper route to a queued cube: requeue it.
                    open.remove(&next);
                }
                nodes.insert(
                    next,
                    Node {
                        cost: g,
                        prev: Some(current),
                        closed: false,
                    },
                );
                open.push(next, g + next_cube.center.distance_squared(dest.pos));
            }
        }

        tracing::debug!(from = %self.cube, to = %dest.cube, explored = nodes.len(), "no path");
        None
    }
}

fn reconstruct(world: &World, nodes: &HashMap<CubeId, Node>, end: CubeId, dest: &CubePos) -> Vec<CubePos> {
    let mut cubes = Vec::new();
    let mut cursor = nodes.get(&end).and_then(|n| n.prev);
    while let Some(cube) = cursor {
        cubes.push(cube);
        cursor = nodes.get(&cube).and_then(|n| n.prev);
    }
    cubes.reverse();
    cubes
        .into_iter()
        .filter_map(|c| world.cube(c).map(|cube| CubePos::new(c, cube.center)))
        .chain(std::iter::once(*dest))
        .collect()
}
