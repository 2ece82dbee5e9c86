use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a cube in the world's cube table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CubeId(pub u32);

impl CubeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CubeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cube#{}", self.0)
    }
}

/// A side is addressed by its owning cube plus its fixed slot (0..6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SideId {
    pub cube: CubeId,
    pub side: u8,
}

impl SideId {
    pub fn new(cube: CubeId, side: u8) -> Self {
        Self { cube, side }
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cube, self.side)
    }
}

/// Index of a wall in the world's wall table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallId(pub u32);

impl WallId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a trigger in the world's trigger table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

impl TriggerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Generational handle into the body arena.
///
/// A slot is reused after its body is removed; the generation makes stale
/// handles detectable instead of silently aliasing the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId {
    pub index: u32,
    pub generation: u32,
}

impl BodyId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}v{}", self.index, self.generation)
    }
}

/// Texture (bitmap) identifier as handed over by the asset layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_id_orders_by_cube_then_slot() {
        let a = SideId::new(CubeId(0), 5);
        let b = SideId::new(CubeId(1), 0);
        assert!(a < b);
    }

    #[test]
    fn body_ids_differ_by_generation() {
        let a = BodyId::new(3, 0);
        let b = BodyId::new(3, 1);
        assert_ne!(a, b);
        assert_eq!(format!("{a}"), "body#3v0");
    }
}
