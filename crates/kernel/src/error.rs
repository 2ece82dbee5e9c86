use cubeworld_common::{BodyId, CubeId, WallId};

/// Fatal faults while decoding or linking a level. The graph is unusable.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("cube {cube} references vertex {vertex} but the level has {count} vertices")]
    VertexOutOfRange { cube: u32, vertex: u32, count: usize },
    #[error("cube {cube} side {side} references cube {neighbor} but the level has {count} cubes")]
    CubeOutOfRange {
        cube: u32,
        side: u8,
        neighbor: i32,
        count: usize,
    },
    #[error("shared side {cube}:{side} does not line up with any side of {neighbor}")]
    MismatchedSide { cube: CubeId, side: u8, neighbor: CubeId },
    #[error("shared side {cube}:{side} matches more than one side of {neighbor}")]
    DuplicateOtherSide { cube: CubeId, side: u8, neighbor: CubeId },
    #[error("{what} index {index} out of range (have {count})")]
    IndexOutOfRange {
        what: &'static str,
        index: i64,
        count: usize,
    },
    #[error("side {cube}:{side} already carries a wall")]
    SideAlreadyWalled { cube: u32, side: u8 },
    #[error("trigger {trigger} has {count} links, at most {max} allowed")]
    TooManyTriggerLinks {
        trigger: usize,
        count: usize,
        max: usize,
    },
    #[error("unknown wall type code {0}")]
    UnknownWallType(u8),
    #[error("unknown trigger type code {0}")]
    UnknownTriggerType(u8),
    #[error("unknown body type code {0}")]
    UnknownBodyType(u8),
    #[error("unknown mover type code {0}")]
    UnknownMoverType(u8),
    #[error("unknown control type code {0}")]
    UnknownControlType(u8),
    #[error("unknown render type code {0}")]
    UnknownRenderType(u8),
    #[error("body {index} at {position:?} lies outside every cube")]
    BodyOutsideLevel { index: usize, position: [f32; 3] },
    #[error("level JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Misuse of the world at runtime: stale or foreign handles.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("{0} is no longer alive")]
    DeadBody(BodyId),
    #[error("wall {0:?} does not exist")]
    UnknownWall(WallId),
    #[error("{0} does not exist")]
    UnknownCube(CubeId),
}
