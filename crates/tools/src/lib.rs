//! Developer Tooling: world inspector and event summaries.
//!
//! # Invariants
//! - Tools only read world state; they never mutate it.

mod inspector;

pub use inspector::{event_name, BodyInfo, CubeInfo, WorldInspector, WorldSummary};

pub fn crate_info() -> &'static str {
    "cubeworld-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
