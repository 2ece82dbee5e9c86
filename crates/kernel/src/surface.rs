//! Surface attributes supplied by the asset layer.
//!
//! The kernel never owns pixel data for rendering; it only asks whether a
//! texture is a force field, whether a point on it is see-through, and what a
//! destructible overlay turns into once shot.

use cubeworld_common::TextureId;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Palette index that marks a transparent texel.
pub const TRANSPARENT_INDEX: u8 = 255;

/// Textures assigned to one side, plus per-corner texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideSurface {
    pub texture: TextureId,
    pub overlay: Option<TextureId>,
    pub uvs: [Vec2; 4],
}

impl Default for SideSurface {
    fn default() -> Self {
        Self {
            texture: TextureId(0),
            overlay: None,
            uvs: [
                Vec2::new(0.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
            ],
        }
    }
}

/// What a destroyed overlay becomes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DestroyedOverlay {
    pub texture: TextureId,
    /// Whether destruction also throws an explosion.
    pub explodes: bool,
}

/// Attribute lookups the kernel needs from the texture catalogue.
pub trait SurfaceLookup: fmt::Debug {
    /// Force fields are solid to bodies but open instantly for wall triggers.
    fn is_force_field(&self, texture: TextureId) -> bool;

    /// Whether any part of the texture can be seen through.
    fn is_transparent(&self, texture: TextureId) -> bool;

    /// Whether the surface is see-through at `uv` (both layers considered).
    fn is_transparent_at(&self, surface: &SideSurface, uv: Vec2) -> bool;

    /// Replacement for a destructible overlay, if it can be destroyed.
    fn destroyed_overlay(&self, overlay: TextureId) -> Option<DestroyedOverlay>;
}

/// A palette-indexed texel mask, sampled with wrap-around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelMask {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PixelMask {
    pub fn sample(&self, uv: Vec2) -> Option<u8> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let u = uv.x.rem_euclid(1.0);
        let v = uv.y.rem_euclid(1.0);
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    fn has_transparency(&self) -> bool {
        self.pixels.contains(&TRANSPARENT_INDEX)
    }
}

/// Per-texture attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureInfo {
    pub force_field: bool,
    pub mask: Option<PixelMask>,
    pub destroyed: Option<DestroyedOverlay>,
}

/// Table-backed [`SurfaceLookup`] loaded alongside a level.
///
/// Textures absent from the table are opaque, solid and indestructible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureTable {
    pub textures: BTreeMap<u16, TextureInfo>,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, texture: TextureId, info: TextureInfo) {
        self.textures.insert(texture.0, info);
    }

    fn info(&self, texture: TextureId) -> Option<&TextureInfo> {
        self.textures.get(&texture.0)
    }

    fn texel_transparent(&self, texture: TextureId, uv: Vec2) -> bool {
        self.info(texture)
            .and_then(|info| info.mask.as_ref())
            .and_then(|mask| mask.sample(uv))
            .is_some_and(|px| px == TRANSPARENT_INDEX)
    }
}

impl SurfaceLookup for TextureTable {
    fn is_force_field(&self, texture: TextureId) -> bool {
        self.info(texture).is_some_and(|info| info.force_field)
    }

    fn is_transparent(&self, texture: TextureId) -> bool {
        self.info(texture)
            .and_then(|info| info.mask.as_ref())
            .is_some_and(PixelMask::has_transparency)
    }

    fn is_transparent_at(&self, surface: &SideSurface, uv: Vec2) -> bool {
        if !self.texel_transparent(surface.texture, uv) {
            return false;
        }
        // An overlay without a mask covers the whole face.
        match surface.overlay {
            Some(overlay) => self.texel_transparent(overlay, uv),
            None => true,
        }
    }

    fn destroyed_overlay(&self, overlay: TextureId) -> Option<DestroyedOverlay> {
        self.info(overlay).and_then(|info| info.destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grate() -> TextureInfo {
        // 2x2 checker: transparent on the diagonal.
        TextureInfo {
            mask: Some(PixelMask {
                width: 2,
                height: 2,
                pixels: vec![TRANSPARENT_INDEX, 7, 7, TRANSPARENT_INDEX],
            }),
            ..TextureInfo::default()
        }
    }

    #[test]
    fn mask_sampling_wraps() {
        let mask = grate().mask.unwrap();
        assert_eq!(mask.sample(Vec2::new(0.25, 0.25)), Some(TRANSPARENT_INDEX));
        assert_eq!(mask.sample(Vec2::new(0.75, 0.25)), Some(7));
        assert_eq!(mask.sample(Vec2::new(1.25, 1.25)), Some(TRANSPARENT_INDEX));
    }

    #[test]
    fn transparency_respects_overlay() {
        let mut table = TextureTable::new();
        table.insert(TextureId(1), grate());
        table.insert(TextureId(2), TextureInfo::default());
        let bare = SideSurface {
            texture: TextureId(1),
            ..SideSurface::default()
        };
        assert!(table.is_transparent(TextureId(1)));
        assert!(table.is_transparent_at(&bare, Vec2::new(0.1, 0.1)));
        assert!(!table.is_transparent_at(&bare, Vec2::new(0.9, 0.1)));

        let covered = SideSurface {
            overlay: Some(TextureId(2)),
            ..bare
        };
        assert!(!table.is_transparent_at(&covered, Vec2::new(0.1, 0.1)));
    }

    #[test]
    fn unknown_textures_are_plain() {
        let table = TextureTable::new();
        assert!(!table.is_force_field(TextureId(9)));
        assert!(!table.is_transparent(TextureId(9)));
        assert!(table.destroyed_overlay(TextureId(9)).is_none());
    }
}
