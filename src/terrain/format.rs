//! Fixed-size terrain records and section sizes.

use bytemuck::{Pod, Zeroable};

use crate::util::{Aabb, Vec3};

/// Magic of a geometry chunk.
pub const CNK0_MAGIC: &[u8; 4] = b"CNK0";

/// Magic of a texture chunk.
pub const CNK1_MAGIC: &[u8; 4] = b"CNK1";

/// Size of one opaque optimized-draw record.
pub const OPTIMIZED_DRAW_SIZE: usize = 320;

/// Size of one opaque tile-occluder record.
pub const TILE_OCCLUDER_SIZE: usize = 64;

/// Terrain vertex as stored in a CNK0 chunk.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Vertex {
    pub x: i16,
    pub y: i16,
    pub height_near: i16,
    pub height_far: i16,
    pub color1: u32,
    pub color2: u32,
}

impl Vertex {
    /// Position using the near-LOD height.
    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.height_near as f32)
    }
}

/// Contiguous range of the shared index/vertex buffers drawn together.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RenderBatch {
    pub index_offset: u32,
    pub index_count: u32,
    pub vertex_offset: u32,
    pub vertex_count: u32,
}

/// Unidentified 4-byte entry following the tiles.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Unknown {
    pub unk_short: i16,
    pub unk_byte1: u8,
    pub unk_byte2: u8,
}

/// Flora layer entry.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Layer {
    pub unk1: u32,
    pub unk2: u32,
}

/// Component-wise vertex extremes of one render batch.
///
/// Colors are not meaningful and stay zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexBounds {
    pub min: Vertex,
    pub max: Vertex,
}

impl VertexBounds {
    /// Bounds of an empty batch: `min > max` on every axis.
    pub const EMPTY: Self = Self {
        min: Vertex { x: i16::MAX, y: i16::MAX, height_near: i16::MAX, height_far: i16::MAX, color1: 0, color2: 0 },
        max: Vertex { x: i16::MIN, y: i16::MIN, height_near: i16::MIN, height_far: i16::MIN, color1: 0, color2: 0 },
    };

    /// Grow to include `v`.
    pub fn expand(&mut self, v: &Vertex) {
        self.min.x = self.min.x.min(v.x);
        self.min.y = self.min.y.min(v.y);
        self.min.height_near = self.min.height_near.min(v.height_near);
        self.min.height_far = self.min.height_far.min(v.height_far);
        self.max.x = self.max.x.max(v.x);
        self.max.y = self.max.y.max(v.y);
        self.max.height_near = self.max.height_near.max(v.height_near);
        self.max.height_far = self.max.height_far.max(v.height_far);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// Box over x, y and near height.
    pub fn to_aabb(&self) -> Aabb {
        if self.is_empty() {
            return Aabb::EMPTY;
        }
        Aabb::new(self.min.position(), self.max.position())
    }
}

impl Default for VertexBounds {
    fn default() -> Self {
        Self::EMPTY
    }
}
