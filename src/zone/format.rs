//! Fixed-size zone records.

use bytemuck::{Pod, Zeroable};

use crate::util::Float4;

/// Zone file signature.
pub const ZONE_MAGIC: &[u8; 4] = b"ZONE";

/// Section offsets of a version 1-3 header.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct OffsetsV1 {
    pub ecos: u32,
    pub floras: u32,
    pub invis_walls: u32,
    pub objects: u32,
    pub lights: u32,
    pub unknown: u32,
}

/// Section offsets of a version 4+ header.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct OffsetsV4 {
    pub ecos: u32,
    pub floras: u32,
    pub invis_walls: u32,
    pub objects: u32,
    pub lights: u32,
    pub unknown: u32,
    pub decals: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PerTileInfo {
    pub quad_count: u32,
    pub width: f32,
    pub height: f32,
    pub vertex_count: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ChunkInfo {
    pub tile_count: u32,
    pub start_x: i32,
    pub start_y: i32,
    pub count_x: u32,
    pub count_y: u32,
}

/// Flora tint: RGBA color and strength.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct EcoTint {
    pub rgba: [u8; 4],
    pub strength: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ColorArgb {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct UIntMapEntry {
    pub key: u32,
    pub value: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FloatMapEntry {
    pub key: u32,
    pub value: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vec4MapEntry {
    pub key: u32,
    pub value: Float4,
}
