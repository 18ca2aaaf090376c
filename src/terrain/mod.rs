//! Terrain chunk formats.
//!
//! - [`Cnk0`] - Geometry chunk: tiles, ecos, floras, vertices, render batches
//! - [`Cnk1`] - Texture chunk: per-tile colour/specular blobs
//!
//! Both are parsed from the decompressed payload of a
//! [`ChunkContainer`](crate::core::ChunkContainer).

mod format;
mod tile;
mod cnk0;
mod cnk1;

pub use format::{
    CNK0_MAGIC, CNK1_MAGIC, OPTIMIZED_DRAW_SIZE, TILE_OCCLUDER_SIZE,
    Layer, RenderBatch, Unknown, Vertex, VertexBounds,
};
pub use tile::{Eco, Flora, Tile};
pub use cnk0::{Cnk0, Cnk0Layout};
pub use cnk1::{Cnk1, Texture, TEXTURE_BLOBS};
