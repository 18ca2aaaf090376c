//! Zone (continent layout) files.
//!
//! - [`Zone`] - Header plus the sections below
//! - [`Eco`] - Terrain texture settings and flora layers
//! - [`Flora`] - Flora model definitions
//! - [`RuntimeObject`] / [`Instance`] - Placed actors
//! - [`Light`] - Placed lights

mod format;
mod header;
mod eco;
mod flora;
mod object;
mod light;
mod file;

pub use format::{
    ChunkInfo, ColorArgb, EcoTint, FloatMapEntry, OffsetsV1, OffsetsV4, PerTileInfo, UIntMapEntry,
    Vec4MapEntry, ZONE_MAGIC,
};
pub use header::{SectionOffsets, ZoneHeader, ZONE_V4};
pub use eco::{Eco, EcoLayer, FloraInfo, TextureInfo};
pub use flora::Flora;
pub use object::{Instance, InstanceTail, RuntimeObject};
pub use light::{Light, LightType};
pub use file::Zone;
