//! Zone header: signature, version and section offsets.
//!
//! Version 4 inserted an extra `u32` before the offsets and appended a
//! decals offset; everything else kept its order.

use super::format::{ChunkInfo, OffsetsV1, OffsetsV4, PerTileInfo, ZONE_MAGIC};
use crate::core::Header;
use crate::util::{Error, Result};
use crate::view::ByteView;

/// First version with the wider header.
pub const ZONE_V4: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoneHeader {
    V1 {
        version: u32,
        offsets: OffsetsV1,
        per_tile: PerTileInfo,
        chunk_info: ChunkInfo,
    },
    V4 {
        version: u32,
        unknown: u32,
        offsets: OffsetsV4,
        per_tile: PerTileInfo,
        chunk_info: ChunkInfo,
    },
}

/// Section offsets common to every version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionOffsets {
    pub ecos: usize,
    pub floras: usize,
    pub invis_walls: usize,
    pub objects: usize,
    pub lights: usize,
    pub unknown: usize,
    pub decals: Option<usize>,
}

impl ZoneHeader {
    pub fn parse(view: ByteView<'_>) -> Result<Self> {
        let Header { version, .. } = Header::parse(view, ZONE_MAGIC)?;
        match version {
            // No shipped zone uses version 0; the engine would read it as V1.
            0 => Err(Error::UnsupportedVersion { record: "Zone", version }),
            v if v < ZONE_V4 => Ok(Self::V1 {
                version,
                offsets: view.read(8)?,
                per_tile: view.read(32)?,
                chunk_info: view.read(48)?,
            }),
            _ => Ok(Self::V4 {
                version,
                unknown: view.u32(8)?,
                offsets: view.read(12)?,
                per_tile: view.read(40)?,
                chunk_info: view.read(56)?,
            }),
        }
    }

    pub fn version(&self) -> u32 {
        match *self {
            Self::V1 { version, .. } | Self::V4 { version, .. } => version,
        }
    }

    pub fn per_tile(&self) -> PerTileInfo {
        match *self {
            Self::V1 { per_tile, .. } | Self::V4 { per_tile, .. } => per_tile,
        }
    }

    pub fn chunk_info(&self) -> ChunkInfo {
        match *self {
            Self::V1 { chunk_info, .. } | Self::V4 { chunk_info, .. } => chunk_info,
        }
    }

    /// The `u32` ahead of the offsets, version 4 and later.
    pub fn unknown(&self) -> Option<u32> {
        match *self {
            Self::V1 { .. } => None,
            Self::V4 { unknown, .. } => Some(unknown),
        }
    }

    pub fn offsets(&self) -> SectionOffsets {
        match *self {
            Self::V1 { offsets: o, .. } => SectionOffsets {
                ecos: o.ecos as usize,
                floras: o.floras as usize,
                invis_walls: o.invis_walls as usize,
                objects: o.objects as usize,
                lights: o.lights as usize,
                unknown: o.unknown as usize,
                decals: None,
            },
            Self::V4 { offsets: o, .. } => SectionOffsets {
                ecos: o.ecos as usize,
                floras: o.floras as usize,
                invis_walls: o.invis_walls as usize,
                objects: o.objects as usize,
                lights: o.lights as usize,
                unknown: o.unknown as usize,
                decals: Some(o.decals as usize),
            },
        }
    }

    /// Bytes the header occupies.
    pub fn size(&self) -> usize {
        match self {
            Self::V1 { .. } => 68,
            Self::V4 { .. } => 76,
        }
    }
}
