//! Runtime objects and their placed instances.

use tracing::trace;

use super::format::{FloatMapEntry, UIntMapEntry, Vec4MapEntry};
use crate::core::{Record, parse_sequence};
use crate::util::{Float4, Result};
use crate::view::{ByteView, PodArray};

/// Translation, rotation and scale.
const INSTANCE_BASE_SIZE: usize = 48;

/// Version-specific trailer of an [`Instance`].
#[derive(Clone, Copy, Debug)]
pub enum InstanceTail<'a> {
    /// Versions 1 and 3, and any version without its own layout.
    V1 { unk_int: u32, unk_byte: u8, unk_float: f32 },
    V2 { unk_int: u32, unk_byte: u8, unk_byte2: u8, unk_float: f32 },
    V4 { unk_data: &'a [u8] },
    V5 {
        unk_data: &'a [u8],
        unk_float: f32,
        uint_map: PodArray<'a, UIntMapEntry>,
        float_map: PodArray<'a, FloatMapEntry>,
        unk_int: u32,
        vec4_map: PodArray<'a, Vec4MapEntry>,
        unk_data2: &'a [u8],
    },
}

impl<'a> InstanceTail<'a> {
    /// Parse a tail starting at `offset`; returns it and the end offset.
    fn parse(view: ByteView<'a>, offset: usize, version: u32) -> Result<(Self, usize)> {
        Ok(match version {
            2 => {
                let tail = Self::V2 {
                    unk_int: view.u32(offset)?,
                    unk_byte: view.u8(offset + 4)?,
                    unk_byte2: view.u8(offset + 5)?,
                    unk_float: view.f32(offset + 6)?,
                };
                (tail, offset + 10)
            }
            4 => (Self::V4 { unk_data: view.bytes(offset, 29)? }, offset + 29),
            5 => {
                let unk_data = view.bytes(offset, 5)?;
                let unk_float = view.f32(offset + 5)?;
                let (uint_map, next) = view.counted_array::<UIntMapEntry>(offset + 9)?;
                let (float_map, next) = view.counted_array::<FloatMapEntry>(next)?;
                let unk_int = view.u32(next)?;
                let (vec4_map, next) = view.counted_array::<Vec4MapEntry>(next + 4)?;
                let unk_data2 = view.bytes(next, 5)?;
                let tail = Self::V5 { unk_data, unk_float, uint_map, float_map, unk_int, vec4_map, unk_data2 };
                (tail, next + 5)
            }
            _ => {
                let tail = Self::V1 {
                    unk_int: view.u32(offset)?,
                    unk_byte: view.u8(offset + 4)?,
                    unk_float: view.f32(offset + 5)?,
                };
                (tail, offset + 9)
            }
        })
    }

    pub fn unk_float(&self) -> Option<f32> {
        match *self {
            Self::V1 { unk_float, .. } | Self::V2 { unk_float, .. } | Self::V5 { unk_float, .. } => Some(unk_float),
            Self::V4 { .. } => None,
        }
    }

    pub fn uint_map(&self) -> Option<PodArray<'a, UIntMapEntry>> {
        match self {
            Self::V5 { uint_map, .. } => Some(*uint_map),
            _ => None,
        }
    }

    pub fn float_map(&self) -> Option<PodArray<'a, FloatMapEntry>> {
        match self {
            Self::V5 { float_map, .. } => Some(*float_map),
            _ => None,
        }
    }

    pub fn vec4_map(&self) -> Option<PodArray<'a, Vec4MapEntry>> {
        match self {
            Self::V5 { vec4_map, .. } => Some(*vec4_map),
            _ => None,
        }
    }
}

/// One placement of a runtime object.
#[derive(Clone, Copy, Debug)]
pub struct Instance<'a> {
    view: ByteView<'a>,
    translation: Float4,
    rotation: Float4,
    scale: Float4,
    tail: InstanceTail<'a>,
}

impl<'a> Instance<'a> {
    pub fn parse(view: ByteView<'a>, version: u32) -> Result<Self> {
        let view = view.with_label("Instance");
        let [translation, rotation, scale] = view.read::<[Float4; 3]>(0)?;
        let (tail, end) = InstanceTail::parse(view, INSTANCE_BASE_SIZE, version)?;
        Ok(Self { view: view.truncate(end)?, translation, rotation, scale, tail })
    }

    #[inline]
    pub fn translation(&self) -> Float4 {
        self.translation
    }

    #[inline]
    pub fn rotation(&self) -> Float4 {
        self.rotation
    }

    #[inline]
    pub fn scale(&self) -> Float4 {
        self.scale
    }

    #[inline]
    pub fn tail(&self) -> &InstanceTail<'a> {
        &self.tail
    }
}

impl<'a> Record<'a> for Instance<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

/// An actor file and every place it is instanced.
#[derive(Clone, Debug)]
pub struct RuntimeObject<'a> {
    view: ByteView<'a>,
    actor_file: &'a str,
    render_distance: f32,
    instances: Vec<Instance<'a>>,
}

impl<'a> RuntimeObject<'a> {
    pub fn parse(view: ByteView<'a>, version: u32) -> Result<Self> {
        let view = view.with_label("RuntimeObject");
        let actor_file = view.cstr(0)?;
        let offset = actor_file.len() + 1;
        let render_distance = view.f32(offset)?;
        let count = view.len32(offset + 4)?;
        let (instances, end) = parse_sequence(view, offset + 8, count, |v| Instance::parse(v, version))?;
        trace!(actor_file, instances = instances.len(), "runtime object");
        Ok(Self { view: view.truncate(end)?, actor_file, render_distance, instances })
    }

    #[inline]
    pub fn actor_file(&self) -> &'a str {
        self.actor_file
    }

    #[inline]
    pub fn render_distance(&self) -> f32 {
        self.render_distance
    }

    #[inline]
    pub fn instances(&self) -> &[Instance<'a>] {
        &self.instances
    }
}

impl<'a> Record<'a> for RuntimeObject<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}
