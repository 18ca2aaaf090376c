//! NSA animation payloads.
//!
//! An NSA file splits a clip into up to three segments:
//!
//! - [`StaticSegment`] - one quantized value per bone that never moves
//! - [`DynamicSegment`] - per-sample values, with per-bone initial values and
//!   per-axis factor selection
//! - [`RootSegment`] - root motion per sample
//!
//! Parsing only locates the arrays; [`NsaFile::dequantize`] decodes them.

use tracing::{debug, trace};

use super::dequant::{
    unpack_bitpacked_translation, unpack_initial_rotation, unpack_rotation, unpack_translation,
    DequantizationFactors, DequantizationInfo, QuantizedVec3,
};
use super::skeleton::{BoneTransform, Skeleton};
use crate::core::Record;
use crate::util::{Error, Float4, Quat, Result, Vec3};
use crate::view::{ByteView, PodArray};

const QUANTIZED_SIZE: usize = 6;

#[inline]
fn ceil4(n: usize) -> usize {
    (n + 3) & !3
}

/// Pad a data extent the way segment sizes are stored: always by 1..=16.
#[inline]
fn pad16(view: &ByteView<'_>, len: usize) -> Result<usize> {
    view.offset(len, 16 - len % 16)
}

fn scaled_poses() -> Error {
    Error::UnimplementedFormat("scaled poses")
}

fn pointer_gap(view: &ByteView<'_>, hi: usize, lo: usize) -> Result<usize> {
    hi.checked_sub(lo).ok_or_else(|| {
        Error::invalid(format!("{}: data pointer {:#x} precedes {:#x}", view.label(), hi, lo))
    })
}

// ============================================================================
// Static segment
// ============================================================================

#[derive(Clone, Copy, Debug)]
pub struct StaticSegment<'a> {
    view: ByteView<'a>,
    translation_factors: DequantizationFactors,
    rotation_factors: DequantizationFactors,
    translation: PodArray<'a, QuantizedVec3>,
    rotation: PodArray<'a, QuantizedVec3>,
}

impl<'a> StaticSegment<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("StaticSegment");
        let tc = view.len32(0)?;
        let rc = view.len32(4)?;
        if view.u32(8)? != 0 {
            return Err(scaled_poses());
        }
        let t_ptr = view.ptr64(72)?;
        let r_ptr = view.ptr64(80)?;
        let s_ptr = view.ptr64(88)?;

        let t_len = view.extent(t_ptr, tc, QUANTIZED_SIZE)?;
        let r_len = view.extent(r_ptr, rc, QUANTIZED_SIZE)?;
        let extent = if s_ptr != 0 && t_ptr != 0 {
            pointer_gap(&view, s_ptr, t_ptr)?
        } else if r_ptr != 0 && t_ptr != 0 {
            view.offset(pointer_gap(&view, r_ptr, t_ptr)?, r_len)?
        } else if s_ptr != 0 && r_ptr != 0 {
            pointer_gap(&view, s_ptr, r_ptr)?
        } else if t_ptr != 0 {
            t_len
        } else if r_ptr != 0 {
            r_len
        } else {
            0
        };
        let size = view.offset(96, pad16(&view, extent)?)?;

        Ok(Self {
            translation_factors: view.read(12)?,
            rotation_factors: view.read(36)?,
            translation: view.array(t_ptr, tc)?,
            rotation: view.array(r_ptr, rc)?,
            view: view.truncate(size)?,
        })
    }

    #[inline]
    pub fn translation_factors(&self) -> DequantizationFactors {
        self.translation_factors
    }

    #[inline]
    pub fn rotation_factors(&self) -> DequantizationFactors {
        self.rotation_factors
    }

    #[inline]
    pub fn translation_data(&self) -> PodArray<'a, QuantizedVec3> {
        self.translation
    }

    #[inline]
    pub fn rotation_data(&self) -> PodArray<'a, QuantizedVec3> {
        self.rotation
    }
}

impl<'a> Record<'a> for StaticSegment<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

// ============================================================================
// Dynamic segment
// ============================================================================

#[derive(Clone, Debug)]
pub struct DynamicSegment<'a> {
    view: ByteView<'a>,
    sample_count: u32,
    padding: usize,
    translation_info: PodArray<'a, DequantizationInfo>,
    rotation_info: PodArray<'a, DequantizationInfo>,
    translation: Vec<PodArray<'a, u32>>,
    rotation: Vec<PodArray<'a, QuantizedVec3>>,
}

impl<'a> DynamicSegment<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("DynamicSegment");
        let sample_count = view.u32(0)?;
        let samples = sample_count as usize;
        let tbc = view.len32(4)?;
        let rbc = view.len32(8)?;
        if view.u32(12)? != 0 {
            return Err(scaled_poses());
        }
        let t_data = view.ptr64(16)?;
        let t_info = view.ptr64(24)?;
        let r_data = view.ptr64(32)?;
        let r_info = view.ptr64(40)?;

        // Rotation rows may carry trailing padding; recover it from the gap
        // between the rotation data and its info block.
        let padding = if rbc > 0 && samples > 0 {
            let period = view.extent(r_data, view.extent(r_data, samples, rbc)?, 2)?;
            (pointer_gap(&view, r_info, r_data)? % period) / samples
        } else {
            0
        };
        let t_stride = view.extent(t_data, tbc, 4)?;
        let r_stride = view.offset(view.extent(r_data, rbc, QUANTIZED_SIZE)?, padding)?;

        let cap = samples.min(view.size());
        let mut translation = Vec::with_capacity(if tbc > 0 { cap } else { 0 });
        let mut rotation = Vec::with_capacity(if rbc > 0 { cap } else { 0 });
        if tbc > 0 || rbc > 0 {
            for i in 0..samples {
                if tbc > 0 {
                    let row = view.offset(t_data, view.extent(t_data, t_stride, i)?)?;
                    translation.push(view.array::<u32>(row, tbc)?);
                }
                if rbc > 0 {
                    let row = view.offset(r_data, view.extent(r_data, r_stride, i)?)?;
                    rotation.push(view.array::<QuantizedVec3>(row, rbc)?);
                }
            }
        }

        let sample_bytes = view.extent(0, view.offset(t_stride, r_stride)?, samples)?;
        let info_bytes = view.extent(0, ceil4(tbc) + ceil4(rbc), QUANTIZED_SIZE)?;
        let length = pad16(&view, view.offset(sample_bytes, info_bytes)?)?;
        trace!(samples, tbc, rbc, padding, "dynamic segment");

        Ok(Self {
            sample_count,
            padding,
            translation_info: view.array(t_info, ceil4(tbc))?,
            rotation_info: view.array(r_info, ceil4(rbc))?,
            translation,
            rotation,
            view: view.truncate(view.offset(64, length)?)?,
        })
    }

    #[inline]
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Bytes between consecutive rotation rows beyond the row itself.
    #[inline]
    pub fn rotation_padding(&self) -> usize {
        self.padding
    }

    #[inline]
    pub fn translation_bone_count(&self) -> usize {
        self.translation.first().map_or(0, |s| s.len())
    }

    #[inline]
    pub fn rotation_bone_count(&self) -> usize {
        self.rotation.first().map_or(0, |s| s.len())
    }

    /// Bit-packed translations, one row per sample.
    #[inline]
    pub fn translation_data(&self) -> &[PodArray<'a, u32>] {
        &self.translation
    }

    #[inline]
    pub fn rotation_data(&self) -> &[PodArray<'a, QuantizedVec3>] {
        &self.rotation
    }

    /// Per-bone info, padded to a multiple of four entries.
    #[inline]
    pub fn translation_info(&self) -> PodArray<'a, DequantizationInfo> {
        self.translation_info
    }

    #[inline]
    pub fn rotation_info(&self) -> PodArray<'a, DequantizationInfo> {
        self.rotation_info
    }
}

impl<'a> Record<'a> for DynamicSegment<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

// ============================================================================
// Root segment
// ============================================================================

/// Rotation channel of a root segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RootRotation {
    /// Quantized per sample.
    Animated(DequantizationFactors),
    /// Held for the whole clip.
    Constant(Quat),
}

#[derive(Clone, Copy, Debug)]
pub struct RootSegment<'a> {
    view: ByteView<'a>,
    version: u32,
    data_length: u32,
    alignment: u32,
    sample_rate: f32,
    sample_count: u32,
    translation_factors: DequantizationFactors,
    rotation: RootRotation,
    translation_data: PodArray<'a, u32>,
    rotation_data: PodArray<'a, QuantizedVec3>,
}

impl<'a> RootSegment<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("RootSegment");
        let sample_count = view.u32(28)?;
        let t_ptr = view.ptr64(80)?;
        let r_ptr = view.ptr64(88)?;

        let (rotation, rotation_data): (_, PodArray<'a, QuantizedVec3>) = if r_ptr != 0 {
            (RootRotation::Animated(view.read(56)?), view.array(r_ptr, sample_count as usize)?)
        } else {
            (RootRotation::Constant(view.read::<Float4>(56)?.to_quat()), PodArray::empty())
        };
        let translation_data: PodArray<'a, u32> = if t_ptr != 0 {
            view.array(t_ptr, sample_count as usize)?
        } else {
            PodArray::empty()
        };
        let size = 96 + translation_data.byte_len() + rotation_data.byte_len();

        Ok(Self {
            version: view.u32(0)?,
            data_length: view.u32(16)?,
            alignment: view.u32(20)?,
            sample_rate: view.f32(24)?,
            sample_count,
            translation_factors: view.read(32)?,
            rotation,
            translation_data,
            rotation_data,
            view: view.truncate(size)?,
        })
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[inline]
    pub fn data_length(&self) -> u32 {
        self.data_length
    }

    #[inline]
    pub fn alignment(&self) -> u32 {
        self.alignment
    }

    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[inline]
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    #[inline]
    pub fn translation_factors(&self) -> DequantizationFactors {
        self.translation_factors
    }

    #[inline]
    pub fn rotation(&self) -> RootRotation {
        self.rotation
    }

    /// The held rotation when the channel is not animated.
    pub fn constant_rotation(&self) -> Option<Quat> {
        match self.rotation {
            RootRotation::Constant(q) => Some(q),
            RootRotation::Animated(_) => None,
        }
    }

    #[inline]
    pub fn translation_data(&self) -> PodArray<'a, u32> {
        self.translation_data
    }

    #[inline]
    pub fn rotation_data(&self) -> PodArray<'a, QuantizedVec3> {
        self.rotation_data
    }
}

impl<'a> Record<'a> for RootSegment<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

// ============================================================================
// NSA file
// ============================================================================

/// Decoded channels of an [`NsaFile`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DequantizedAnimation {
    /// One per bone in [`NsaFile::static_translation_bones`].
    pub static_translation: Vec<Vec3>,
    pub static_rotation: Vec<Quat>,
    /// `[sample][bone]`, bones as in [`NsaFile::dynamic_translation_bones`].
    pub dynamic_translation: Vec<Vec<Vec3>>,
    pub dynamic_rotation: Vec<Vec<Quat>>,
    pub root_translation: Vec<Vec3>,
    pub root_rotation: Vec<Quat>,
}

#[derive(Clone, Debug)]
pub struct NsaFile<'a> {
    view: ByteView<'a>,
    crc32: u32,
    version: u32,
    static_length: u32,
    alignment: u32,
    duration: f32,
    sample_rate: f32,
    bone_count: u32,
    animated_bone_count: u32,
    static_translation_bones: PodArray<'a, u16>,
    static_rotation_bones: PodArray<'a, u16>,
    static_scale_bones: PodArray<'a, u16>,
    dynamic_translation_bones: PodArray<'a, u16>,
    dynamic_rotation_bones: PodArray<'a, u16>,
    dynamic_scale_bones: PodArray<'a, u16>,
    initial_translation_factors: DequantizationFactors,
    translation_factors: PodArray<'a, DequantizationFactors>,
    rotation_factors: PodArray<'a, DequantizationFactors>,
    scale_factors: PodArray<'a, DequantizationFactors>,
    static_segment: Option<StaticSegment<'a>>,
    dynamic_segment: Option<DynamicSegment<'a>>,
    root_segment: Option<RootSegment<'a>>,
}

/// `u16` count followed by that many `u16` bone indices; a null pointer is
/// an empty list.
fn bone_list<'a>(view: &ByteView<'a>, ptr_offset: usize) -> Result<PodArray<'a, u16>> {
    let ptr = view.ptr64(ptr_offset)?;
    if ptr == 0 {
        return Ok(PodArray::empty());
    }
    let count = view.u16(ptr)? as usize;
    view.array(ptr + 2, count)
}

fn segment<'a, T>(view: &ByteView<'a>, ptr_offset: usize, parse: fn(ByteView<'a>) -> Result<T>) -> Result<Option<T>> {
    match view.ptr64(ptr_offset)? {
        0 => Ok(None),
        ptr => parse(view.tail(ptr)?).map(Some),
    }
}

fn factor_at(table: PodArray<'_, DequantizationFactors>, index: u8) -> Result<DequantizationFactors> {
    table
        .get(index as usize)
        .ok_or_else(|| Error::invalid(format!("factor index {} of {}", index, table.len())))
}

fn select_factors(table: PodArray<'_, DequantizationFactors>, info: &DequantizationInfo) -> Result<DequantizationFactors> {
    let [x, y, z] = info.factor_index;
    let (x, y, z) = (factor_at(table, x)?, factor_at(table, y)?, factor_at(table, z)?);
    Ok(DequantizationFactors::select([&x, &y, &z]))
}

fn info_at(info: PodArray<'_, DequantizationInfo>, bone: usize) -> Result<DequantizationInfo> {
    info.get(bone)
        .ok_or_else(|| Error::invalid(format!("no dequantization info for bone {}", bone)))
}

impl<'a> NsaFile<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("NSA");
        let nsa = Self {
            crc32: view.u32_be(0)?,
            version: view.u32(4)?,
            static_length: view.u32(16)?,
            alignment: view.u32(20)?,
            duration: view.f32(24)?,
            sample_rate: view.f32(28)?,
            bone_count: view.u32(32)?,
            animated_bone_count: view.u32(36)?,
            static_translation_bones: bone_list(&view, 40)?,
            static_rotation_bones: bone_list(&view, 48)?,
            static_scale_bones: bone_list(&view, 56)?,
            dynamic_translation_bones: bone_list(&view, 64)?,
            dynamic_rotation_bones: bone_list(&view, 72)?,
            dynamic_scale_bones: bone_list(&view, 80)?,
            initial_translation_factors: view.read(88)?,
            translation_factors: view.array(view.ptr64(136)?, view.len32(120)?)?,
            rotation_factors: view.array(view.ptr64(144)?, view.len32(124)?)?,
            scale_factors: view.array(view.ptr64(152)?, view.len32(128)?)?,
            static_segment: segment(&view, 160, StaticSegment::parse)?,
            dynamic_segment: segment(&view, 168, DynamicSegment::parse)?,
            root_segment: segment(&view, 176, RootSegment::parse)?,
            view,
        };
        debug!(
            crc32 = format_args!("{:#010x}", nsa.crc32),
            bones = nsa.bone_count,
            duration = nsa.duration,
            has_static = nsa.static_segment.is_some(),
            has_dynamic = nsa.dynamic_segment.is_some(),
            has_root = nsa.root_segment.is_some(),
            "parsed NSA"
        );
        Ok(nsa)
    }

    /// Identifying hash, matched against the FileNames table.
    #[inline]
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[inline]
    pub fn static_length(&self) -> u32 {
        self.static_length
    }

    #[inline]
    pub fn alignment(&self) -> u32 {
        self.alignment
    }

    /// Clip length in seconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[inline]
    pub fn bone_count(&self) -> u32 {
        self.bone_count
    }

    #[inline]
    pub fn animated_bone_count(&self) -> u32 {
        self.animated_bone_count
    }

    #[inline]
    pub fn static_translation_bones(&self) -> PodArray<'a, u16> {
        self.static_translation_bones
    }

    #[inline]
    pub fn static_rotation_bones(&self) -> PodArray<'a, u16> {
        self.static_rotation_bones
    }

    #[inline]
    pub fn static_scale_bones(&self) -> PodArray<'a, u16> {
        self.static_scale_bones
    }

    #[inline]
    pub fn dynamic_translation_bones(&self) -> PodArray<'a, u16> {
        self.dynamic_translation_bones
    }

    #[inline]
    pub fn dynamic_rotation_bones(&self) -> PodArray<'a, u16> {
        self.dynamic_rotation_bones
    }

    #[inline]
    pub fn dynamic_scale_bones(&self) -> PodArray<'a, u16> {
        self.dynamic_scale_bones
    }

    #[inline]
    pub fn initial_translation_factors(&self) -> DequantizationFactors {
        self.initial_translation_factors
    }

    #[inline]
    pub fn translation_factors(&self) -> PodArray<'a, DequantizationFactors> {
        self.translation_factors
    }

    #[inline]
    pub fn rotation_factors(&self) -> PodArray<'a, DequantizationFactors> {
        self.rotation_factors
    }

    #[inline]
    pub fn scale_factors(&self) -> PodArray<'a, DequantizationFactors> {
        self.scale_factors
    }

    #[inline]
    pub fn static_segment(&self) -> Option<&StaticSegment<'a>> {
        self.static_segment.as_ref()
    }

    #[inline]
    pub fn dynamic_segment(&self) -> Option<&DynamicSegment<'a>> {
        self.dynamic_segment.as_ref()
    }

    #[inline]
    pub fn root_segment(&self) -> Option<&RootSegment<'a>> {
        self.root_segment.as_ref()
    }

    /// Decode every present segment.
    pub fn dequantize(&self) -> Result<DequantizedAnimation> {
        let mut out = DequantizedAnimation::default();

        if let Some(seg) = &self.static_segment {
            let tf = seg.translation_factors();
            let rf = seg.rotation_factors();
            out.static_translation = seg.translation_data().iter().map(|q| unpack_translation(q, &tf)).collect();
            out.static_rotation = seg.rotation_data().iter().map(|q| unpack_rotation(q, &rf)).collect();
        }

        if let Some(seg) = &self.dynamic_segment {
            self.dequantize_dynamic(seg, &mut out)?;
        }

        if let Some(seg) = &self.root_segment {
            let tf = seg.translation_factors();
            out.root_translation = seg
                .translation_data()
                .iter()
                .map(|v| unpack_bitpacked_translation(v, &tf))
                .collect();
            if let RootRotation::Animated(rf) = seg.rotation() {
                out.root_rotation = seg.rotation_data().iter().map(|q| unpack_rotation(q, &rf)).collect();
            }
        }

        trace!(
            static_t = out.static_translation.len(),
            static_r = out.static_rotation.len(),
            dynamic_samples = out.dynamic_translation.len().max(out.dynamic_rotation.len()),
            root_samples = out.root_translation.len(),
            "dequantized NSA"
        );
        Ok(out)
    }

    fn dequantize_dynamic(&self, seg: &DynamicSegment<'a>, out: &mut DequantizedAnimation) -> Result<()> {
        let init = self.initial_translation_factors;

        let bones = seg.translation_bone_count();
        let mut factors = Vec::with_capacity(bones);
        let mut initial = Vec::with_capacity(bones);
        for bone in 0..bones {
            let info = info_at(seg.translation_info(), bone)?;
            factors.push(select_factors(self.translation_factors, &info)?);
            let [x, y, z] = info.init;
            initial.push(unpack_translation([x as u16, y as u16, z as u16], &init));
        }
        out.dynamic_translation = seg
            .translation_data()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(factors.iter().zip(&initial))
                    .map(|(v, (f, base))| unpack_bitpacked_translation(v, f) + *base)
                    .collect()
            })
            .collect();

        let bones = seg.rotation_bone_count();
        let mut factors = Vec::with_capacity(bones);
        let mut initial = Vec::with_capacity(bones);
        for bone in 0..bones {
            let info = info_at(seg.rotation_info(), bone)?;
            factors.push(select_factors(self.rotation_factors, &info)?);
            initial.push(unpack_initial_rotation(info.init));
        }
        out.dynamic_rotation = seg
            .rotation_data()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(factors.iter().zip(&initial))
                    .map(|(q, (f, base))| *base * unpack_rotation(q, f))
                    .collect()
            })
            .collect();
        Ok(())
    }

    /// Local transforms of every skeleton bone at `sample`.
    ///
    /// Bones the clip doesn't touch keep their bind pose. Samples past the
    /// end hold the last one.
    pub fn pose(&self, skeleton: &Skeleton, sample: usize) -> Result<Vec<BoneTransform>> {
        self.pose_from(&self.dequantize()?, skeleton, sample)
    }

    /// [`NsaFile::pose`] over channels already decoded by
    /// [`NsaFile::dequantize`].
    pub fn pose_from(
        &self,
        data: &DequantizedAnimation,
        skeleton: &Skeleton,
        sample: usize,
    ) -> Result<Vec<BoneTransform>> {
        let mut locals = skeleton.bind_pose();

        fn slot<'p>(locals: &'p mut [BoneTransform], bone: u16) -> Result<&'p mut BoneTransform> {
            let count = locals.len();
            locals
                .get_mut(bone as usize)
                .ok_or_else(|| Error::invalid(format!("animated bone {} outside skeleton of {}", bone, count)))
        }

        for (bone, t) in self.static_translation_bones.iter().zip(&data.static_translation) {
            slot(&mut locals, bone)?.translation = *t;
        }
        for (bone, r) in self.static_rotation_bones.iter().zip(&data.static_rotation) {
            slot(&mut locals, bone)?.rotation = *r;
        }
        if let Some(frame) = clamped(&data.dynamic_translation, sample) {
            for (bone, t) in self.dynamic_translation_bones.iter().zip(frame) {
                slot(&mut locals, bone)?.translation = *t;
            }
        }
        if let Some(frame) = clamped(&data.dynamic_rotation, sample) {
            for (bone, r) in self.dynamic_rotation_bones.iter().zip(frame) {
                slot(&mut locals, bone)?.rotation = *r;
            }
        }
        Ok(locals)
    }
}

fn clamped<T>(samples: &[T], index: usize) -> Option<&T> {
    samples.get(index.min(samples.len().checked_sub(1)?))
}

impl<'a> Record<'a> for NsaFile<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}
