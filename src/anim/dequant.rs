//! Quantized animation channels.
//!
//! Translations are stored as per-axis integers mapped back through
//! `extent * q + min`. Rotations reuse the same mapping to recover a
//! three-component vector `d`, then lift it onto the unit quaternion sphere:
//!
//! ```text
//! s = |d|^2,  k = 2 / (s + 1),  q = (k*d.x, k*d.y, k*d.z, (1 - s) / (1 + s))
//! ```
//!
//! All arithmetic is plain `f32` multiply-then-add so results match the
//! engine bit for bit. The `pack_*` functions are the inverse quantizers.

use bytemuck::{Pod, Zeroable};

use crate::util::{Quat, Vec3};

/// Quantized vector: three unsigned integers.
pub type QuantizedVec3 = [u16; 3];

/// Per-axis `(min, scaled_extent)` of a quantized channel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DequantizationFactors {
    pub min: [f32; 3],
    pub scaled_extent: [f32; 3],
}

impl DequantizationFactors {
    pub const fn new(min: [f32; 3], scaled_extent: [f32; 3]) -> Self {
        Self { min, scaled_extent }
    }

    /// Factors spanning `[min, max]` with `bits` bits per axis.
    pub fn from_range(min: Vec3, max: Vec3, bits: [u32; 3]) -> Self {
        let mut extent = [0.0f32; 3];
        for axis in 0..3 {
            let steps = ((1u32 << bits[axis]) - 1) as f32;
            extent[axis] = (max[axis] - min[axis]) / steps;
        }
        Self { min: min.to_array(), scaled_extent: extent }
    }

    /// Build factors taking each axis from a (possibly different) source.
    pub fn select(sources: [&DequantizationFactors; 3]) -> Self {
        let mut out = Self::default();
        for axis in 0..3 {
            out.min[axis] = sources[axis].min[axis];
            out.scaled_extent[axis] = sources[axis].scaled_extent[axis];
        }
        out
    }
}

/// Per-bone initial value and factor-table indices of a dynamic channel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DequantizationInfo {
    pub init: [u8; 3],
    pub factor_index: [u8; 3],
}

/// Factors of the initial-rotation encoding.
pub const INITIAL_ROTATION_FACTORS: DequantizationFactors =
    DequantizationFactors::new([-1.0, -1.0, -1.0], [1.0 / 128.0, 1.0 / 128.0, 1.0 / 128.0]);

/// Bit widths of the packed translation word.
pub const BITPACKED_BITS: [u32; 3] = [11, 11, 10];

#[inline]
pub fn unpack_translation(q: QuantizedVec3, f: &DequantizationFactors) -> Vec3 {
    Vec3::new(
        f.scaled_extent[0] * q[0] as f32 + f.min[0],
        f.scaled_extent[1] * q[1] as f32 + f.min[1],
        f.scaled_extent[2] * q[2] as f32 + f.min[2],
    )
}

/// Split an 11/11/10-bit packed word.
#[inline]
pub const fn unpack_bitpacked(v: u32) -> QuantizedVec3 {
    [(v >> 21) as u16, ((v >> 10) & 0x7FF) as u16, (v & 0x3FF) as u16]
}

#[inline]
pub fn unpack_bitpacked_translation(v: u32, f: &DequantizationFactors) -> Vec3 {
    unpack_translation(unpack_bitpacked(v), f)
}

pub fn unpack_rotation(q: QuantizedVec3, f: &DequantizationFactors) -> Quat {
    let d = unpack_translation(q, f);
    let s = d.x * d.x + d.y * d.y + d.z * d.z;
    let k = 2.0 / (s + 1.0);
    Quat::from_xyzw(k * d.x, k * d.y, k * d.z, (1.0 - s) / (1.0 + s))
}

pub fn unpack_initial_rotation(init: [u8; 3]) -> Quat {
    unpack_rotation([init[0] as u16, init[1] as u16, init[2] as u16], &INITIAL_ROTATION_FACTORS)
}

fn quantize_axis(value: f32, min: f32, extent: f32, max_q: u32) -> u16 {
    if extent == 0.0 {
        return 0;
    }
    let q = ((value - min) / extent).round();
    q.clamp(0.0, max_q as f32) as u16
}

/// Nearest 16-bit quantization of `v`.
pub fn pack_translation(v: Vec3, f: &DequantizationFactors) -> QuantizedVec3 {
    [
        quantize_axis(v.x, f.min[0], f.scaled_extent[0], u16::MAX as u32),
        quantize_axis(v.y, f.min[1], f.scaled_extent[1], u16::MAX as u32),
        quantize_axis(v.z, f.min[2], f.scaled_extent[2], u16::MAX as u32),
    ]
}

/// Nearest 11/11/10-bit packed quantization of `v`.
pub fn pack_bitpacked_translation(v: Vec3, f: &DequantizationFactors) -> u32 {
    let x = quantize_axis(v.x, f.min[0], f.scaled_extent[0], 0x7FF) as u32;
    let y = quantize_axis(v.y, f.min[1], f.scaled_extent[1], 0x7FF) as u32;
    let z = quantize_axis(v.z, f.min[2], f.scaled_extent[2], 0x3FF) as u32;
    (x << 21) | (y << 10) | z
}

/// Inverse of [`unpack_rotation`] for a unit quaternion.
///
/// `q` and `-q` encode the same rotation; the one with `w >= 0` is packed.
pub fn pack_rotation(q: Quat, f: &DequantizationFactors) -> QuantizedVec3 {
    let q = if q.w < 0.0 { -q } else { q };
    let d = Vec3::new(q.x, q.y, q.z) / (1.0 + q.w);
    pack_translation(d, f)
}
