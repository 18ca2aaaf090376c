//! DME model files.
//!
//! Layout, in order: header, embedded DMAT (length-prefixed), model bounds,
//! meshes, draw calls, bone map, bones. Only the meshes are self-sizing;
//! everything after them is located once the last mesh is parsed.

use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use tracing::{debug, info_span};

use super::dmat::Dmat;
use super::mesh::Mesh;
use crate::core::{Header, Record, parse_sequence};
use crate::util::{Aabb, Mat4, Result, Vec4};
use crate::view::{ByteView, PodArray};

/// Magic of a model file.
pub const DME_MAGIC: &[u8; 4] = b"DMOD";

/// Offset of the embedded material table.
const DMAT_OFFSET: usize = 12;

/// Affine matrix stored as four columns of three floats.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PackedMat4 {
    pub cols: [[f32; 3]; 4],
}

impl PackedMat4 {
    /// Expand to a full matrix with `(0, 0, 0, 1)` as the last row.
    pub fn to_mat4(&self) -> Mat4 {
        let c = &self.cols;
        Mat4::from_cols(
            Vec4::new(c[0][0], c[0][1], c[0][2], 0.0),
            Vec4::new(c[1][0], c[1][1], c[1][2], 0.0),
            Vec4::new(c[2][0], c[2][1], c[2][2], 0.0),
            Vec4::new(c[3][0], c[3][1], c[3][2], 1.0),
        )
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawCall {
    pub unk0: u32,
    pub bone_start: u32,
    pub bone_count: u32,
    pub delta: u32,
    pub unk1: u32,
    pub vertex_offset: u32,
    pub vertex_count: u32,
    pub index_offset: u32,
    pub index_count: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct BoneMapEntry {
    pub bone_index: u16,
    pub global_index: u16,
}

/// A skinning bone: inverse bind matrix, bounds and name hash.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bone {
    pub inverse_bind_matrix: PackedMat4,
    pub bbox: Aabb,
    pub namehash: u32,
}

impl Bone {
    /// Whether this bone's hash is the OAAT hash of `name`, upper-cased.
    pub fn is_named(&self, name: &str) -> bool {
        jenkins::oaat_uppercase(name) == self.namehash
    }
}

/// Parsed DME model.
#[derive(Clone, Debug)]
pub struct Dme<'a> {
    view: ByteView<'a>,
    header: Header,
    dmat: Dmat<'a>,
    aabb: Aabb,
    meshes: Vec<Mesh<'a>>,
    drawcalls: PodArray<'a, DrawCall>,
    bone_map: PodArray<'a, BoneMapEntry>,
    bone_matrices: PodArray<'a, PackedMat4>,
    bone_bounds: PodArray<'a, Aabb>,
    bone_hashes: PodArray<'a, u32>,
}

impl<'a> Dme<'a> {
    /// Parse a model using its embedded material table.
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("DME");
        let header = Header::parse(view, DME_MAGIC)?;
        let dmat_len = view.len32(8)?;
        let dmat = Dmat::parse(view.window(DMAT_OFFSET, dmat_len)?)?;
        Self::parse_body(view, header, dmat)
    }

    /// Parse a model but use `dmat` instead of the embedded table.
    ///
    /// The embedded block is still skipped by its declared length.
    pub fn with_material_table(view: ByteView<'a>, dmat: Dmat<'a>) -> Result<Self> {
        let view = view.with_label("DME");
        let header = Header::parse(view, DME_MAGIC)?;
        Self::parse_body(view, header, dmat)
    }

    fn parse_body(view: ByteView<'a>, header: Header, dmat: Dmat<'a>) -> Result<Self> {
        let _span = info_span!("dme", version = header.version).entered();

        let aabb_offset = DMAT_OFFSET + view.len32(8)?;
        let aabb = view.read::<Aabb>(aabb_offset)?;
        let meshes_offset = aabb_offset + size_of::<Aabb>();
        let mesh_count = view.len32(meshes_offset)?;
        let (meshes, drawcall_offset) = parse_sequence(view, meshes_offset + 4, mesh_count, Mesh::parse)?;

        let (drawcalls, bone_map_offset) = view.counted_array::<DrawCall>(drawcall_offset)?;
        let (bone_map, bones_offset) = view.counted_array::<BoneMapEntry>(bone_map_offset)?;

        let bone_count = view.len32(bones_offset)?;
        let bone_matrices = view.array::<PackedMat4>(bones_offset + 4, bone_count)?;
        let bounds_offset = bones_offset + 4 + bone_matrices.byte_len();
        let bone_bounds = view.array::<Aabb>(bounds_offset, bone_count)?;
        let hashes_offset = bounds_offset + bone_bounds.byte_len();
        let bone_hashes = view.array::<u32>(hashes_offset, bone_count)?;
        let end = hashes_offset + bone_hashes.byte_len();

        debug!(
            meshes = meshes.len(),
            drawcalls = drawcalls.len(),
            bones = bone_count,
            materials = dmat.materials().len(),
            "parsed DME"
        );
        Ok(Self {
            view: view.truncate(end)?,
            header,
            dmat,
            aabb,
            meshes,
            drawcalls,
            bone_map,
            bone_matrices,
            bone_bounds,
            bone_hashes,
        })
    }

    #[inline]
    pub fn header(&self) -> Header {
        self.header
    }

    #[inline]
    pub fn dmat(&self) -> &Dmat<'a> {
        &self.dmat
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    #[inline]
    pub fn meshes(&self) -> &[Mesh<'a>] {
        &self.meshes
    }

    #[inline]
    pub fn drawcalls(&self) -> PodArray<'a, DrawCall> {
        self.drawcalls
    }

    #[inline]
    pub fn bone_map(&self) -> PodArray<'a, BoneMapEntry> {
        self.bone_map
    }

    /// Skeleton bone for a draw-call-local bone index, or 0 when unmapped.
    pub fn map_bone(&self, index: u16) -> u16 {
        self.bone_map.get(index as usize).map(|e| e.bone_index).unwrap_or(0)
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bone_hashes.len()
    }

    pub fn bone(&self, i: usize) -> Option<Bone> {
        Some(Bone {
            inverse_bind_matrix: self.bone_matrices.get(i)?,
            bbox: self.bone_bounds.get(i)?,
            namehash: self.bone_hashes.get(i)?,
        })
    }

    pub fn bones(&self) -> impl Iterator<Item = Bone> + '_ {
        (0..self.bone_count()).filter_map(move |i| self.bone(i))
    }

    /// Index of the bone called `name`.
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        let hash = jenkins::oaat_uppercase(name);
        self.bone_hashes.iter().position(|h| h == hash)
    }
}

impl<'a> Record<'a> for Dme<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Vec3;

    #[test]
    fn test_record_sizes() {
        assert_eq!(size_of::<PackedMat4>(), 48);
        assert_eq!(size_of::<DrawCall>(), 36);
        assert_eq!(size_of::<BoneMapEntry>(), 4);
        assert_eq!(size_of::<Aabb>(), 24);
    }

    #[test]
    fn test_packed_mat4() {
        let packed = PackedMat4 {
            cols: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [3.0, 4.0, 5.0]],
        };
        let m = packed.to_mat4();
        assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(m.row(3), Vec4::new(0.0, 0.0, 0.0, 1.0));
    }
}
