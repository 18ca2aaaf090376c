//! Skeleton packets and bone hierarchy construction.
//!
//! A Skeleton payload stores bind-pose locals as parallel arrays and the
//! hierarchy as "chains": runs of consecutive bone indices where each bone
//! parents the next, the first one hanging off the chain's parent.
//! [`Skeleton::build`] turns that into an explicit tree with global
//! transforms.

use std::collections::VecDeque;

use bytemuck::{Pod, Zeroable};
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::string_table::StringTable;
use crate::core::Record;
use crate::util::{Error, Float4, Mat4, Quat, Result, Vec3, Vec4};
use crate::view::{ByteView, PodArray};

/// Offset of the chain array in a skeleton payload.
const CHAINS_OFFSET: usize = 128;

/// Pointers in an orientation block are relative to this base.
const ORIENTATION_PTR_BASE: usize = 16;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct BoneHierarchyEntry {
    pub unknown: i32,
    pub parent_index: i32,
    pub start_index: i32,
    pub chain_length: i32,
}

/// Bind-pose local offsets and rotations.
#[derive(Clone, Copy, Debug)]
pub struct OrientationData<'a> {
    view: ByteView<'a>,
    alignment: u32,
    element_count: u32,
    full: bool,
    element_type: u32,
    offsets: PodArray<'a, Float4>,
    rotations: PodArray<'a, Float4>,
}

impl<'a> OrientationData<'a> {
    pub fn parse(view: ByteView<'a>, bone_count: usize) -> Result<Self> {
        let view = view.with_label("OrientationData");
        let data_length = view.len32(16)?;
        let transforms = view.offset(view.ptr64(48)?, ORIENTATION_PTR_BASE)?;
        let offsets_ptr = view.offset(view.ptr64(transforms)?, ORIENTATION_PTR_BASE)?;
        let rotations_ptr = view.offset(view.ptr64(transforms + 8)?, ORIENTATION_PTR_BASE)?;

        Ok(Self {
            alignment: view.u32(20)?,
            element_count: view.u32(24)?,
            full: view.bool(28)?,
            element_type: view.u32(32)?,
            offsets: view.array::<Float4>(offsets_ptr, bone_count)?,
            rotations: view.array::<Float4>(rotations_ptr, bone_count)?,
            view: view.truncate(16 + data_length)?,
        })
    }

    #[inline]
    pub fn alignment(&self) -> u32 {
        self.alignment
    }

    #[inline]
    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    #[inline]
    pub fn full(&self) -> bool {
        self.full
    }

    #[inline]
    pub fn element_type(&self) -> u32 {
        self.element_type
    }

    /// Local offsets; `w` is unused.
    #[inline]
    pub fn offsets(&self) -> PodArray<'a, Float4> {
        self.offsets
    }

    /// Local rotations, `xyzw`.
    #[inline]
    pub fn rotations(&self) -> PodArray<'a, Float4> {
        self.rotations
    }
}

impl<'a> Record<'a> for OrientationData<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

/// Skeleton packet payload.
#[derive(Clone, Debug)]
pub struct SkeletonData<'a> {
    view: ByteView<'a>,
    rotation: Quat,
    position: Vec4,
    bone_count: u32,
    end_data_ptr: u64,
    bone_names: StringTable<'a>,
    orientations: OrientationData<'a>,
    chains: PodArray<'a, BoneHierarchyEntry>,
}

impl<'a> SkeletonData<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("SkeletonData");
        let chain_count = view.len32(32)?;
        let bone_count = view.u32(view.ptr64(48)?)?;
        let bone_names = StringTable::parse(view.tail(view.ptr64(64)?)?)?;
        let orientation_ptr = view.offset(view.ptr64(72)?, ORIENTATION_PTR_BASE)?;
        let orientations = OrientationData::parse(view.tail(orientation_ptr)?, bone_count as usize)?;
        let chains = view.array::<BoneHierarchyEntry>(CHAINS_OFFSET, chain_count)?;

        debug!(
            bones = bone_count,
            chains = chain_count,
            name = bone_names.get(1).unwrap_or(""),
            "parsed skeleton"
        );
        Ok(Self {
            view,
            rotation: view.read::<Float4>(0)?.to_quat(),
            position: view.read::<Float4>(16)?.to_vec4(),
            bone_count,
            end_data_ptr: view.u64(88)?,
            bone_names,
            orientations,
            chains,
        })
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    pub fn position(&self) -> Vec4 {
        self.position
    }

    #[inline]
    pub fn bone_count(&self) -> u32 {
        self.bone_count
    }

    #[inline]
    pub fn end_data_ptr(&self) -> u64 {
        self.end_data_ptr
    }

    #[inline]
    pub fn bone_names(&self) -> &StringTable<'a> {
        &self.bone_names
    }

    #[inline]
    pub fn orientations(&self) -> &OrientationData<'a> {
        &self.orientations
    }

    #[inline]
    pub fn chains(&self) -> PodArray<'a, BoneHierarchyEntry> {
        self.chains
    }
}

impl<'a> Record<'a> for SkeletonData<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

// ============================================================================
// Hierarchy
// ============================================================================

/// A bone of a built skeleton.
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub name: String,
    pub index: u32,
    pub position: Vec3,
    pub rotation: Quat,
    pub parent: Option<u32>,
    pub children: SmallVec<[u32; 4]>,
    pub global_transform: Mat4,
}

impl Bone {
    /// Bind-pose local transform.
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_quat(self.rotation)
    }
}

/// Local translation and rotation of one bone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl BoneTransform {
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * Mat4::from_quat(self.rotation)
    }
}

/// Bone tree with bind-pose globals.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    /// Parent-before-child order.
    order: Vec<u32>,
}

impl Skeleton {
    pub fn build(data: &SkeletonData<'_>) -> Result<Self> {
        let names = data.bone_names().strings();
        let offsets: Vec<Vec3> = data.orientations().offsets().iter().map(|o| o.to_vec4().truncate()).collect();
        let rotations: Vec<Quat> = data.orientations().rotations().iter().map(Float4::to_quat).collect();
        let chains = data.chains().to_vec();
        Self::from_hierarchy(names, &chains, &offsets, &rotations)
    }

    /// Build from already-decoded parts; `offsets` sets the bone count.
    pub fn from_hierarchy(
        names: &[&str],
        chains: &[BoneHierarchyEntry],
        offsets: &[Vec3],
        rotations: &[Quat],
    ) -> Result<Self> {
        let count = offsets.len();
        if rotations.len() != count {
            return Err(Error::invalid(format!(
                "skeleton has {} offsets but {} rotations",
                count,
                rotations.len()
            )));
        }

        let mut bones: Vec<Bone> = (0..count)
            .map(|i| Bone {
                name: names.get(i).map_or_else(|| format!("bone_{}", i), |n| n.to_string()),
                index: i as u32,
                position: offsets[i],
                rotation: rotations[i],
                parent: None,
                children: SmallVec::new(),
                global_transform: Mat4::IDENTITY,
            })
            .collect();

        for (c, chain) in chains.iter().enumerate() {
            let start = usize::try_from(chain.start_index).ok();
            let len = usize::try_from(chain.chain_length).ok();
            let (Some(start), Some(len)) = (start, len) else {
                return Err(Error::invalid(format!("chain {}: negative start or length", c)));
            };
            if !matches!(start.checked_add(len), Some(end) if end <= count) {
                return Err(Error::invalid(format!(
                    "chain {} covers bones {}..{} of {}",
                    c,
                    start,
                    start.saturating_add(len),
                    count
                )));
            }
            let head_parent = match chain.parent_index {
                p if p < 0 => None,
                p if (p as usize) < count => Some(p as u32),
                p => return Err(Error::invalid(format!("chain {} parent {} out of range", c, p))),
            };
            for i in 0..len {
                let bone = start + i;
                bones[bone].parent = if i == 0 { head_parent } else { Some((bone - 1) as u32) };
            }
        }

        for i in 0..count {
            if let Some(p) = bones[i].parent {
                bones[p as usize].children.push(i as u32);
            }
        }

        // Breadth-first from the roots; anything unreached sits on a cycle.
        let mut order = Vec::with_capacity(count);
        let mut queue: VecDeque<u32> = bones.iter().filter(|b| b.parent.is_none()).map(|b| b.index).collect();
        while let Some(i) = queue.pop_front() {
            let bone = &bones[i as usize];
            let parent_global = bone.parent.map_or(Mat4::IDENTITY, |p| bones[p as usize].global_transform);
            let global = parent_global * bone.local_transform();
            let children = bone.children.clone();
            bones[i as usize].global_transform = global;
            order.push(i);
            queue.extend(children);
        }
        if order.len() != count {
            return Err(Error::invalid(format!(
                "bone hierarchy has a cycle ({} of {} bones reachable)",
                order.len(),
                count
            )));
        }
        trace!(bones = count, "built skeleton");

        Ok(Self { bones, order })
    }

    #[inline]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }

    pub fn roots(&self) -> impl Iterator<Item = &Bone> + '_ {
        self.bones.iter().filter(|b| b.parent.is_none())
    }

    /// Bone indices, parents before children.
    #[inline]
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    /// Bind-pose locals of every bone.
    pub fn bind_pose(&self) -> Vec<BoneTransform> {
        self.bones
            .iter()
            .map(|b| BoneTransform { translation: b.position, rotation: b.rotation })
            .collect()
    }

    /// Globals for a full set of local transforms (one per bone).
    pub fn global_transforms(&self, locals: &[BoneTransform]) -> Result<Vec<Mat4>> {
        if locals.len() != self.bones.len() {
            return Err(Error::invalid(format!(
                "pose has {} bones, skeleton has {}",
                locals.len(),
                self.bones.len()
            )));
        }
        let mut globals = vec![Mat4::IDENTITY; locals.len()];
        for &i in &self.order {
            let i = i as usize;
            let parent = self.bones[i].parent.map_or(Mat4::IDENTITY, |p| globals[p as usize]);
            globals[i] = parent * locals[i].to_mat4();
        }
        Ok(globals)
    }
}
