//! Animation formats.
//!
//! - [`Mrn`] - Packet container: skeletons, file names, NSA clips
//! - [`SkeletonData`] / [`Skeleton`] - Bind pose and the built bone tree
//! - [`NsaFile`] - Quantized clip with static, dynamic and root segments
//! - [`dequant`] - Quantization formulas shared by the segments

pub mod dequant;
mod string_table;
mod file_data;
mod skeleton;
mod nsa;
mod packet;
mod mrn;

pub use dequant::{DequantizationFactors, DequantizationInfo, QuantizedVec3};
pub use string_table::{ExpandedStringTable, StringTable};
pub use file_data::FileData;
pub use skeleton::{Bone, BoneHierarchyEntry, BoneTransform, OrientationData, Skeleton, SkeletonData};
pub use nsa::{DequantizedAnimation, DynamicSegment, NsaFile, RootRotation, RootSegment, StaticSegment};
pub use packet::{Packet, PacketHeader, PacketKind, PacketType, PACKET_HEADER_SIZE};
pub use mrn::{Mrn, PACKET_ALIGNMENT};
