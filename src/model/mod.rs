//! Model and material formats.
//!
//! - [`Dme`] - Model: embedded material table, meshes, draw calls, bones
//! - [`Dmat`] - Material table: texture names and materials
//! - [`Mesh`] - Vertex streams and index buffer
//! - [`Material`] / [`Parameter`] - Material parameters and texture slots

mod parameter;
mod material;
mod dmat;
mod mesh;
mod dme;

pub use parameter::{Parameter, ParameterClass, ParameterType, Semantic, PARAMETER_HEADER_SIZE};
pub use material::Material;
pub use dmat::{Dmat, DMAT_MAGIC};
pub use mesh::{IndexBuffer, Mesh, VertexStream, MESH_HEADER_SIZE};
pub use dme::{Bone, BoneMapEntry, Dme, DrawCall, PackedMat4, DME_MAGIC};
