//! # Warpgate
//!
//! Zero-copy readers for the Forgelight engine's binary asset formats.
//!
//! Every parser walks a borrowed buffer through [`view::ByteView`]: record
//! extents are derived from their contents, nested children are parsed
//! eagerly, and nothing is copied except decompressed output and decoded
//! animation data.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math types
//! - [`view`] - Bounds-checked byte windows and typed arrays
//! - [`core`] - Headers, record walking, decompression, asset providers
//! - [`terrain`] - CNK0 geometry chunks and CNK1 texture chunks
//! - [`model`] - DME models, DMAT material tables, meshes, parameters
//! - [`anim`] - MRN animation networks, NSA clips, dequantization, skeletons
//! - [`zone`] - ZONE world files: ecos, floras, objects, lights
//!
//! ## Example
//!
//! ```ignore
//! use warpgate::prelude::*;
//!
//! let bytes = std::fs::read("Amerish_0_0.cnk0")?;
//! let data = ChunkContainer::parse(ByteView::new(&bytes))?.decompress()?;
//! let chunk = Cnk0::parse(ByteView::new(&data))?;
//!
//! for i in 0..chunk.render_batches().len() {
//!     println!("{:?}", chunk.render_batch_bounds(i));
//! }
//! ```

pub mod util;
pub mod view;
pub mod core;
pub mod terrain;
pub mod model;
pub mod anim;
pub mod zone;

// Re-export commonly used types
pub use util::{Error, Result};
pub use view::{ByteView, ByteViewMut, PodArray};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, Aabb};
    pub use crate::view::{ByteView, ByteViewMut, PodArray};
    pub use crate::core::{
        ChunkContainer, Header, Record, AssetBuffer, AssetProvider, DirectoryProvider, MemoryProvider,
        extract_asset, extract_or_passthrough,
    };
    pub use crate::terrain::{Cnk0, Cnk1, Tile};
    pub use crate::model::{Dme, Dmat, Mesh, Material, Parameter, Semantic};
    pub use crate::anim::{Mrn, NsaFile, Skeleton, Bone};
    pub use crate::zone::Zone;
}
