//! Core layer - shared framing and buffer handling.
//!
//! This module provides:
//! - [`Header`] - Magic + version gate used by the chunked formats
//! - [`Record`] / [`parse_sequence`] - Extent-derived record walking
//! - [`ChunkContainer`] and archive extraction - DEFLATE framings
//! - [`AssetBuffer`] / [`AssetProvider`] - Root buffers and named asset sources

mod header;
mod traits;
mod compression;
mod source;

pub use header::{Header, HEADER_SIZE};
pub use traits::{Record, parse_sequence};
pub use compression::{
    ChunkContainer, DecompressOptions,
    compress_chunk, compress_asset, extract_asset, extract_or_passthrough, is_archive_compressed,
    ARCHIVE_MAGIC, CHUNK_STREAM_OFFSET, DEFAULT_STAGING_SIZE,
};
pub use source::{AssetBuffer, AssetProvider, DirectoryProvider, MemoryProvider, extract_batch};
