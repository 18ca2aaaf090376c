//! Decompression framings.
//!
//! Two framings wrap DEFLATE data in Forgelight assets:
//!
//! ## Chunk container
//!
//! ```text
//! @0   magic[4]
//! @4   version           u32
//! @8   decompressed_size u32
//! @12  compressed_size   u32   counts itself; stream is compressed_size - 4 bytes
//! @16  raw DEFLATE stream
//! ```
//!
//! [`ChunkContainer::decompress`] yields the 8-byte magic/version header
//! followed by exactly `decompressed_size` inflated bytes, which is the
//! buffer the terrain parsers expect.
//!
//! ## Archive extraction
//!
//! ```text
//! @0   0xA1B2C3D4        u32 big-endian
//! @4   decompressed_size u32 big-endian
//! @8   zlib stream
//! ```

use std::borrow::Cow;
use std::io::Write;

use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::{Compression, Decompress, FlushDecompress, Status};
use tracing::{debug, trace};

use super::header::{Header, HEADER_SIZE};
use crate::util::{DecompressionKind, Error, Result};
use crate::view::ByteView;

/// Offset of the DEFLATE stream in a chunk container.
pub const CHUNK_STREAM_OFFSET: usize = 16;

/// Signature of archive-compressed assets.
pub const ARCHIVE_MAGIC: u32 = 0xA1B2_C3D4;

/// Size of the archive-extraction prefix.
pub const ARCHIVE_PREFIX_SIZE: usize = 8;

/// Default staging buffer for chunk inflation.
pub const DEFAULT_STAGING_SIZE: usize = 1 << 20;

/// Tuning for [`ChunkContainer::decompress_with`].
#[derive(Clone, Debug)]
pub struct DecompressOptions {
    /// Bytes inflated per step.
    pub staging_size: usize,
}

impl Default for DecompressOptions {
    fn default() -> Self {
        Self { staging_size: DEFAULT_STAGING_SIZE }
    }
}

fn reserve(total: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve_exact(total).map_err(|e| {
        Error::decompression(DecompressionKind::Memory, format!("cannot allocate {} bytes: {}", total, e))
    })?;
    Ok(out)
}

/// A compressed terrain (or other) chunk.
#[derive(Clone, Copy, Debug)]
pub struct ChunkContainer<'a> {
    view: ByteView<'a>,
    header: Header,
    decompressed_size: u32,
    compressed_size: u32,
}

impl<'a> ChunkContainer<'a> {
    /// Parse the container prefix, accepting any signature.
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("chunk container");
        let header = Header::peek(view)?;
        Self::finish(view, header)
    }

    /// Parse the container prefix, requiring `magic`.
    pub fn parse_expecting(view: ByteView<'a>, magic: &[u8; 4]) -> Result<Self> {
        let view = view.with_label("chunk container");
        let header = Header::parse(view, magic)?;
        Self::finish(view, header)
    }

    fn finish(view: ByteView<'a>, header: Header) -> Result<Self> {
        let decompressed_size = view.u32(8)?;
        let compressed_size = view.u32(12)?;
        if compressed_size < 4 {
            return Err(Error::decompression(
                DecompressionKind::Buffer,
                format!("compressed size {} is smaller than its own field", compressed_size),
            ));
        }
        Ok(Self { view, header, decompressed_size, compressed_size })
    }

    pub fn header(&self) -> Header {
        self.header
    }

    pub fn decompressed_size(&self) -> u32 {
        self.decompressed_size
    }

    pub fn compressed_size(&self) -> u32 {
        self.compressed_size
    }

    /// The raw DEFLATE stream.
    pub fn stream(&self) -> Result<&'a [u8]> {
        self.view.bytes(CHUNK_STREAM_OFFSET, self.compressed_size as usize - 4)
    }

    /// Inflate with default options.
    pub fn decompress(&self) -> Result<Vec<u8>> {
        self.decompress_with(&DecompressOptions::default())
    }

    /// Copy the header, then inflate through a staging buffer until the stream ends.
    pub fn decompress_with(&self, options: &DecompressOptions) -> Result<Vec<u8>> {
        let declared = self.decompressed_size as usize;
        let total = HEADER_SIZE + declared;
        debug!(
            magic = %self.header.magic_str(),
            compressed = self.compressed_size,
            decompressed = declared,
            "inflating chunk"
        );

        let mut out = reserve(total)?;
        out.extend_from_slice(self.view.bytes(0, HEADER_SIZE)?);

        let input = self.stream()?;
        let mut inflater = Decompress::new(false);
        let mut staging = vec![0u8; options.staging_size.max(1)];

        loop {
            let consumed = inflater.total_in() as usize;
            let produced_before = inflater.total_out();
            let status = inflater
                .decompress(&input[consumed..], &mut staging, FlushDecompress::None)
                .map_err(|e| Error::decompression(DecompressionKind::Data, e.to_string()))?;
            let produced = (inflater.total_out() - produced_before) as usize;

            if out.len() + produced > total {
                return Err(Error::decompression(
                    DecompressionKind::Buffer,
                    format!("stream inflates past the declared {} bytes", declared),
                ));
            }
            out.extend_from_slice(&staging[..produced]);
            trace!(produced, total_out = inflater.total_out(), "inflate step");

            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    if produced == 0 && inflater.total_in() as usize == consumed {
                        return Err(Error::decompression(
                            DecompressionKind::Buffer,
                            format!("stream truncated after {} of {} bytes", consumed, input.len()),
                        ));
                    }
                }
            }
        }

        if out.len() != total {
            return Err(Error::decompression(
                DecompressionKind::Buffer,
                format!("inflated {} bytes, header declares {}", out.len() - HEADER_SIZE, declared),
            ));
        }
        Ok(out)
    }
}

/// Build a chunk container around `data` (raw DEFLATE).
pub fn compress_chunk(magic: &[u8; 4], version: u32, data: &[u8], level: Compression) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), level);
    encoder.write_all(data)?;
    let stream = encoder.finish()?;

    let mut out = Vec::with_capacity(CHUNK_STREAM_OFFSET + stream.len());
    out.extend_from_slice(magic);
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&(stream.len() as u32 + 4).to_le_bytes());
    out.extend_from_slice(&stream);
    Ok(out)
}

/// Check for the archive-extraction signature.
pub fn is_archive_compressed(data: &[u8]) -> bool {
    ByteView::new(data).u32_be(0).map(|m| m == ARCHIVE_MAGIC).unwrap_or(false)
}

/// Inflate an archive-compressed asset in one shot.
pub fn extract_asset(data: &[u8]) -> Result<Vec<u8>> {
    let view = ByteView::labeled(data, "archive asset");
    let magic = view.u32_be(0)?;
    if magic != ARCHIVE_MAGIC {
        return Err(Error::MagicMismatch {
            record: "archive asset",
            expected: ARCHIVE_MAGIC.to_be_bytes(),
            found: magic.to_be_bytes(),
        });
    }
    let declared = view.u32_be(4)? as usize;
    let input = view.tail(ARCHIVE_PREFIX_SIZE)?.as_bytes();

    let mut out = reserve(declared)?;
    let mut inflater = Decompress::new(true);
    let status = inflater
        .decompress_vec(input, &mut out, FlushDecompress::Finish)
        .map_err(|e| Error::decompression(DecompressionKind::Data, e.to_string()))?;

    if status != Status::StreamEnd || out.len() != declared {
        return Err(Error::decompression(
            DecompressionKind::Buffer,
            format!("inflated {} bytes, header declares {}", out.len(), declared),
        ));
    }
    debug!(compressed = input.len(), decompressed = declared, "extracted asset");
    Ok(out)
}

/// Inflate archive-compressed assets, pass anything else through untouched.
pub fn extract_or_passthrough(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    if is_archive_compressed(data) {
        Ok(Cow::Owned(extract_asset(data)?))
    } else {
        Ok(Cow::Borrowed(data))
    }
}

/// Wrap `data` in the archive-extraction framing.
pub fn compress_asset(data: &[u8], level: Compression) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), level);
    encoder.write_all(data)?;
    let stream = encoder.finish()?;

    let mut out = Vec::with_capacity(ARCHIVE_PREFIX_SIZE + stream.len());
    out.extend_from_slice(&ARCHIVE_MAGIC.to_be_bytes());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(&stream);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        b"Tile data that should compress well when repeated. ".repeat(200)
    }

    #[test]
    fn test_chunk_round_trip() {
        let original = sample();
        let packed = compress_chunk(b"CNK0", 2, &original, Compression::default()).unwrap();
        let chunk = ChunkContainer::parse_expecting(ByteView::new(&packed), b"CNK0").unwrap();
        assert_eq!(chunk.header().version, 2);
        assert_eq!(chunk.decompressed_size() as usize, original.len());

        let out = chunk.decompress().unwrap();
        assert_eq!(&out[..4], b"CNK0");
        assert_eq!(&out[4..8], &2u32.to_le_bytes());
        assert_eq!(&out[HEADER_SIZE..], &original[..]);
    }

    #[test]
    fn test_chunk_small_staging_buffer() {
        let original = sample();
        let packed = compress_chunk(b"CNK1", 1, &original, Compression::best()).unwrap();
        let chunk = ChunkContainer::parse(ByteView::new(&packed)).unwrap();
        let out = chunk.decompress_with(&DecompressOptions { staging_size: 7 }).unwrap();
        assert_eq!(&out[HEADER_SIZE..], &original[..]);
    }

    #[test]
    fn test_chunk_wrong_magic() {
        let packed = compress_chunk(b"CNK1", 1, b"abc", Compression::fast()).unwrap();
        let err = ChunkContainer::parse_expecting(ByteView::new(&packed), b"CNK0").unwrap_err();
        assert!(matches!(err, Error::MagicMismatch { .. }));
    }

    #[test]
    fn test_chunk_truncated_stream() {
        let original = sample();
        let mut packed = compress_chunk(b"CNK0", 1, &original, Compression::default()).unwrap();
        let cut = (packed.len() - CHUNK_STREAM_OFFSET) / 2;
        packed.truncate(CHUNK_STREAM_OFFSET + cut);
        let new_size = (cut + 4) as u32;
        packed[12..16].copy_from_slice(&new_size.to_le_bytes());

        let err = ChunkContainer::parse(ByteView::new(&packed)).unwrap().decompress().unwrap_err();
        assert!(matches!(err, Error::Decompression { kind: DecompressionKind::Buffer, .. }));
    }

    #[test]
    fn test_chunk_declared_size_too_small() {
        let original = sample();
        let mut packed = compress_chunk(b"CNK0", 1, &original, Compression::default()).unwrap();
        packed[8..12].copy_from_slice(&10u32.to_le_bytes());
        let err = ChunkContainer::parse(ByteView::new(&packed)).unwrap().decompress().unwrap_err();
        assert!(matches!(err, Error::Decompression { kind: DecompressionKind::Buffer, .. }));
    }

    #[test]
    fn test_chunk_corrupt_stream() {
        let mut packed = Vec::new();
        packed.extend_from_slice(b"CNK0");
        packed.extend_from_slice(&1u32.to_le_bytes());
        packed.extend_from_slice(&64u32.to_le_bytes());
        packed.extend_from_slice(&20u32.to_le_bytes());
        packed.extend_from_slice(&[0xff; 16]);
        let err = ChunkContainer::parse(ByteView::new(&packed)).unwrap().decompress().unwrap_err();
        assert!(matches!(err, Error::Decompression { kind: DecompressionKind::Data, .. }));
    }

    #[test]
    fn test_chunk_stream_past_window() {
        let mut packed = compress_chunk(b"CNK0", 1, b"hello", Compression::default()).unwrap();
        packed[12..16].copy_from_slice(&1000u32.to_le_bytes());
        let chunk = ChunkContainer::parse(ByteView::new(&packed)).unwrap();
        assert!(matches!(chunk.decompress(), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_archive_round_trip() {
        let original = sample();
        let packed = compress_asset(&original, Compression::default()).unwrap();
        assert!(is_archive_compressed(&packed));
        assert_eq!(extract_asset(&packed).unwrap(), original);
    }

    #[test]
    fn test_archive_wrong_magic() {
        let err = extract_asset(b"\xA1\xB2\xC3\xD5\0\0\0\x01x").unwrap_err();
        assert!(matches!(err, Error::MagicMismatch { .. }));
    }

    #[test]
    fn test_archive_length_mismatch() {
        let mut packed = compress_asset(b"twelve bytes", Compression::default()).unwrap();
        packed[4..8].copy_from_slice(&4u32.to_be_bytes());
        let err = extract_asset(&packed).unwrap_err();
        assert!(matches!(err, Error::Decompression { kind: DecompressionKind::Buffer, .. }));
    }

    #[test]
    fn test_archive_corrupt() {
        let err = extract_asset(b"\xA1\xB2\xC3\xD4\0\0\0\x10\xff\xff\xff\xff").unwrap_err();
        assert!(matches!(err, Error::Decompression { kind: DecompressionKind::Data, .. }));
    }

    #[test]
    fn test_passthrough() {
        let plain = b"DMOD\x04\0\0\0";
        assert!(matches!(extract_or_passthrough(plain).unwrap(), Cow::Borrowed(_)));
    }
}
