//! CNK1 terrain texture chunks.

use tracing::{debug, warn};

use super::format::CNK1_MAGIC;
use crate::core::{Header, HEADER_SIZE, Record, parse_sequence};
use crate::util::Result;
use crate::view::ByteView;

/// Number of length-prefixed blobs in a texture record.
pub const TEXTURE_BLOBS: usize = 6;

/// One texture record: six length-prefixed blobs.
///
/// The first two are the colour/normal-x and specular/normal-y images;
/// the remaining four are unidentified.
#[derive(Clone, Copy, Debug)]
pub struct Texture<'a> {
    view: ByteView<'a>,
    blobs: [ByteView<'a>; TEXTURE_BLOBS],
}

impl<'a> Texture<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("Texture");
        let mut blobs = [ByteView::labeled(&[], "Texture"); TEXTURE_BLOBS];
        let mut offset = 0;
        for blob in blobs.iter_mut() {
            let len = view.len32(offset)?;
            *blob = view.window(offset + 4, len)?;
            offset += 4 + len;
        }
        Ok(Self { view: view.truncate(offset)?, blobs })
    }

    #[inline]
    pub fn color_nx(&self) -> ByteView<'a> {
        self.blobs[0]
    }

    #[inline]
    pub fn specular_ny(&self) -> ByteView<'a> {
        self.blobs[1]
    }

    /// Unidentified blob `i` (0..4).
    pub fn extra(&self, i: usize) -> Option<ByteView<'a>> {
        self.blobs.get(2 + i).copied()
    }

    #[inline]
    pub fn blobs(&self) -> &[ByteView<'a>; TEXTURE_BLOBS] {
        &self.blobs
    }
}

impl<'a> Record<'a> for Texture<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

/// Parsed CNK1 chunk.
#[derive(Clone, Debug)]
pub struct Cnk1<'a> {
    view: ByteView<'a>,
    header: Header,
    textures: Vec<Texture<'a>>,
}

impl<'a> Cnk1<'a> {
    /// Parse a decompressed CNK1 buffer.
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("CNK1");
        let header = Header::parse(view, CNK1_MAGIC)?;
        let count = view.len32(HEADER_SIZE)?;
        let (textures, end) = parse_sequence(view, HEADER_SIZE + 4, count, Texture::parse)?;
        if end < view.size() {
            warn!(trailing = view.size() - end, "CNK1 has bytes past its last texture");
        }
        debug!(version = header.version, textures = textures.len(), "parsed CNK1");
        Ok(Self { view: view.truncate(end)?, header, textures })
    }

    #[inline]
    pub fn header(&self) -> Header {
        self.header
    }

    #[inline]
    pub fn textures(&self) -> &[Texture<'a>] {
        &self.textures
    }

    #[inline]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl<'a> Record<'a> for Cnk1<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}
