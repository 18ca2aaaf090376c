//! Terrain tiles and their eco/flora children.

use tracing::trace;

use super::format::Layer;
use crate::core::{Record, parse_sequence};
use crate::util::Result;
use crate::view::{ByteView, PodArray};

/// Offset of the first eco inside a tile.
const TILE_ECOS_OFFSET: usize = 20;

/// Flora: counted list of [`Layer`] entries.
#[derive(Clone, Copy, Debug)]
pub struct Flora<'a> {
    view: ByteView<'a>,
    layers: PodArray<'a, Layer>,
}

impl<'a> Flora<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("Flora");
        let (layers, end) = view.counted_array::<Layer>(0)?;
        Ok(Self { view: view.truncate(end)?, layers })
    }

    #[inline]
    pub fn layers(&self) -> PodArray<'a, Layer> {
        self.layers
    }
}

impl<'a> Record<'a> for Flora<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

/// Eco: id followed by its floras.
#[derive(Clone, Debug)]
pub struct Eco<'a> {
    view: ByteView<'a>,
    id: u32,
    floras: Vec<Flora<'a>>,
}

impl<'a> Eco<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("Eco");
        let id = view.u32(0)?;
        let count = view.len32(4)?;
        let (floras, end) = parse_sequence(view, 8, count, Flora::parse)?;
        Ok(Self { view: view.truncate(end)?, id, floras })
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn floras(&self) -> &[Flora<'a>] {
        &self.floras
    }
}

impl<'a> Record<'a> for Eco<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

/// One terrain tile of a CNK0 chunk.
///
/// Everything after the ecos floats on the ecos' total size, and the layer
/// block moves again depending on whether an image is embedded.
#[derive(Clone, Debug)]
pub struct Tile<'a> {
    view: ByteView<'a>,
    x: i32,
    y: i32,
    unk1: i32,
    unk2: i32,
    ecos: Vec<Eco<'a>>,
    index: u32,
    image_id: u32,
    image: Option<ByteView<'a>>,
    layer_offset: usize,
    layer_textures: ByteView<'a>,
}

impl<'a> Tile<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("Tile");
        let eco_count = view.len32(16)?;
        let (ecos, ecos_end) = parse_sequence(view, TILE_ECOS_OFFSET, eco_count, Eco::parse)?;
        let ecos_size = ecos_end - TILE_ECOS_OFFSET;

        let image_id = view.u32(24 + ecos_size)?;
        let (image, layer_offset) = if image_id != 0 {
            let image_len = view.len32(28 + ecos_size)?;
            let image = view.window(32 + ecos_size, image_len)?;
            (Some(image), 32 + ecos_size + image_len)
        } else {
            (None, 28 + ecos_size)
        };

        let layer_len = view.len32(layer_offset)?;
        let layer_textures = view.window(layer_offset + 4, layer_len)?;
        let view = view.truncate(layer_offset + 4 + layer_len)?;
        trace!(ecos = ecos.len(), has_image = image.is_some(), size = view.size(), "tile");

        Ok(Self {
            view,
            x: view.i32(0)?,
            y: view.i32(4)?,
            unk1: view.i32(8)?,
            unk2: view.i32(12)?,
            ecos,
            index: view.u32(20 + ecos_size)?,
            image_id,
            image,
            layer_offset,
            layer_textures,
        })
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn unk1(&self) -> i32 {
        self.unk1
    }

    #[inline]
    pub fn unk2(&self) -> i32 {
        self.unk2
    }

    #[inline]
    pub fn ecos(&self) -> &[Eco<'a>] {
        &self.ecos
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn image_id(&self) -> u32 {
        self.image_id
    }

    /// Embedded image bytes, present only when `image_id != 0`.
    #[inline]
    pub fn image(&self) -> Option<ByteView<'a>> {
        self.image
    }

    /// Offset of the layer block within the tile.
    #[inline]
    pub fn layer_offset(&self) -> usize {
        self.layer_offset
    }

    #[inline]
    pub fn layer_textures(&self) -> ByteView<'a> {
        self.layer_textures
    }
}

impl<'a> Record<'a> for Tile<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}
