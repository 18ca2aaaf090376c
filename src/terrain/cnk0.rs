//! CNK0 terrain geometry chunks.
//!
//! A decompressed CNK0 buffer is a header followed by ten back-to-back
//! sections. Only the tiles are variable-sized records; every other
//! section is a `u32` count followed by fixed-size entries. Section offsets
//! are resolved once in [`Cnk0Layout::compute`] and cached.

use tracing::{debug, info_span, warn};

use super::format::{
    CNK0_MAGIC, OPTIMIZED_DRAW_SIZE, RenderBatch, TILE_OCCLUDER_SIZE, Unknown, Vertex, VertexBounds,
};
use super::tile::Tile;
use crate::core::{Header, HEADER_SIZE, Record, parse_sequence};
use crate::util::{Result, Vec3};
use crate::view::{ByteView, PodArray};

/// Start offset of every CNK0 section, plus the end of the last one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cnk0Layout {
    pub tiles: usize,
    pub unk1: usize,
    pub unknowns: usize,
    pub indices: usize,
    pub vertices: usize,
    pub render_batches: usize,
    pub optimized_draws: usize,
    pub unk_shorts: usize,
    pub unk_vectors: usize,
    pub tile_occluders: usize,
    pub end: usize,
}

/// Parsed CNK0 chunk.
#[derive(Clone, Debug)]
pub struct Cnk0<'a> {
    view: ByteView<'a>,
    header: Header,
    layout: Cnk0Layout,
    tiles: Vec<Tile<'a>>,
    unk1: u32,
    unknowns: PodArray<'a, Unknown>,
    indices: PodArray<'a, u16>,
    vertices: PodArray<'a, Vertex>,
    render_batches: PodArray<'a, RenderBatch>,
    optimized_draws: PodArray<'a, [u8; 64]>,
    unk_shorts: PodArray<'a, u16>,
    unk_vectors: PodArray<'a, Vec3>,
    tile_occluders: PodArray<'a, [u8; TILE_OCCLUDER_SIZE]>,
    bounds: Vec<VertexBounds>,
    trailing: usize,
}

/// Count-prefixed run of opaque `stride`-byte entries.
///
/// Returned as 64-byte rows so bytemuck only ever sees a supported array size.
fn opaque_section<'a>(
    view: &ByteView<'a>,
    offset: usize,
    stride: usize,
) -> Result<(PodArray<'a, [u8; 64]>, usize)> {
    let count = view.len32(offset)?;
    let rows = count
        .checked_mul(stride / 64)
        .ok_or_else(|| view.out_of_range(offset + 4, usize::MAX))?;
    let array = view.array::<[u8; 64]>(offset + 4, rows)?;
    Ok((array, offset + 4 + array.byte_len()))
}

impl Cnk0Layout {
    /// Walk the sections of `view`, returning the layout and the tiles
    /// (which must be parsed to find where they end).
    fn compute<'a>(view: &ByteView<'a>) -> Result<(Self, Vec<Tile<'a>>)> {
        let mut layout = Self { tiles: HEADER_SIZE, ..Self::default() };
        let tile_count = view.len32(layout.tiles)?;
        let (tiles, end) = parse_sequence(*view, layout.tiles + 4, tile_count, Tile::parse)?;

        layout.unk1 = end;
        layout.unknowns = layout.unk1 + 4;
        layout.indices = view.counted_array::<Unknown>(layout.unknowns)?.1;
        layout.vertices = view.counted_array::<u16>(layout.indices)?.1;
        layout.render_batches = view.counted_array::<Vertex>(layout.vertices)?.1;
        layout.optimized_draws = view.counted_array::<RenderBatch>(layout.render_batches)?.1;
        layout.unk_shorts = opaque_section(view, layout.optimized_draws, OPTIMIZED_DRAW_SIZE)?.1;
        layout.unk_vectors = view.counted_array::<u16>(layout.unk_shorts)?.1;
        layout.tile_occluders = view.counted_array::<Vec3>(layout.unk_vectors)?.1;
        layout.end = view.counted_array::<[u8; TILE_OCCLUDER_SIZE]>(layout.tile_occluders)?.1;
        Ok((layout, tiles))
    }
}

impl<'a> Cnk0<'a> {
    /// Parse a decompressed CNK0 buffer.
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("CNK0");
        let header = Header::parse(view, CNK0_MAGIC)?;
        let _span = info_span!("cnk0", version = header.version).entered();

        let (layout, tiles) = Cnk0Layout::compute(&view)?;
        let trailing = view.size() - layout.end;
        if trailing > 0 {
            warn!(trailing, "CNK0 has bytes past its last section");
        }

        let vertices = view.counted_array::<Vertex>(layout.vertices)?.0;
        let render_batches = view.counted_array::<RenderBatch>(layout.render_batches)?.0;
        let bounds = render_batches
            .iter()
            .map(|batch| batch_bounds(&view, &vertices, &batch, layout.vertices + 4))
            .collect::<Result<Vec<_>>>()?;

        let chunk = Self {
            header,
            tiles,
            unk1: view.u32(layout.unk1)?,
            unknowns: view.counted_array(layout.unknowns)?.0,
            indices: view.counted_array(layout.indices)?.0,
            vertices,
            render_batches,
            optimized_draws: opaque_section(&view, layout.optimized_draws, OPTIMIZED_DRAW_SIZE)?.0,
            unk_shorts: view.counted_array(layout.unk_shorts)?.0,
            unk_vectors: view.counted_array(layout.unk_vectors)?.0,
            tile_occluders: view.counted_array(layout.tile_occluders)?.0,
            bounds,
            trailing,
            view: view.truncate(layout.end)?,
            layout,
        };
        debug!(
            tiles = chunk.tiles.len(),
            vertices = chunk.vertices.len(),
            indices = chunk.indices.len(),
            batches = chunk.render_batches.len(),
            "parsed CNK0"
        );
        Ok(chunk)
    }

    #[inline]
    pub fn header(&self) -> Header {
        self.header
    }

    /// Cached section offsets.
    #[inline]
    pub fn layout(&self) -> &Cnk0Layout {
        &self.layout
    }

    #[inline]
    pub fn tiles(&self) -> &[Tile<'a>] {
        &self.tiles
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn unk1(&self) -> u32 {
        self.unk1
    }

    #[inline]
    pub fn unknowns(&self) -> PodArray<'a, Unknown> {
        self.unknowns
    }

    #[inline]
    pub fn indices(&self) -> PodArray<'a, u16> {
        self.indices
    }

    #[inline]
    pub fn vertices(&self) -> PodArray<'a, Vertex> {
        self.vertices
    }

    #[inline]
    pub fn render_batches(&self) -> PodArray<'a, RenderBatch> {
        self.render_batches
    }

    #[inline]
    pub fn render_batch_count(&self) -> usize {
        self.render_batches.len()
    }

    pub fn optimized_draw_count(&self) -> usize {
        self.optimized_draws.len() * 64 / OPTIMIZED_DRAW_SIZE
    }

    /// Raw bytes of optimized draw `i`.
    pub fn optimized_draw(&self, i: usize) -> Option<&'a [u8]> {
        let start = i.checked_mul(OPTIMIZED_DRAW_SIZE)?;
        self.optimized_draws.as_bytes().get(start..start + OPTIMIZED_DRAW_SIZE)
    }

    #[inline]
    pub fn unk_shorts(&self) -> PodArray<'a, u16> {
        self.unk_shorts
    }

    #[inline]
    pub fn unk_vectors(&self) -> PodArray<'a, Vec3> {
        self.unk_vectors
    }

    #[inline]
    pub fn tile_occluders(&self) -> PodArray<'a, [u8; TILE_OCCLUDER_SIZE]> {
        self.tile_occluders
    }

    /// Vertex extremes of render batch `i`.
    pub fn render_batch_bounds(&self, i: usize) -> Option<VertexBounds> {
        self.bounds.get(i).copied()
    }

    pub fn render_batch_index_total(&self) -> u64 {
        self.render_batches.iter().map(|b| b.index_count as u64).sum()
    }

    pub fn render_batch_vertex_total(&self) -> u64 {
        self.render_batches.iter().map(|b| b.vertex_count as u64).sum()
    }

    /// Bytes of the source buffer not covered by any section.
    #[inline]
    pub fn trailing_bytes(&self) -> usize {
        self.trailing
    }
}

impl<'a> Record<'a> for Cnk0<'a> {
    fn size(&self) -> usize {
        self.layout.end
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

fn batch_bounds(
    view: &ByteView<'_>,
    vertices: &PodArray<'_, Vertex>,
    batch: &RenderBatch,
    vertices_offset: usize,
) -> Result<VertexBounds> {
    let start = batch.vertex_offset as usize;
    let count = batch.vertex_count as usize;
    if start.checked_add(count).map_or(true, |end| end > vertices.len()) {
        let stride = std::mem::size_of::<Vertex>();
        let offset = vertices_offset.saturating_add(start.saturating_mul(stride));
        return Err(view.out_of_range(offset, count.saturating_mul(stride)));
    }
    let mut bounds = VertexBounds::EMPTY;
    for v in vertices.iter().skip(start).take(count) {
        bounds.expand(&v);
    }
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Error;

    fn push_u32(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    fn vertex_bytes(x: i16, y: i16, h: i16) -> [u8; 16] {
        bytemuck::cast(Vertex { x, y, height_near: h, height_far: h * 2, color1: 0xFF00FF00, color2: 1 })
    }

    /// Chunk with no tiles, one batch over three vertices.
    fn minimal_chunk(batch_vertex_count: u32) -> Vec<u8> {
        let mut buf = b"CNK0".to_vec();
        push_u32(&mut buf, 2); // version
        push_u32(&mut buf, 0); // tiles
        push_u32(&mut buf, 99); // unk1
        push_u32(&mut buf, 1); // unknowns
        buf.extend_from_slice(&[1, 0, 2, 3]);
        push_u32(&mut buf, 3); // indices
        for i in [0u16, 1, 2] {
            buf.extend_from_slice(&i.to_le_bytes());
        }
        push_u32(&mut buf, 3); // vertices
        buf.extend_from_slice(&vertex_bytes(0, 10, 5));
        buf.extend_from_slice(&vertex_bytes(-4, 2, 7));
        buf.extend_from_slice(&vertex_bytes(8, -6, 1));
        push_u32(&mut buf, 1); // render batches
        for v in [0, 3, 0, batch_vertex_count] {
            push_u32(&mut buf, v);
        }
        push_u32(&mut buf, 1); // optimized draws
        buf.extend_from_slice(&[0xAB; OPTIMIZED_DRAW_SIZE]);
        push_u32(&mut buf, 0); // unk shorts
        push_u32(&mut buf, 1); // unk vectors
        for f in [1.0f32, 2.0, 3.0] {
            buf.extend_from_slice(&f.to_le_bytes());
        }
        push_u32(&mut buf, 2); // occluders
        buf.extend_from_slice(&[0u8; 2 * TILE_OCCLUDER_SIZE]);
        buf
    }

    #[test]
    fn test_sections_cover_buffer() {
        let buf = minimal_chunk(3);
        let chunk = Cnk0::parse(ByteView::new(&buf)).unwrap();
        assert_eq!(chunk.size(), buf.len());
        assert_eq!(chunk.trailing_bytes(), 0);
        assert_eq!(chunk.unk1(), 99);
        assert_eq!(chunk.unknowns().get(0), Some(Unknown { unk_short: 1, unk_byte1: 2, unk_byte2: 3 }));
        assert_eq!(chunk.indices().to_vec(), vec![0, 1, 2]);
        assert_eq!(chunk.optimized_draw_count(), 1);
        assert_eq!(chunk.optimized_draw(0).unwrap()[319], 0xAB);
        assert!(chunk.optimized_draw(1).is_none());
        assert_eq!(chunk.unk_vectors().get(0), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(chunk.tile_occluders().len(), 2);

        let layout = chunk.layout();
        assert_eq!(layout.tiles, 8);
        assert_eq!(layout.unk1, 12);
        assert_eq!(layout.vertices, layout.indices + 4 + 6);
        assert_eq!(layout.end, buf.len());
    }

    #[test]
    fn test_render_batch_bounds() {
        let buf = minimal_chunk(3);
        let chunk = Cnk0::parse(ByteView::new(&buf)).unwrap();
        let bounds = chunk.render_batch_bounds(0).unwrap();
        assert_eq!((bounds.min.x, bounds.min.y, bounds.min.height_near), (-4, -6, 1));
        assert_eq!((bounds.max.x, bounds.max.y, bounds.max.height_near), (8, 10, 7));
        assert_eq!(bounds.max.height_far, 14);
        assert!(chunk.render_batch_bounds(1).is_none());
        assert_eq!(chunk.render_batch_index_total(), 3);
        assert_eq!(chunk.render_batch_vertex_total(), 3);
    }

    #[test]
    fn test_batch_past_vertex_array() {
        let buf = minimal_chunk(4);
        assert!(matches!(Cnk0::parse(ByteView::new(&buf)), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut buf = minimal_chunk(3);
        buf.extend_from_slice(&[0; 5]);
        let chunk = Cnk0::parse(ByteView::new(&buf)).unwrap();
        assert_eq!(chunk.trailing_bytes(), 5);
        assert_eq!(chunk.size(), buf.len() - 5);
    }

    #[test]
    fn test_wrong_magic() {
        let mut buf = minimal_chunk(3);
        buf[..4].copy_from_slice(b"CNK1");
        assert!(matches!(Cnk0::parse(ByteView::new(&buf)), Err(Error::MagicMismatch { .. })));
    }
}
