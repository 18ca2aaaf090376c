//! DME meshes: vertex streams and an index buffer.

use tracing::trace;

use crate::core::Record;
use crate::util::{Error, Result};
use crate::view::{ByteView, PodArray};

/// Size of the fixed mesh header.
pub const MESH_HEADER_SIZE: usize = 32;

/// One interleaved vertex stream.
#[derive(Clone, Copy, Debug)]
pub struct VertexStream<'a> {
    pub stride: u32,
    pub data: ByteView<'a>,
}

/// Index buffer of either width.
#[derive(Clone, Copy, Debug)]
pub enum IndexBuffer<'a> {
    U16(PodArray<'a, u16>),
    U32(PodArray<'a, u32>),
}

impl<'a> IndexBuffer<'a> {
    pub fn len(&self) -> usize {
        match self {
            Self::U16(a) => a.len(),
            Self::U32(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index `i`, widened.
    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            Self::U16(a) => a.get(i).map(u32::from),
            Self::U32(a) => a.get(i),
        }
    }

    pub fn to_vec(&self) -> Vec<u32> {
        match self {
            Self::U16(a) => a.iter().map(u32::from).collect(),
            Self::U32(a) => a.to_vec(),
        }
    }
}

/// A mesh inside a DME.
#[derive(Clone, Debug)]
pub struct Mesh<'a> {
    view: ByteView<'a>,
    draw_offset: u32,
    draw_count: u32,
    bone_count: u32,
    unknown: u32,
    index_size: u32,
    vertex_count: u32,
    streams: Vec<VertexStream<'a>>,
    indices: IndexBuffer<'a>,
}

impl<'a> Mesh<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("Mesh");
        let stream_count = view.len32(16)?;
        let index_size = view.u32(20)?;
        let index_count = view.len32(24)?;
        let vertex_count = view.u32(28)?;

        let mut streams = Vec::with_capacity(stream_count.min(view.size() / 4));
        let mut offset = MESH_HEADER_SIZE;
        for _ in 0..stream_count {
            let stride = view.u32(offset)?;
            let len = (stride as usize)
                .checked_mul(vertex_count as usize)
                .ok_or_else(|| view.out_of_range(offset + 4, usize::MAX))?;
            streams.push(VertexStream { stride, data: view.window(offset + 4, len)? });
            offset += 4 + len;
        }

        let width = (index_size & 0xFF) as usize;
        let (indices, end) = match width {
            2 => {
                let a = view.array::<u16>(offset, index_count)?;
                (IndexBuffer::U16(a), offset + a.byte_len())
            }
            4 => {
                let a = view.array::<u32>(offset, index_count)?;
                (IndexBuffer::U32(a), offset + a.byte_len())
            }
            other => return Err(Error::invalid(format!("mesh index width {} (size field {:#x})", other, index_size))),
        };
        trace!(streams = streams.len(), vertex_count, index_count, "mesh");

        Ok(Self {
            view: view.truncate(end)?,
            draw_offset: view.u32(0)?,
            draw_count: view.u32(4)?,
            bone_count: view.u32(8)?,
            unknown: view.u32(12)?,
            index_size,
            vertex_count,
            streams,
            indices,
        })
    }

    #[inline]
    pub fn draw_offset(&self) -> u32 {
        self.draw_offset
    }

    #[inline]
    pub fn draw_count(&self) -> u32 {
        self.draw_count
    }

    #[inline]
    pub fn bone_count(&self) -> u32 {
        self.bone_count
    }

    #[inline]
    pub fn unknown(&self) -> u32 {
        self.unknown
    }

    /// Raw index size field; the low byte is the index width.
    #[inline]
    pub fn index_size(&self) -> u32 {
        self.index_size
    }

    #[inline]
    pub fn index_width(&self) -> usize {
        (self.index_size & 0xFF) as usize
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[inline]
    pub fn vertex_streams(&self) -> &[VertexStream<'a>] {
        &self.streams
    }

    pub fn vertex_stream(&self, i: usize) -> Option<ByteView<'a>> {
        self.streams.get(i).map(|s| s.data)
    }

    pub fn bytes_per_vertex(&self, i: usize) -> Option<u32> {
        self.streams.get(i).map(|s| s.stride)
    }

    /// Raw index bytes.
    pub fn index_data(&self) -> &'a [u8] {
        match self.indices {
            IndexBuffer::U16(a) => a.as_bytes(),
            IndexBuffer::U32(a) => a.as_bytes(),
        }
    }

    #[inline]
    pub fn indices(&self) -> IndexBuffer<'a> {
        self.indices
    }
}

impl<'a> Record<'a> for Mesh<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}
