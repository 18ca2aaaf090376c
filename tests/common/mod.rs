//! Little-endian fixture writer shared by the integration tests.

#![allow(dead_code)]

#[derive(Default)]
pub struct Writer {
    pub buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.bytes(&v.to_le_bytes())
    }

    pub fn f32s(&mut self, vs: &[f32]) -> &mut Self {
        for &v in vs {
            self.f32(v);
        }
        self
    }

    pub fn u32_be(&mut self, v: u32) -> &mut Self {
        self.bytes(&v.to_be_bytes())
    }

    /// NUL-terminated string.
    pub fn cstr(&mut self, s: &str) -> &mut Self {
        self.bytes(s.as_bytes()).u8(0)
    }

    /// Length-prefixed blob.
    pub fn blob(&mut self, data: &[u8]) -> &mut Self {
        self.u32(data.len() as u32).bytes(data)
    }

    pub fn zeros(&mut self, n: usize) -> &mut Self {
        self.buf.resize(self.buf.len() + n, 0);
        self
    }

    /// Zero-fill up to `offset`.
    pub fn pad_to(&mut self, offset: usize) -> &mut Self {
        assert!(offset >= self.buf.len(), "pad_to {} behind cursor {}", offset, self.buf.len());
        self.buf.resize(offset, 0);
        self
    }

    /// Overwrite a u32 already written at `offset`.
    pub fn patch_u32(&mut self, offset: usize, v: u32) -> &mut Self {
        self.buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
        self
    }

    pub fn patch_u64(&mut self, offset: usize, v: u64) -> &mut Self {
        self.buf[offset..offset + 8].copy_from_slice(&v.to_le_bytes());
        self
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}
