//! Zero-copy, bounds-checked windows over a byte buffer.
//!
//! Every parser in this crate is written against [`ByteView`]: a borrowed
//! window (absolute base offset + length) into one root buffer owned by the
//! caller. Sub-windows share the root, so records never copy bytes and the
//! borrow checker guarantees the root outlives them.
//!
//! All multi-byte reads are little-endian except the explicit `*_be`
//! accessors. [`ByteView::read`] reinterprets a [`Pod`] record in host
//! order; the formats are little-endian so this matches on x86/ARM hosts.
//!
//! [`ByteViewMut`] is the writable counterpart. Writes land in the root
//! buffer, so any window derived from it afterwards sees them.

mod array;

pub use array::PodArray;

use std::mem::size_of;

use bytemuck::Pod;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::util::{Error, Result};

/// Read-only window into a root buffer.
#[derive(Clone, Copy)]
pub struct ByteView<'a> {
    bytes: &'a [u8],
    base: usize,
    label: &'static str,
}

impl<'a> ByteView<'a> {
    /// Wrap a whole root buffer.
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::labeled(bytes, "buffer")
    }

    /// Wrap a root buffer, naming the record for error messages.
    #[inline]
    pub fn labeled(bytes: &'a [u8], label: &'static str) -> Self {
        Self { bytes, base: 0, label }
    }

    /// Same window, different record name.
    #[inline]
    pub fn with_label(self, label: &'static str) -> Self {
        Self { label, ..self }
    }

    /// Window length in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Absolute offset of this window in the root buffer.
    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub(crate) fn out_of_range(&self, offset: usize, len: usize) -> Error {
        Error::OutOfRange {
            record: self.label,
            offset: self.base.saturating_add(offset),
            len,
            size: self.bytes.len(),
        }
    }

    #[inline]
    fn check(&self, offset: usize, len: usize) -> Result<usize> {
        match offset.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(end),
            _ => Err(self.out_of_range(offset, len)),
        }
    }

    /// `base + add` for offsets built from file fields.
    #[inline]
    pub fn offset(&self, base: usize, add: usize) -> Result<usize> {
        base.checked_add(add).ok_or_else(|| self.out_of_range(base, add))
    }

    /// `count * stride` bytes of data meant to start at `offset`.
    #[inline]
    pub fn extent(&self, offset: usize, count: usize, stride: usize) -> Result<usize> {
        count.checked_mul(stride).ok_or_else(|| self.out_of_range(offset, usize::MAX))
    }

    /// Raw bytes `[offset, offset + len)`.
    #[inline]
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = self.check(offset, len)?;
        Ok(&self.bytes[offset..end])
    }

    /// Reinterpret `size_of::<T>()` bytes at `offset` as `T`.
    #[inline]
    pub fn read<T: Pod>(&self, offset: usize) -> Result<T> {
        let bytes = self.bytes(offset, size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    #[inline]
    pub fn u8(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes(offset, 1)?[0])
    }

    #[inline]
    pub fn i8(&self, offset: usize) -> Result<i8> {
        Ok(self.u8(offset)? as i8)
    }

    /// One byte, nonzero means true.
    #[inline]
    pub fn bool(&self, offset: usize) -> Result<bool> {
        Ok(self.u8(offset)? != 0)
    }

    #[inline]
    pub fn u16(&self, offset: usize) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.bytes(offset, 2)?))
    }

    #[inline]
    pub fn i16(&self, offset: usize) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.bytes(offset, 2)?))
    }

    #[inline]
    pub fn u32(&self, offset: usize) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.bytes(offset, 4)?))
    }

    #[inline]
    pub fn i32(&self, offset: usize) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.bytes(offset, 4)?))
    }

    #[inline]
    pub fn u64(&self, offset: usize) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.bytes(offset, 8)?))
    }

    #[inline]
    pub fn f32(&self, offset: usize) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.bytes(offset, 4)?))
    }

    /// Big-endian `u32`, used by the byte-swapped hash fields.
    #[inline]
    pub fn u32_be(&self, offset: usize) -> Result<u32> {
        Ok(BigEndian::read_u32(self.bytes(offset, 4)?))
    }

    /// `u32` length/count field widened to `usize`.
    #[inline]
    pub fn len32(&self, offset: usize) -> Result<usize> {
        Ok(self.u32(offset)? as usize)
    }

    /// `u64` pointer field, relative to this window.
    pub fn ptr64(&self, offset: usize) -> Result<usize> {
        let value = self.u64(offset)?;
        usize::try_from(value).map_err(|_| self.out_of_range(offset, 8))
    }

    /// Zero-copy array of `count` records starting at `offset`.
    pub fn array<T: Pod>(&self, offset: usize, count: usize) -> Result<PodArray<'a, T>> {
        let len = self.extent(offset, count, size_of::<T>())?;
        Ok(PodArray::new(self.bytes(offset, len)?))
    }

    /// `u32` count at `offset` followed by that many records.
    ///
    /// Returns the array and the offset just past it.
    pub fn counted_array<T: Pod>(&self, offset: usize) -> Result<(PodArray<'a, T>, usize)> {
        let count = self.len32(offset)?;
        let array = self.array::<T>(offset + 4, count)?;
        Ok((array, offset + 4 + array.byte_len()))
    }

    /// Sub-window at `offset`; `None` extends to the end of this window.
    pub fn slice(&self, offset: usize, len: Option<usize>) -> Result<ByteView<'a>> {
        let len = match len {
            Some(len) => len,
            None => self.bytes.len().checked_sub(offset).ok_or_else(|| self.out_of_range(offset, 0))?,
        };
        let end = self.check(offset, len)?;
        Ok(ByteView {
            bytes: &self.bytes[offset..end],
            base: self.base + offset,
            label: self.label,
        })
    }

    #[inline]
    pub fn window(&self, offset: usize, len: usize) -> Result<ByteView<'a>> {
        self.slice(offset, Some(len))
    }

    #[inline]
    pub fn tail(&self, offset: usize) -> Result<ByteView<'a>> {
        self.slice(offset, None)
    }

    /// Shrink the window to its first `len` bytes.
    #[inline]
    pub fn truncate(&self, len: usize) -> Result<ByteView<'a>> {
        self.slice(0, Some(len))
    }

    /// NUL-terminated string at `offset`, without the terminator.
    pub fn cstr(&self, offset: usize) -> Result<&'a str> {
        let rest = self.bytes.get(offset..).ok_or_else(|| self.out_of_range(offset, 1))?;
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| self.out_of_range(offset, rest.len() + 1))?;
        std::str::from_utf8(&rest[..nul]).map_err(|_| Error::InvalidString {
            record: self.label,
            offset: self.base + offset,
        })
    }

    /// First four bytes.
    #[inline]
    pub fn magic(&self) -> Result<[u8; 4]> {
        self.read::<[u8; 4]>(0)
    }

    /// Fail with [`Error::MagicMismatch`] unless the window starts with `expected`.
    pub fn expect_magic(&self, expected: &[u8; 4]) -> Result<()> {
        let found = self.magic()?;
        if &found != expected {
            return Err(Error::MagicMismatch {
                record: self.label,
                expected: *expected,
                found,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for ByteView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteView")
            .field("label", &self.label)
            .field("base", &self.base)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Writable window into a root buffer.
pub struct ByteViewMut<'a> {
    bytes: &'a mut [u8],
    base: usize,
    label: &'static str,
}

impl<'a> ByteViewMut<'a> {
    #[inline]
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self::labeled(bytes, "buffer")
    }

    #[inline]
    pub fn labeled(bytes: &'a mut [u8], label: &'static str) -> Self {
        Self { bytes, base: 0, label }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    /// Read-only view of the same window.
    #[inline]
    pub fn as_view(&self) -> ByteView<'_> {
        ByteView { bytes: self.bytes, base: self.base, label: self.label }
    }

    #[inline]
    pub fn into_view(self) -> ByteView<'a> {
        ByteView { bytes: self.bytes, base: self.base, label: self.label }
    }

    #[inline]
    pub fn read<T: Pod>(&self, offset: usize) -> Result<T> {
        self.as_view().read(offset)
    }

    fn bytes_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let end = self.as_view().check(offset, len)?;
        Ok(&mut self.bytes[offset..end])
    }

    /// Store `value` at `offset` in host order.
    pub fn write<T: Pod>(&mut self, offset: usize, value: T) -> Result<()> {
        self.bytes_mut(offset, size_of::<T>())?
            .copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }

    pub fn write_u16(&mut self, offset: usize, value: u16) -> Result<()> {
        LittleEndian::write_u16(self.bytes_mut(offset, 2)?, value);
        Ok(())
    }

    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        LittleEndian::write_u32(self.bytes_mut(offset, 4)?, value);
        Ok(())
    }

    pub fn write_u32_be(&mut self, offset: usize, value: u32) -> Result<()> {
        BigEndian::write_u32(self.bytes_mut(offset, 4)?, value);
        Ok(())
    }

    pub fn write_f32(&mut self, offset: usize, value: f32) -> Result<()> {
        LittleEndian::write_f32(self.bytes_mut(offset, 4)?, value);
        Ok(())
    }

    /// Writable sub-window; `None` extends to the end.
    pub fn slice_mut(&mut self, offset: usize, len: Option<usize>) -> Result<ByteViewMut<'_>> {
        let view = self.as_view();
        let len = match len {
            Some(len) => len,
            None => view.size().checked_sub(offset).ok_or_else(|| view.out_of_range(offset, 0))?,
        };
        let end = view.check(offset, len)?;
        let base = self.base + offset;
        Ok(ByteViewMut {
            bytes: &mut self.bytes[offset..end],
            base,
            label: self.label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0xff, 0xff, 0x00, 0x00];
        let view = ByteView::new(&data);
        assert_eq!(view.u32(0).unwrap(), 0x0403_0201);
        assert_eq!(view.u16(4).unwrap(), 0xffff);
        assert_eq!(view.i16(4).unwrap(), -1);
        assert_eq!(view.u32_be(0).unwrap(), 0x0102_0304);
        assert_eq!(view.read::<[u8; 2]>(2).unwrap(), [0x03, 0x04]);
    }

    #[test]
    fn test_out_of_range() {
        let data = [0u8; 8];
        let view = ByteView::labeled(&data, "Test");
        assert!(view.u32(4).is_ok());
        match view.u32(5) {
            Err(Error::OutOfRange { record, offset, len, size }) => {
                assert_eq!(record, "Test");
                assert_eq!(offset, 5);
                assert_eq!(len, 4);
                assert_eq!(size, 8);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(view.u64(usize::MAX).is_err());
    }

    #[test]
    fn test_offset_arithmetic() {
        let data = [0u8; 8];
        let view = ByteView::labeled(&data, "Test");
        assert_eq!(view.offset(16, 4).unwrap(), 20);
        assert_eq!(view.extent(0, 3, 6).unwrap(), 18);
        assert!(matches!(view.offset(usize::MAX, 16), Err(Error::OutOfRange { record: "Test", .. })));
        assert!(matches!(view.extent(8, usize::MAX, 2), Err(Error::OutOfRange { offset: 8, .. })));
    }

    #[test]
    fn test_slice_reports_absolute_offsets() {
        let data: Vec<u8> = (0..32).collect();
        let view = ByteView::new(&data);
        let sub = view.window(8, 8).unwrap();
        assert_eq!(sub.base(), 8);
        assert_eq!(sub.u8(0).unwrap(), 8);

        let nested = sub.tail(4).unwrap();
        assert_eq!(nested.base(), 12);
        assert_eq!(nested.size(), 4);

        match nested.u32(2) {
            Err(Error::OutOfRange { offset, .. }) => assert_eq!(offset, 14),
            other => panic!("unexpected {:?}", other),
        }
        assert!(sub.window(4, 5).is_err());
        assert!(sub.tail(9).is_err());
        assert_eq!(sub.tail(8).unwrap().size(), 0);
    }

    #[test]
    fn test_cstr() {
        let data = b"abc\0de\0f";
        let view = ByteView::new(data);
        assert_eq!(view.cstr(0).unwrap(), "abc");
        assert_eq!(view.cstr(4).unwrap(), "de");
        assert_eq!(view.cstr(3).unwrap(), "");
        assert!(matches!(view.cstr(7), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_expect_magic() {
        let view = ByteView::labeled(b"CNK0\x01\0\0\0", "CNK0");
        assert!(view.expect_magic(b"CNK0").is_ok());
        assert!(matches!(
            view.expect_magic(b"CNK1"),
            Err(Error::MagicMismatch { found, .. }) if &found == b"CNK0"
        ));
        let short = ByteView::new(b"CN");
        assert!(matches!(short.expect_magic(b"CNK0"), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_write_is_visible_through_rederived_views() {
        let mut data = vec![0u8; 16];
        {
            let mut root = ByteViewMut::new(&mut data);
            let mut sub = root.slice_mut(8, Some(8)).unwrap();
            sub.write_u32(0, 0xdead_beef).unwrap();
            assert!(sub.write_u32(6, 1).is_err());
            root.write(0, 7u16).unwrap();
        }
        let view = ByteView::new(&data);
        assert_eq!(view.u32(8).unwrap(), 0xdead_beef);
        assert_eq!(view.window(8, 4).unwrap().u32(0).unwrap(), 0xdead_beef);
        assert_eq!(view.u16(0).unwrap(), 7);
    }
}
