//! Typed, zero-copy array over unaligned bytes.

use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;

use bytemuck::Pod;

/// `len` consecutive `T` records borrowed from a buffer.
///
/// Elements are copied out on access, so the backing bytes need no
/// particular alignment.
#[derive(Clone, Copy)]
pub struct PodArray<'a, T> {
    bytes: &'a [u8],
    _marker: PhantomData<T>,
}

impl<'a, T: Pod> PodArray<'a, T> {
    /// `bytes.len()` must be a multiple of `size_of::<T>()`.
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        debug_assert!(size_of::<T>() == 0 || bytes.len() % size_of::<T>() == 0);
        Self { bytes, _marker: PhantomData }
    }

    pub fn empty() -> Self {
        Self { bytes: &[], _marker: PhantomData }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / size_of::<T>().max(1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size of the array in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        let size = size_of::<T>();
        let start = index.checked_mul(size)?;
        let chunk = self.bytes.get(start..start.checked_add(size)?)?;
        Some(bytemuck::pod_read_unaligned(chunk))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = T> + 'a {
        self.bytes
            .chunks_exact(size_of::<T>().max(1))
            .map(bytemuck::pod_read_unaligned)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl<T: Pod + fmt::Debug> fmt::Debug for PodArray<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
