//! String tables inside MRN payloads.

use tracing::trace;

use crate::core::Record;
use crate::util::Result;
use crate::view::{ByteView, PodArray};

/// Offsets into a string block.
///
/// ```text
/// @0  count u32
/// @4  data_length u32
/// @8  offsets_ptr u64   -> u32[count]
/// @16 strings_ptr u64   -> NUL-terminated strings
/// ```
#[derive(Clone, Debug)]
pub struct StringTable<'a> {
    view: ByteView<'a>,
    data_length: u32,
    offsets: PodArray<'a, u32>,
    strings: Vec<&'a str>,
}

impl<'a> StringTable<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("StringTable");
        let count = view.len32(0)?;
        let data_length = view.u32(4)?;
        let offsets = view.array::<u32>(view.ptr64(8)?, count)?;
        let strings_ptr = view.ptr64(16)?;

        let strings = offsets
            .iter()
            .map(|o| view.cstr(view.offset(strings_ptr, o as usize)?))
            .collect::<Result<Vec<_>>>()?;
        trace!(count, "string table");

        let size = 24 + 4 * count + data_length as usize;
        Ok(Self { view: view.truncate(size)?, data_length, offsets, strings })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    #[inline]
    pub fn data_length(&self) -> u32 {
        self.data_length
    }

    #[inline]
    pub fn offsets(&self) -> PodArray<'a, u32> {
        self.offsets
    }

    #[inline]
    pub fn strings(&self) -> &[&'a str] {
        &self.strings
    }

    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.strings.get(index).copied()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.strings.iter().position(|s| *s == name)
    }
}

impl<'a> Record<'a> for StringTable<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

/// String table carrying a parallel id array.
///
/// ```text
/// @0  count u32
/// @4  data_length u32
/// @8  ids_ptr u64       -> u32[count]
/// @16 offsets_ptr u64   -> u32[count]
/// @24 unknown_ptr u64   -> u32[count]
/// @32 strings_ptr u64
/// ```
///
/// Slots are not stored in string order: logical string `i` is the one at
/// the `i`-th smallest offset.
#[derive(Clone, Debug)]
pub struct ExpandedStringTable<'a> {
    view: ByteView<'a>,
    data_length: u32,
    ids: PodArray<'a, u32>,
    offsets: PodArray<'a, u32>,
    unknown: PodArray<'a, u32>,
    strings: Vec<&'a str>,
}

impl<'a> ExpandedStringTable<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("ExpandedStringTable");
        let count = view.len32(0)?;
        let data_length = view.u32(4)?;
        let ids = view.array::<u32>(view.ptr64(8)?, count)?;
        let offsets = view.array::<u32>(view.ptr64(16)?, count)?;
        let unknown = view.array::<u32>(view.ptr64(24)?, count)?;
        let strings_ptr = view.ptr64(32)?;

        let mut sorted = offsets.to_vec();
        sorted.sort_unstable();
        let strings = sorted
            .into_iter()
            .map(|o| view.cstr(view.offset(strings_ptr, o as usize)?))
            .collect::<Result<Vec<_>>>()?;
        trace!(count, "expanded string table");

        let size = 40 + 12 * count + data_length as usize;
        Ok(Self { view: view.truncate(size)?, data_length, ids, offsets, unknown, strings })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    #[inline]
    pub fn data_length(&self) -> u32 {
        self.data_length
    }

    #[inline]
    pub fn ids(&self) -> PodArray<'a, u32> {
        self.ids
    }

    #[inline]
    pub fn offsets(&self) -> PodArray<'a, u32> {
        self.offsets
    }

    #[inline]
    pub fn unknown(&self) -> PodArray<'a, u32> {
        self.unknown
    }

    /// Strings in offset order.
    #[inline]
    pub fn strings(&self) -> &[&'a str] {
        &self.strings
    }

    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.strings.get(index).copied()
    }
}

impl<'a> Record<'a> for ExpandedStringTable<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}
