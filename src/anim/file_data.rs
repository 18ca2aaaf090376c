//! FileNames packet payload: the source files an MRN was built from.

use tracing::debug;

use super::string_table::StringTable;
use crate::core::Record;
use crate::util::Result;
use crate::view::ByteView;

/// Four string tables plus one big-endian CRC-32 per file name.
#[derive(Clone, Debug)]
pub struct FileData<'a> {
    view: ByteView<'a>,
    filenames: StringTable<'a>,
    filetypes: StringTable<'a>,
    source_filenames: StringTable<'a>,
    animation_names: StringTable<'a>,
    crc32_hashes: Vec<u32>,
}

impl<'a> FileData<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("FileData");
        let filenames = StringTable::parse(view.tail(view.ptr64(0)?)?)?;
        let filetypes = StringTable::parse(view.tail(view.ptr64(8)?)?)?;
        let source_filenames = StringTable::parse(view.tail(view.ptr64(16)?)?)?;
        let animation_names = StringTable::parse(view.tail(view.ptr64(24)?)?)?;

        let crc_ptr = view.ptr64(32)?;
        let crc32_hashes = (0..filenames.len())
            .map(|i| view.u32_be(view.offset(crc_ptr, 4 * i)?))
            .collect::<Result<Vec<_>>>()?;
        debug!(files = filenames.len(), "parsed file data");

        let size = 40
            + filenames.size()
            + filetypes.size()
            + source_filenames.size()
            + animation_names.size()
            + 4 * crc32_hashes.len();
        Ok(Self {
            view: view.truncate(size)?,
            filenames,
            filetypes,
            source_filenames,
            animation_names,
            crc32_hashes,
        })
    }

    #[inline]
    pub fn filenames(&self) -> &StringTable<'a> {
        &self.filenames
    }

    #[inline]
    pub fn filetypes(&self) -> &StringTable<'a> {
        &self.filetypes
    }

    #[inline]
    pub fn source_filenames(&self) -> &StringTable<'a> {
        &self.source_filenames
    }

    #[inline]
    pub fn animation_names(&self) -> &StringTable<'a> {
        &self.animation_names
    }

    /// Hashes in host order, parallel to [`FileData::filenames`].
    #[inline]
    pub fn crc32_hashes(&self) -> &[u32] {
        &self.crc32_hashes
    }

    /// CRC-32 of the entry whose file name or animation name is `name`.
    pub fn crc32_of(&self, name: &str) -> Option<u32> {
        let index = self
            .filenames
            .position(name)
            .or_else(|| self.animation_names.position(name))?;
        self.crc32_hashes.get(index).copied()
    }
}

impl<'a> Record<'a> for FileData<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Error;

    /// Header, a two-name table at 40, three empty tables, then the hashes.
    fn file_data(crc_ptr: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        for ptr in [40u64, 76, 100, 124, crc_ptr] {
            buf.extend_from_slice(&ptr.to_le_bytes());
        }
        for v in [2u32, 4] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        for ptr in [24u64, 32] {
            buf.extend_from_slice(&ptr.to_le_bytes());
        }
        for off in [0u32, 2] {
            buf.extend_from_slice(&off.to_le_bytes());
        }
        buf.extend_from_slice(b"a\0b\0");
        buf.resize(148, 0);
        buf.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 1]);
        buf
    }

    #[test]
    fn test_big_endian_hashes() {
        let buf = file_data(148);
        let data = FileData::parse(ByteView::new(&buf)).unwrap();
        assert_eq!(data.filenames().strings(), &["a", "b"]);
        assert_eq!(data.crc32_hashes(), &[0xDEADBEEF, 1]);
        assert!(data.animation_names().is_empty());
    }

    #[test]
    fn test_hash_pointer_overflow() {
        let buf = file_data(u64::MAX - 2);
        assert!(matches!(
            FileData::parse(ByteView::new(&buf)),
            Err(Error::OutOfRange { record: "FileData", .. })
        ));
    }
}
