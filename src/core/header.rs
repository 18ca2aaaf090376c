//! Magic + version header shared by the chunked formats.

use crate::util::{fourcc, Result};
use crate::view::ByteView;

/// Size of a magic + version header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Four-character signature and format version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u32,
}

impl Header {
    /// Read a header, failing on the magic before anything else is read.
    pub fn parse(view: ByteView<'_>, expected: &[u8; 4]) -> Result<Self> {
        view.expect_magic(expected)?;
        Ok(Self { magic: *expected, version: view.u32(4)? })
    }

    /// Read a header without checking the signature.
    pub fn peek(view: ByteView<'_>) -> Result<Self> {
        Ok(Self { magic: view.magic()?, version: view.u32(4)? })
    }

    /// Printable signature.
    pub fn magic_str(&self) -> String {
        fourcc(&self.magic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Error;

    #[test]
    fn test_parse_header() {
        let data = b"ZONE\x05\0\0\0";
        let header = Header::parse(ByteView::new(data), b"ZONE").unwrap();
        assert_eq!(header.version, 5);
        assert_eq!(header.magic_str(), "ZONE");
    }

    #[test]
    fn test_magic_checked_first() {
        // Too short for a version, but the magic is wrong so that is reported.
        let data = b"DMAT";
        let err = Header::parse(ByteView::new(data), b"DMOD").unwrap_err();
        assert!(matches!(err, Error::MagicMismatch { .. }));
    }
}
