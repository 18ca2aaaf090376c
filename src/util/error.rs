//! Error types for the warpgate library.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why an inflate call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressionKind {
    /// Output buffer for the declared size could not be allocated
    Memory,
    /// Output or input did not match the declared sizes
    Buffer,
    /// Stream is corrupt
    Data,
}

impl fmt::Display for DecompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Memory => "out of memory",
            Self::Buffer => "buffer error",
            Self::Data => "data corrupted",
        };
        f.write_str(s)
    }
}

/// Render a four-character code, escaping anything unprintable.
pub fn fourcc(bytes: &[u8; 4]) -> String {
    bytes.iter().flat_map(|b| std::ascii::escape_default(*b)).map(char::from).collect()
}

/// Main error type for warpgate operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Leading signature does not name the expected format
    #[error("{record}: expected magic '{}', found '{}'", fourcc(.expected), fourcc(.found))]
    MagicMismatch {
        record: &'static str,
        expected: [u8; 4],
        found: [u8; 4],
    },

    /// Bounds-checked access past the end of a window
    #[error("{record}: read of {len} bytes at offset {offset:#x} is out of range (window size {size})")]
    OutOfRange {
        record: &'static str,
        offset: usize,
        len: usize,
        size: usize,
    },

    /// Version number this reader has no layout for
    #[error("{record}: unsupported version {version}")]
    UnsupportedVersion { record: &'static str, version: u32 },

    /// Inflate failed
    #[error("Decompression failed ({kind}): {detail}")]
    Decompression {
        kind: DecompressionKind,
        detail: String,
    },

    /// Sub-format whose layout is not known
    #[error("Unimplemented format: {0}")]
    UnimplementedFormat(&'static str),

    /// Invalid data structure in buffer
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// NUL-terminated string that is not UTF-8
    #[error("{record}: invalid string at offset {offset:#x}")]
    InvalidString { record: &'static str, offset: usize },

    /// Provider has no asset by that name
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a decompression error.
    pub fn decompression(kind: DecompressionKind, detail: impl Into<String>) -> Self {
        Self::Decompression { kind, detail: detail.into() }
    }
}

/// Result type alias for warpgate operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::MagicMismatch { record: "CNK0", expected: *b"CNK0", found: *b"ZONE" };
        let s = e.to_string();
        assert!(s.contains("CNK0"));
        assert!(s.contains("ZONE"));

        let e = Error::OutOfRange { record: "Mesh", offset: 0x40, len: 4, size: 16 };
        assert!(e.to_string().contains("0x40"));
        assert!(e.to_string().contains("16"));
    }

    #[test]
    fn test_fourcc_escapes() {
        assert_eq!(fourcc(b"DMAT"), "DMAT");
        assert_eq!(fourcc(&[0xA1, b'B', 0, b'D']), "\\xa1B\\x00D");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
