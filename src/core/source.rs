//! Asset buffers and providers.
//!
//! Records borrow from a root buffer; [`AssetBuffer`] is that root when the
//! bytes come from disk or a provider. An [`AssetProvider`] is the
//! read-only "bytes by name" interface the parsers consume; the packed
//! game archives implement it elsewhere, this module ships loose-file and
//! in-memory implementations.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "mmap")]
use memmap2::Mmap;
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::compression::{extract_asset, is_archive_compressed};
use crate::util::{Error, Result};
use crate::view::ByteView;

/// Root buffer that parsed records borrow from.
pub enum AssetBuffer {
    /// Heap buffer (decompressed output, small files)
    Owned(Vec<u8>),
    /// Shared bytes handed out by a provider
    Shared(Arc<[u8]>),
    /// Memory-mapped file
    #[cfg(feature = "mmap")]
    Mapped(Mmap),
}

impl AssetBuffer {
    /// Open a file, memory-mapping it when the `mmap` feature is enabled.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_opts(path, cfg!(feature = "mmap"))
    }

    /// Open a file with optional memory mapping.
    pub fn open_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        let size = file.metadata()?.len();

        #[cfg(feature = "mmap")]
        {
            if use_mmap && size > 0 {
                // Safety: mapped read-only; callers must not truncate the file while it is open.
                let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
                return Ok(Self::Mapped(mmap));
            }
        }
        #[cfg(not(feature = "mmap"))]
        let _ = use_mmap;

        let mut data = Vec::with_capacity(size as usize);
        file.read_to_end(&mut data)?;
        Ok(Self::Owned(data))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Owned(v) => v.as_slice(),
            Self::Shared(a) => a.as_ref(),
            #[cfg(feature = "mmap")]
            Self::Mapped(m) => &m[..],
        }
    }

    /// Root view over the whole buffer.
    #[inline]
    pub fn view(&self, label: &'static str) -> ByteView<'_> {
        ByteView::labeled(self.as_bytes(), label)
    }

    /// Take the bytes out, copying unless the buffer is already owned.
    pub fn into_owned(self) -> Vec<u8> {
        match self {
            Self::Owned(v) => v,
            other => other.as_bytes().to_vec(),
        }
    }
}

impl Deref for AssetBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for AssetBuffer {
    fn from(v: Vec<u8>) -> Self {
        Self::Owned(v)
    }
}

impl std::fmt::Debug for AssetBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Owned(_) => "Owned",
            Self::Shared(_) => "Shared",
            #[cfg(feature = "mmap")]
            Self::Mapped(_) => "Mapped",
        };
        write!(f, "AssetBuffer::{}({} bytes)", kind, self.len())
    }
}

/// Read-only source of named assets.
pub trait AssetProvider: Send + Sync {
    /// Raw (possibly archive-compressed) bytes of `name`.
    fn load(&self, name: &str) -> Result<AssetBuffer>;

    /// Whether `name` exists.
    fn contains(&self, name: &str) -> bool;

    /// Load `name` and undo archive compression if present.
    fn load_extracted(&self, name: &str) -> Result<Vec<u8>> {
        let raw = self.load(name)?;
        if is_archive_compressed(&raw) {
            extract_asset(&raw)
        } else {
            Ok(raw.into_owned())
        }
    }
}

/// Loose files under a directory.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
    use_mmap: bool,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), use_mmap: cfg!(feature = "mmap") }
    }

    /// Read files into memory instead of mapping them.
    pub fn without_mmap(mut self) -> Self {
        self.use_mmap = false;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &str) -> Option<PathBuf> {
        // Asset names are flat; refuse anything that walks out of the root.
        let candidate = Path::new(name);
        if candidate.components().count() != 1 || candidate.file_name().is_none() {
            return None;
        }
        Some(self.root.join(candidate))
    }
}

impl AssetProvider for DirectoryProvider {
    fn load(&self, name: &str) -> Result<AssetBuffer> {
        let path = self.path_of(name).ok_or_else(|| Error::AssetNotFound(name.to_string()))?;
        match AssetBuffer::open_opts(&path, self.use_mmap) {
            Err(Error::FileNotFound(_)) => Err(Error::AssetNotFound(name.to_string())),
            other => other,
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.path_of(name).map(|p| p.is_file()).unwrap_or(false)
    }
}

/// Named byte blobs held in memory.
#[derive(Default)]
pub struct MemoryProvider {
    assets: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset.
    pub fn insert(&self, name: impl Into<String>, data: impl Into<Arc<[u8]>>) {
        self.assets.write().insert(name.into(), data.into());
    }

    pub fn remove(&self, name: &str) -> bool {
        self.assets.write().remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }
}

impl AssetProvider for MemoryProvider {
    fn load(&self, name: &str) -> Result<AssetBuffer> {
        self.assets
            .read()
            .get(name)
            .cloned()
            .map(AssetBuffer::Shared)
            .ok_or_else(|| Error::AssetNotFound(name.to_string()))
    }

    fn contains(&self, name: &str) -> bool {
        self.assets.read().contains_key(name)
    }
}

/// Load and extract several assets in parallel.
///
/// Every name gets its own result; one bad asset does not stop the rest.
pub fn extract_batch<P, S>(provider: &P, names: &[S]) -> Vec<(String, Result<Vec<u8>>)>
where
    P: AssetProvider + ?Sized,
    S: AsRef<str> + Sync,
{
    let results: Vec<(String, Result<Vec<u8>>)> = names
        .par_iter()
        .map(|name| {
            let name = name.as_ref();
            let result = provider.load_extracted(name);
            if let Err(e) = &result {
                warn!(asset = name, error = %e, "asset extraction failed");
            }
            (name.to_string(), result)
        })
        .collect();
    debug!(
        requested = names.len(),
        failed = results.iter().filter(|(_, r)| r.is_err()).count(),
        "batch extraction finished"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compression::compress_asset;
    use flate2::Compression;

    #[test]
    fn test_memory_provider() {
        let provider = MemoryProvider::new();
        provider.insert("plain.dma", b"DMAT".to_vec());
        assert!(provider.contains("plain.dma"));
        assert_eq!(provider.len(), 1);
        assert_eq!(&provider.load("plain.dma").unwrap()[..], b"DMAT");
        assert!(matches!(provider.load("missing"), Err(Error::AssetNotFound(_))));
        assert!(provider.remove("plain.dma"));
        assert!(provider.is_empty());
    }

    #[test]
    fn test_batch_keeps_going_after_failure() {
        let provider = MemoryProvider::new();
        let body = b"mesh bytes ".repeat(32);
        provider.insert("good.dme", compress_asset(&body, Compression::default()).unwrap());
        let mut bad = compress_asset(&body, Compression::default()).unwrap();
        bad.truncate(12);
        provider.insert("bad.dme", bad);
        provider.insert("loose.zone", b"ZONE".to_vec());

        let results = extract_batch(&provider, &["good.dme", "bad.dme", "missing.adr", "loose.zone"]);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].1.as_ref().unwrap(), &body);
        assert!(matches!(results[1].1, Err(Error::Decompression { .. })));
        assert!(matches!(results[2].1, Err(Error::AssetNotFound(_))));
        assert_eq!(results[3].1.as_ref().unwrap(), b"ZONE");
    }

    #[test]
    fn test_directory_provider() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("Tile_0_0.cnk0"), b"CNK0\x01\0\0\0").expect("write");
        std::fs::write(dir.path().join("empty.bin"), b"").expect("write");

        for provider in [DirectoryProvider::new(dir.path()), DirectoryProvider::new(dir.path()).without_mmap()] {
            assert!(provider.contains("Tile_0_0.cnk0"));
            assert!(!provider.contains("../Tile_0_0.cnk0"));
            let buf = provider.load("Tile_0_0.cnk0").unwrap();
            assert_eq!(buf.view("CNK0").magic().unwrap(), *b"CNK0");
            assert!(provider.load("empty.bin").unwrap().is_empty());
            assert!(matches!(provider.load("nope"), Err(Error::AssetNotFound(_))));
        }
    }
}
