//! Byte-level I/O managers underneath the file volume store

use crate::error::{Result, SliceError};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// Storage backend types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Local file system
    FileSystem,
    /// Any other URL scheme; callers provide their own `VolumeStore`
    External(String),
}

impl StorageBackend {
    /// Parse storage backend from URL scheme
    pub fn from_url(url: &str) -> Result<Self> {
        match url.find("://") {
            Some(0) => Err(SliceError::InvalidUrl(format!("Missing scheme: {}", url))),
            Some(scheme_end) => match &url[..scheme_end] {
                "file" => Ok(StorageBackend::FileSystem),
                scheme => Ok(StorageBackend::External(scheme.to_string())),
            },
            // Assume file system if no scheme
            None => Ok(StorageBackend::FileSystem),
        }
    }
}

/// Trait for I/O operations relative to a volume root
#[async_trait]
pub trait IOManager: Send + Sync {
    /// Read a whole object
    async fn read(&self, path: &str) -> Result<Bytes>;

    /// Read `len` bytes starting at `offset`
    async fn read_range(&self, path: &str, offset: u64, len: usize) -> Result<Bytes>;

    /// Write data to a path
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Check if a path exists
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Get the backend type
    fn backend(&self) -> StorageBackend;
}

/// File system I/O manager
pub struct FileSystemIOManager {
    base_path: PathBuf,
}

impl FileSystemIOManager {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

#[async_trait]
impl IOManager for FileSystemIOManager {
    async fn read(&self, path: &str) -> Result<Bytes> {
        let data = fs::read(self.full_path(path)).await?;
        Ok(Bytes::from(data))
    }

    async fn read_range(&self, path: &str, offset: u64, len: usize) -> Result<Bytes> {
        let mut file = fs::File::open(self.full_path(path)).await?;
        file.seek(SeekFrom::Start(offset)).await?;

        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf).await?;
        Ok(Bytes::from(buf))
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        // Create parent directories if they don't exist
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(fs::try_exists(self.full_path(path)).await?)
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::FileSystem
    }
}

/// Parse URL and create appropriate I/O manager
///
/// Only filesystem URLs are handled here. Other storage is reached by
/// implementing `VolumeStore` directly.
pub fn create_io_manager(url: &str) -> Result<Box<dyn IOManager>> {
    match StorageBackend::from_url(url)? {
        StorageBackend::FileSystem => {
            let path = url.strip_prefix("file://").unwrap_or(url);
            Ok(Box::new(FileSystemIOManager::new(path)))
        }
        StorageBackend::External(scheme) => Err(SliceError::Configuration(format!(
            "URL scheme '{}' is not handled by the file store; implement VolumeStore for it",
            scheme
        ))),
    }
}
