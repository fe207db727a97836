//! Thumbnail files on local disk

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use tempfile::TempPath;
use tokio::fs::{self, File};
use tracing::{debug, info};

/// A blob being written under a private name, invisible to readers of its key.
///
/// Dropping it without [`BlobStore::publish`] removes the staged file.
pub struct StagedBlob {
    pub file: File,
    path: TempPath,
}

/// Byte storage addressed by thumbnail identifier.
///
/// Implementations must use the identifier as-is for naming, since the
/// recency cache tracks the same identifiers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create the storage root if it is missing
    async fn ensure_root(&self) -> io::Result<()>;

    /// Start a new blob for `key`, opened for reading and writing.
    ///
    /// Concurrent calls for the same key get independent blobs.
    async fn create(&self, key: &str) -> io::Result<StagedBlob>;

    /// Atomically replace the blob for `key` with `staged`.
    ///
    /// Returns the staged handle, still positioned on the published bytes.
    async fn publish(&self, staged: StagedBlob, key: &str) -> io::Result<File>;

    /// Open the existing blob for `key` for reading
    async fn open(&self, key: &str) -> io::Result<File>;

    async fn delete(&self, key: &str) -> io::Result<()>;
}

/// Stores each thumbnail as `{root}/{key}`, staged as `{root}/{key}.*.part`
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStore for DiskStore {
    async fn ensure_root(&self) -> io::Result<()> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("storage root {:?} is not a directory", self.root),
            )),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&self.root).await?;
                info!(root = ?self.root, "Created storage root");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn create(&self, key: &str) -> io::Result<StagedBlob> {
        let root = self.root.clone();
        let prefix = format!("{}.", key);
        let staged = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".part")
                .tempfile_in(root)
        })
        .await
        .map_err(io::Error::other)??;

        let (file, path) = staged.into_parts();
        debug!(path = ?path, "Staging thumbnail file");
        Ok(StagedBlob {
            file: File::from_std(file),
            path,
        })
    }

    async fn publish(&self, staged: StagedBlob, key: &str) -> io::Result<File> {
        let StagedBlob { file, path } = staged;
        let target = self.path_for(key);
        fs::rename(&path, &target).await?;

        // The staged name no longer exists; stop the drop cleanup from chasing it
        if let Err(e) = path.keep() {
            debug!(error = %e, "Staged path already released");
        }
        debug!(path = ?target, "Published thumbnail file");
        Ok(file)
    }

    async fn open(&self, key: &str) -> io::Result<File> {
        File::open(self.path_for(key)).await
    }

    async fn delete(&self, key: &str) -> io::Result<()> {
        fs::remove_file(self.path_for(key)).await
    }
}
