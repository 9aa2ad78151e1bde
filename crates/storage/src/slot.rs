//! Backing slots for the result store
//!
//! A slot is one named location holding the JSON-encoded collection
//! wholesale. [`FileSlot`] persists to a single file; [`MemorySlot`] keeps
//! the bytes in process for tests and non-persistent callers.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::StorageResult;

/// Narrow interface to the backing medium of the result store
///
/// Implementations move bytes only; parsing and collection semantics live
/// in the store itself.
#[async_trait]
pub trait ResultSlot: Send + Sync {
    /// Raw contents of the slot; `None` when the slot has never been written
    async fn read(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Replace the slot contents wholesale
    async fn write(&self, data: &[u8]) -> StorageResult<()>;

    /// Remove the slot entirely
    async fn clear(&self) -> StorageResult<()>;
}

/// Slot backed by a single file on disk
///
/// Writes go through a sibling temp file and a rename, so a write that
/// dies halfway never leaves a corrupt slot behind.
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    /// Create a slot at the given path
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The file this slot reads and writes
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl ResultSlot for FileSlot {
    async fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, data: &[u8]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = PathBuf::from(format!("{}.tmp", self.path.display()));
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process slot for tests and non-persistent callers
#[derive(Default)]
pub struct MemorySlot {
    data: RwLock<Option<Vec<u8>>>,
}

#[async_trait]
impl ResultSlot for MemorySlot {
    async fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.read().await.clone())
    }

    async fn write(&self, data: &[u8]) -> StorageResult<()> {
        *self.data.write().await = Some(data.to_vec());
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        *self.data.write().await = None;
        Ok(())
    }
}
