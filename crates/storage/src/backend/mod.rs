//! Backend primitive operations
//!
//! A backend implements the raw I/O for one storage medium; the
//! [`Storage`](crate::store::Storage) composition layer adds catalog,
//! metadata and backup bookkeeping uniformly on top. Backends classify raw
//! failures into the core error taxonomy at this boundary and propagate
//! everything else unchanged.

mod disk;
mod kv;
mod memory;

pub use disk::DiskBackend;
pub use kv::{BinaryEncoding, InMemoryKeyValueStore, KeyValueBackend, KeyValueStore};
pub use memory::MemoryBackend;

use crate::stream::StorageStream;
use async_trait::async_trait;
use savepoint_core::{Error, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Options for listing identifiers under a location
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Descend into nested locations
    pub recurse: bool,
    /// Stop after this many results
    pub max_results: Option<usize>,
}

impl ListOptions {
    /// Recursive listing with no result cap
    #[must_use]
    pub fn recursive() -> Self {
        Self {
            recurse: true,
            max_results: None,
        }
    }
}

/// Primitive storage operations implemented per medium
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Open a write stream for the identifier. Written data must stay
    /// invisible under the real identifier until [`commit_write`] succeeds.
    ///
    /// [`commit_write`]: StorageBackend::commit_write
    async fn open_write(&self, identifier: &str) -> Result<StorageStream>;

    /// Finalize a write stream, making the data visible under its
    /// identifier. Dropping the stream without committing discards the
    /// staged data.
    async fn commit_write(&self, stream: StorageStream) -> Result<()>;

    /// Open a read stream. Fails with `ItemNotFound` when the identifier
    /// does not exist.
    async fn open_read(&self, identifier: &str) -> Result<StorageStream>;

    /// Write a full payload, staging and committing in one call.
    async fn write_bytes(&self, identifier: &str, data: &[u8]) -> Result<()> {
        let mut stream = self.open_write(identifier).await?;
        stream
            .write_all(data)
            .await
            .map_err(|e| Error::io(identifier, "write", e))?;
        self.commit_write(stream).await
    }

    /// Read a full payload.
    async fn read_bytes(&self, identifier: &str) -> Result<Vec<u8>> {
        let mut stream = self.open_read(identifier).await?;
        let mut data = Vec::new();
        stream
            .read_to_end(&mut data)
            .await
            .map_err(|e| Error::io(identifier, "read", e))?;
        Ok(data)
    }

    /// Delete the item. Fails with `ItemNotFound` when absent.
    async fn delete(&self, identifier: &str) -> Result<()>;

    /// Backend-level existence check.
    async fn exists(&self, identifier: &str) -> Result<bool>;

    /// Move an item, returning the final identifier (which differs from the
    /// requested destination when the destination is an existing container).
    async fn move_item(&self, from: &str, to: &str, replace: bool) -> Result<String>;

    /// Copy an item, returning the final identifier of the copy.
    async fn copy_item(&self, from: &str, to: &str, replace: bool) -> Result<String>;

    /// Native hierarchical listing under a location, or `None` when the
    /// medium has no hierarchy and the caller should fall back to the
    /// catalog.
    async fn list(&self, location: &str, options: &ListOptions) -> Result<Option<Vec<String>>>;
}

/// Structural identifier checks shared by every backend
pub(crate) fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(Error::invalid_identifier(identifier, "identifier is empty"));
    }
    if identifier.contains('\0') {
        return Err(Error::invalid_identifier(
            identifier,
            "identifier contains a NUL byte",
        ));
    }
    Ok(())
}

/// Destination-exists error shared by the flat backends
pub(crate) fn already_exists(identifier: &str, operation: &'static str) -> Error {
    Error::io(
        identifier,
        operation,
        std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "destination already exists and replace was not requested",
        ),
    )
}
