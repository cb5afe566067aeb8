//! In-process memory backend
//!
//! A single flat string-keyed store living for the lifetime of the process.
//! There is no hierarchy, so `list` always defers to catalog filtering.

use crate::backend::{already_exists, validate_identifier, ListOptions, StorageBackend};
use crate::stream::{StorageStream, StreamInner};
use async_trait::async_trait;
use parking_lot::RwLock;
use savepoint_core::{Error, Result};
use std::collections::HashMap;

/// Flat in-memory storage, useful for tests and ephemeral saves
#[derive(Default)]
pub struct MemoryBackend {
    items: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn open_write(&self, identifier: &str) -> Result<StorageStream> {
        validate_identifier(identifier)?;
        Ok(StorageStream::buffer_write(identifier))
    }

    async fn commit_write(&self, stream: StorageStream) -> Result<()> {
        let (identifier, inner) = stream.into_parts();
        match inner {
            StreamInner::BufferWrite { buffer } => {
                self.items.write().insert(identifier, buffer);
                Ok(())
            }
            _ => Err(Error::configuration(format!(
                "stream for '{identifier}' does not belong to the memory backend"
            ))),
        }
    }

    async fn open_read(&self, identifier: &str) -> Result<StorageStream> {
        validate_identifier(identifier)?;
        let data = self
            .items
            .read()
            .get(identifier)
            .cloned()
            .ok_or_else(|| Error::item_not_found(identifier))?;
        Ok(StorageStream::buffer_read(identifier, data))
    }

    async fn write_bytes(&self, identifier: &str, data: &[u8]) -> Result<()> {
        validate_identifier(identifier)?;
        self.items
            .write()
            .insert(identifier.to_string(), data.to_vec());
        Ok(())
    }

    async fn read_bytes(&self, identifier: &str) -> Result<Vec<u8>> {
        validate_identifier(identifier)?;
        self.items
            .read()
            .get(identifier)
            .cloned()
            .ok_or_else(|| Error::item_not_found(identifier))
    }

    async fn delete(&self, identifier: &str) -> Result<()> {
        validate_identifier(identifier)?;
        self.items
            .write()
            .remove(identifier)
            .map(|_| ())
            .ok_or_else(|| Error::item_not_found(identifier))
    }

    async fn exists(&self, identifier: &str) -> Result<bool> {
        validate_identifier(identifier)?;
        Ok(self.items.read().contains_key(identifier))
    }

    async fn move_item(&self, from: &str, to: &str, replace: bool) -> Result<String> {
        validate_identifier(from)?;
        validate_identifier(to)?;
        let mut items = self.items.write();
        if items.contains_key(to) && !replace {
            return Err(already_exists(to, "move"));
        }
        let data = items
            .remove(from)
            .ok_or_else(|| Error::item_not_found(from))?;
        items.insert(to.to_string(), data);
        Ok(to.to_string())
    }

    async fn copy_item(&self, from: &str, to: &str, replace: bool) -> Result<String> {
        validate_identifier(from)?;
        validate_identifier(to)?;
        let mut items = self.items.write();
        if items.contains_key(to) && !replace {
            return Err(already_exists(to, "copy"));
        }
        let data = items
            .get(from)
            .cloned()
            .ok_or_else(|| Error::item_not_found(from))?;
        items.insert(to.to_string(), data);
        Ok(to.to_string())
    }

    async fn list(&self, _location: &str, _options: &ListOptions) -> Result<Option<Vec<String>>> {
        // No hierarchy: the composition layer filters the catalog instead
        Ok(None)
    }
}
