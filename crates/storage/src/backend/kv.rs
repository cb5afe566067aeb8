//! Key-value backend
//!
//! Persists items into a flat string-keyed preference store (the platform
//! player-preferences store on a game console, a registry hive on desktop).
//! The store itself sits behind the small synchronous [`KeyValueStore`]
//! trait; an in-process implementation is provided for tests and as a
//! default. Binary payloads occupy a string slot, Base64-encoded by default.

use crate::backend::{already_exists, validate_identifier, ListOptions, StorageBackend};
use crate::stream::{StorageStream, StreamInner};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parking_lot::RwLock;
use savepoint_core::{Error, Result};
use std::collections::HashMap;

/// A flat string-to-string store, e.g. a platform preference store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    /// Remove a key, returning whether it existed
    fn remove(&self, key: &str) -> bool;
    fn contains(&self, key: &str) -> bool;
}

/// In-process [`KeyValueStore`] standing in for a platform preference store
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries.write().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }
}

/// How binary payloads are fitted into the string slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BinaryEncoding {
    /// Base64 the payload (lossless)
    #[default]
    Base64,
    /// Store the payload as UTF-8 text; non-text payloads are rejected
    Utf8,
}

/// Storage backend over a [`KeyValueStore`]
pub struct KeyValueBackend<S: KeyValueStore> {
    store: S,
    encoding: BinaryEncoding,
}

impl<S: KeyValueStore> KeyValueBackend<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            encoding: BinaryEncoding::default(),
        }
    }

    pub fn with_encoding(store: S, encoding: BinaryEncoding) -> Self {
        Self { store, encoding }
    }

    fn encode(&self, identifier: &str, data: &[u8]) -> Result<String> {
        match self.encoding {
            BinaryEncoding::Base64 => Ok(BASE64.encode(data)),
            BinaryEncoding::Utf8 => String::from_utf8(data.to_vec())
                .map_err(|e| Error::serialization(identifier, "encode", e)),
        }
    }

    fn decode(&self, identifier: &str, slot: &str) -> Result<Vec<u8>> {
        match self.encoding {
            BinaryEncoding::Base64 => BASE64
                .decode(slot)
                .map_err(|e| Error::serialization(identifier, "decode", e)),
            BinaryEncoding::Utf8 => Ok(slot.as_bytes().to_vec()),
        }
    }
}

#[async_trait]
impl<S: KeyValueStore> StorageBackend for KeyValueBackend<S> {
    async fn open_write(&self, identifier: &str) -> Result<StorageStream> {
        validate_identifier(identifier)?;
        Ok(StorageStream::buffer_write(identifier))
    }

    async fn commit_write(&self, stream: StorageStream) -> Result<()> {
        let (identifier, inner) = stream.into_parts();
        match inner {
            StreamInner::BufferWrite { buffer } => {
                let slot = self.encode(&identifier, &buffer)?;
                self.store.set(&identifier, slot);
                Ok(())
            }
            _ => Err(Error::configuration(format!(
                "stream for '{identifier}' does not belong to the key-value backend"
            ))),
        }
    }

    async fn open_read(&self, identifier: &str) -> Result<StorageStream> {
        let data = self.read_bytes(identifier).await?;
        Ok(StorageStream::buffer_read(identifier, data))
    }

    async fn write_bytes(&self, identifier: &str, data: &[u8]) -> Result<()> {
        validate_identifier(identifier)?;
        let slot = self.encode(identifier, data)?;
        self.store.set(identifier, slot);
        Ok(())
    }

    async fn read_bytes(&self, identifier: &str) -> Result<Vec<u8>> {
        validate_identifier(identifier)?;
        let slot = self
            .store
            .get(identifier)
            .ok_or_else(|| Error::item_not_found(identifier))?;
        self.decode(identifier, &slot)
    }

    async fn delete(&self, identifier: &str) -> Result<()> {
        validate_identifier(identifier)?;
        if self.store.remove(identifier) {
            Ok(())
        } else {
            Err(Error::item_not_found(identifier))
        }
    }

    async fn exists(&self, identifier: &str) -> Result<bool> {
        validate_identifier(identifier)?;
        Ok(self.store.contains(identifier))
    }

    async fn move_item(&self, from: &str, to: &str, replace: bool) -> Result<String> {
        validate_identifier(from)?;
        validate_identifier(to)?;
        if self.store.contains(to) && !replace {
            return Err(already_exists(to, "move"));
        }
        let slot = self
            .store
            .get(from)
            .ok_or_else(|| Error::item_not_found(from))?;
        self.store.set(to, slot);
        self.store.remove(from);
        Ok(to.to_string())
    }

    async fn copy_item(&self, from: &str, to: &str, replace: bool) -> Result<String> {
        validate_identifier(from)?;
        validate_identifier(to)?;
        if self.store.contains(to) && !replace {
            return Err(already_exists(to, "copy"));
        }
        let slot = self
            .store
            .get(from)
            .ok_or_else(|| Error::item_not_found(from))?;
        self.store.set(to, slot);
        Ok(to.to_string())
    }

    async fn list(&self, _location: &str, _options: &ListOptions) -> Result<Option<Vec<String>>> {
        // Preference stores expose no enumeration; fall back to the catalog
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> KeyValueBackend<InMemoryKeyValueStore> {
        KeyValueBackend::new(InMemoryKeyValueStore::new())
    }

    #[tokio::test]
    async fn binary_payloads_survive_the_string_slot() -> Result<()> {
        let backend = backend();
        let payload: Vec<u8> = (0..=255).collect();
        backend.write_bytes("blob", &payload).await?;
        assert_eq!(backend.read_bytes("blob").await?, payload);
        Ok(())
    }

    #[tokio::test]
    async fn base64_is_used_for_the_slot() -> Result<()> {
        let store = InMemoryKeyValueStore::new();
        let backend = KeyValueBackend::new(store);
        backend.write_bytes("item", b"hello").await?;

        // Reach into the store: the slot must not hold the raw bytes
        let slot = backend.store.get("item").unwrap();
        assert_eq!(slot, BASE64.encode(b"hello"));
        Ok(())
    }

    #[tokio::test]
    async fn utf8_encoding_rejects_non_text_payloads() {
        let backend =
            KeyValueBackend::with_encoding(InMemoryKeyValueStore::new(), BinaryEncoding::Utf8);
        assert!(backend.write_bytes("blob", &[0xff, 0xfe]).await.is_err());
    }

    #[tokio::test]
    async fn missing_key_maps_to_item_not_found() {
        let backend = backend();
        assert!(backend.read_bytes("absent").await.unwrap_err().is_not_found());
    }
}
