//! Save/load facade
//!
//! A stateless API layer composing storage, serializer and optional
//! encryption. Saves stage through a write stream and commit before
//! metadata is refreshed; loads consult metadata to decide whether the
//! payload is encrypted, and an encrypted-looking payload that fails to
//! decrypt or deserialize falls back to plain deserialization of the
//! untouched bytes. The fallback covers items written before encryption
//! was enabled as well as corrupt crypto headers, and is deliberate
//! control flow, not an oversight.

use crate::serializer::Serializer;
use crate::settings::SaveSystemSettings;
use savepoint_core::{EventBus, Result, StorageEvent};
use savepoint_storage::{DeleteResult, Storage};
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Persists arbitrary serializable values through a pluggable storage
pub struct SaveSystem<S> {
    settings: SaveSystemSettings<S>,
}

impl<S: Serializer> SaveSystem<S> {
    pub fn new(settings: SaveSystemSettings<S>) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.settings.storage
    }

    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.settings.events
    }

    /// Serialize and persist a value under the identifier.
    pub async fn save<T>(&self, identifier: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.settings.events.publish(StorageEvent::Saving {
            identifier: identifier.to_string(),
        });

        let bytes = self.settings.serializer.to_bytes(identifier, value)?;
        let encrypted = self.settings.use_encryption && self.settings.encryption.is_some();
        let payload = match (&self.settings.encryption, encrypted) {
            (Some(encryption), true) => encryption.encrypt(identifier, &bytes)?,
            _ => bytes,
        };

        let mut stream = self.settings.storage.write_stream(identifier).await?;
        stream
            .write_all(&payload)
            .await
            .map_err(|e| savepoint_core::Error::io(identifier, "write", e))?;
        self.settings.storage.commit_write_stream(stream).await?;
        self.settings
            .storage
            .update_metadata(identifier, true, encrypted)
            .await?;

        self.settings.events.publish(StorageEvent::Saved {
            identifier: identifier.to_string(),
        });
        Ok(())
    }

    /// Read and deserialize a value.
    pub async fn load<T>(&self, identifier: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.settings.events.publish(StorageEvent::Loading {
            identifier: identifier.to_string(),
        });

        let (bytes, encrypted) = self.read_payload(identifier).await?;
        let value = self.decode(identifier, &bytes, encrypted)?;
        self.settings
            .storage
            .update_metadata(identifier, false, encrypted)
            .await?;

        self.settings.events.publish(StorageEvent::Loaded {
            identifier: identifier.to_string(),
        });
        Ok(value)
    }

    /// Read and deserialize into an existing target instead of
    /// constructing a new value.
    pub async fn load_into<T>(&self, identifier: &str, target: &mut T) -> Result<()>
    where
        T: DeserializeOwned,
    {
        self.settings.events.publish(StorageEvent::LoadingInto {
            identifier: identifier.to_string(),
        });

        let (bytes, encrypted) = self.read_payload(identifier).await?;
        self.decode_into(identifier, &bytes, encrypted, target)?;
        self.settings
            .storage
            .update_metadata(identifier, false, encrypted)
            .await?;

        self.settings.events.publish(StorageEvent::LoadedInto {
            identifier: identifier.to_string(),
        });
        Ok(())
    }

    pub async fn exists(&self, identifier: &str) -> Result<bool> {
        self.settings.storage.exists(identifier).await
    }

    pub async fn delete(&self, identifier: &str) -> Result<DeleteResult> {
        self.settings.storage.delete(identifier).await
    }

    /// Read the raw payload and decide whether it is encrypted: the item's
    /// metadata is authoritative when present, otherwise the configured
    /// request applies.
    async fn read_payload(&self, identifier: &str) -> Result<(Vec<u8>, bool)> {
        let bytes = self.settings.storage.read_all_bytes(identifier).await?;
        let requested = self.settings.use_encryption && self.settings.encryption.is_some();
        let encrypted = self
            .settings
            .storage
            .load_metadata(identifier)
            .await?
            .encrypted()
            .unwrap_or(requested);
        Ok((bytes, encrypted))
    }

    fn decode<T>(&self, identifier: &str, bytes: &[u8], encrypted: bool) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if encrypted {
            if let Some(encryption) = &self.settings.encryption {
                match encryption
                    .decrypt(identifier, bytes)
                    .and_then(|plain| self.settings.serializer.from_bytes(identifier, &plain))
                {
                    Ok(value) => return Ok(value),
                    Err(e) => {
                        warn!(identifier, error = %e,
                            "encrypted load failed, falling back to plain deserialization");
                    }
                }
            }
        }
        self.settings.serializer.from_bytes(identifier, bytes)
    }

    fn decode_into<T>(
        &self,
        identifier: &str,
        bytes: &[u8],
        encrypted: bool,
        target: &mut T,
    ) -> Result<()>
    where
        T: DeserializeOwned,
    {
        if encrypted {
            if let Some(encryption) = &self.settings.encryption {
                match encryption.decrypt(identifier, bytes).and_then(|plain| {
                    self.settings
                        .serializer
                        .from_bytes_into(identifier, &plain, target)
                }) {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        warn!(identifier, error = %e,
                            "encrypted load failed, falling back to plain deserialization");
                    }
                }
            }
        }
        self.settings
            .serializer
            .from_bytes_into(identifier, bytes, target)
    }
}
