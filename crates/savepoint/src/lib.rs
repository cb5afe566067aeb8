//! Save/load facade for the `savepoint` workspace
//!
//! Composes a [`Storage`](savepoint_storage::Storage) with a
//! [`Serializer`] and optional [`Encryption`] into a small stateless API:
//! [`SaveSystem::save`], [`SaveSystem::load`] and [`SaveSystem::load_into`],
//! with lifecycle events published around every operation.
//!
//! ```no_run
//! use savepoint::{SaveSystem, SaveSystemSettings};
//! use savepoint_storage::{DiskBackend, Storage};
//! use std::sync::Arc;
//!
//! # #[derive(serde::Serialize, serde::Deserialize)]
//! # struct PlayerState { hp: u32 }
//! # async fn demo() -> savepoint_core::Result<()> {
//! let backend = DiskBackend::new("saves").await?;
//! let storage = Storage::with_backend(Arc::new(backend));
//! let system = SaveSystem::new(SaveSystemSettings::new(storage));
//!
//! system.save("player/save1", &PlayerState { hp: 10 }).await?;
//! let state: PlayerState = system.load("player/save1").await?;
//! # Ok(())
//! # }
//! ```

pub mod encryption;
pub mod serializer;
pub mod settings;
pub mod system;

pub use encryption::Encryption;
pub use serializer::{JsonSerializer, Serializer};
pub use settings::SaveSystemSettings;
pub use system::SaveSystem;

// Re-export the storage surface callers usually need alongside the facade
pub use savepoint_core::{Error, EventBus, Result, StorageEvent};
pub use savepoint_storage::{
    BackupRecord, DiskBackend, InMemoryKeyValueStore, KeyValueBackend, ListOptions, MemoryBackend,
    Storage, StorageConfig, StorageMetaData,
};
