//! Pluggable storage for save data
//!
//! This crate provides the storage subsystem of `savepoint`:
//! - A backend trait with disk, memory and key-value implementations
//! - A composition layer adding catalog and metadata bookkeeping uniformly
//!   on top of any backend
//! - A backup lifecycle (create, restore, delete) tracked per item
//!
//! Writes are staged and made visible only on commit; the disk backend
//! replaces the target with a delete-then-rename step documented as
//! best-effort rather than truly atomic.

pub mod backend;
pub mod backup;
pub mod catalog;
pub mod meta;
pub mod results;
pub mod store;
pub mod stream;

pub use backend::{
    BinaryEncoding, DiskBackend, InMemoryKeyValueStore, KeyValueBackend, KeyValueStore,
    ListOptions, MemoryBackend, StorageBackend,
};
pub use backup::backup_identifier;
pub use catalog::Catalog;
pub use meta::{is_meta_identifier, meta_identifier, BackupRecord, MetaValue, StorageMetaData};
pub use results::{ClearResult, CopyResult, DeleteResult, MoveResult};
pub use store::{Storage, StorageConfig};
pub use stream::StorageStream;
