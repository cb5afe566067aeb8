//! Storage composition layer
//!
//! [`Storage`] wraps a backend's primitive operations with catalog and
//! metadata bookkeeping so that every public mutating operation keeps both
//! consistent. Catalog updates happen strictly after the data commit
//! succeeds and are idempotent.
//!
//! There is no internal locking around catalog or metadata
//! read-modify-write sequences: two concurrent writers to the same
//! identifier, or two writers both updating the catalog, race with
//! last-write-wins semantics. Callers needing stronger guarantees must
//! serialize externally per identifier.

use crate::backend::{ListOptions, StorageBackend};
use crate::catalog::Catalog;
use crate::meta::{is_meta_identifier, meta_identifier, StorageMetaData};
use crate::results::{ClearResult, CopyResult, DeleteResult, MoveResult};
use crate::stream::StorageStream;
use chrono::Utc;
use savepoint_core::{Error, Result, CATALOG_ID, META_SUFFIX, TEMP_SUFFIX};
use std::sync::Arc;
use tracing::{debug, warn};

/// Behavior switches for the composition layer
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Maintain the persisted catalog of known identifiers
    pub use_catalog: bool,
    /// Maintain per-item metadata companions
    pub use_metadata: bool,
    /// Version string stamped into metadata on every update
    pub application_version: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            use_catalog: true,
            use_metadata: true,
            application_version: None,
        }
    }
}

/// Backend-agnostic storage with catalog, metadata and backup bookkeeping
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn StorageBackend>,
    config: StorageConfig,
}

impl Storage {
    pub fn new(backend: Arc<dyn StorageBackend>, config: StorageConfig) -> Self {
        Self { backend, config }
    }

    /// Storage over a backend with default bookkeeping (catalog and
    /// metadata enabled)
    pub fn with_backend(backend: Arc<dyn StorageBackend>) -> Self {
        Self::new(backend, StorageConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub(crate) fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    // --- Streams ---

    /// Open a write stream. Data stays invisible under the identifier until
    /// [`commit_write_stream`](Storage::commit_write_stream).
    pub async fn write_stream(&self, identifier: &str) -> Result<StorageStream> {
        self.backend.open_write(identifier).await
    }

    /// Commit a write stream, then record the identifier in the catalog.
    pub async fn commit_write_stream(&self, stream: StorageStream) -> Result<()> {
        let identifier = stream.identifier().to_string();
        self.backend.commit_write(stream).await?;
        self.catalog_add(&identifier).await
    }

    /// Open a read stream. Fails with `ItemNotFound` when absent.
    pub async fn read_stream(&self, identifier: &str) -> Result<StorageStream> {
        self.backend.open_read(identifier).await
    }

    // --- Whole-item reads and writes ---

    pub async fn write_all_bytes(&self, identifier: &str, data: &[u8]) -> Result<()> {
        self.backend.write_bytes(identifier, data).await?;
        self.catalog_add(identifier).await
    }

    pub async fn write_all_text(&self, identifier: &str, text: &str) -> Result<()> {
        self.write_all_bytes(identifier, text.as_bytes()).await
    }

    pub async fn read_all_bytes(&self, identifier: &str) -> Result<Vec<u8>> {
        self.backend.read_bytes(identifier).await
    }

    pub async fn read_all_text(&self, identifier: &str) -> Result<String> {
        let data = self.read_all_bytes(identifier).await?;
        String::from_utf8(data).map_err(|e| Error::serialization(identifier, "decode text from", e))
    }

    // --- Existence and deletion ---

    /// Backend-level existence check; never consults the catalog, which may
    /// be stale.
    pub async fn exists(&self, identifier: &str) -> Result<bool> {
        self.backend.exists(identifier).await
    }

    /// Delete the item, then its metadata companion (ignoring absence),
    /// then the catalog entry. The returned result reflects only the
    /// primary deletion.
    pub async fn delete(&self, identifier: &str) -> Result<DeleteResult> {
        let primary = match self.backend.delete(identifier).await {
            Ok(()) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e),
        };
        if !is_meta_identifier(identifier) {
            match self.backend.delete(&meta_identifier(identifier)).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!(identifier, error = %e, "failed to delete metadata companion"),
            }
        }
        self.catalog_remove(identifier).await?;
        Ok(if primary {
            DeleteResult::success()
        } else {
            DeleteResult::failure()
        })
    }

    // --- Move and copy ---

    /// Move an item. The metadata companion follows unless either endpoint
    /// is itself a metadata identifier; the catalog entry is renamed.
    pub async fn move_item(&self, from: &str, to: &str, replace: bool) -> Result<MoveResult> {
        let final_id = self.backend.move_item(from, to, replace).await?;
        if !is_meta_identifier(from) && !is_meta_identifier(to) {
            let from_meta = meta_identifier(from);
            if self.backend.exists(&from_meta).await? {
                self.backend
                    .move_item(&from_meta, &meta_identifier(&final_id), true)
                    .await?;
            }
        }
        self.catalog_rename(from, &final_id).await?;
        Ok(MoveResult::success(final_id))
    }

    /// Copy an item. The metadata companion is copied alongside unless
    /// either endpoint is itself a metadata identifier; the copy is added
    /// to the catalog.
    pub async fn copy_item(&self, from: &str, to: &str, replace: bool) -> Result<CopyResult> {
        let final_id = self.backend.copy_item(from, to, replace).await?;
        if !is_meta_identifier(from) && !is_meta_identifier(to) {
            let from_meta = meta_identifier(from);
            if self.backend.exists(&from_meta).await? {
                self.backend
                    .copy_item(&from_meta, &meta_identifier(&final_id), true)
                    .await?;
            }
        }
        self.catalog_add(&final_id).await?;
        Ok(CopyResult::success(final_id))
    }

    // --- Listing ---

    /// List identifiers under a location. Backends without hierarchical
    /// listing fall back to catalog filtering by substring containment.
    pub async fn list(&self, location: &str, options: &ListOptions) -> Result<Vec<String>> {
        if let Some(identifiers) = self.backend.list(location, options).await? {
            return Ok(identifiers);
        }
        let catalog = self.load_catalog().await?;
        let mut matches: Vec<String> = catalog
            .iter()
            .filter(|entry| location.is_empty() || entry.contains(location))
            .map(str::to_string)
            .collect();
        if let Some(max) = options.max_results {
            matches.truncate(max);
        }
        Ok(matches)
    }

    /// Every known identifier: recursive listing from the root, or the full
    /// catalog for flat backends.
    pub async fn list_all(&self) -> Result<Vec<String>> {
        self.list("", &ListOptions::recursive()).await
    }

    /// Delete every cataloged item, continuing past individual failures.
    pub async fn clear(&self) -> Result<ClearResult> {
        let identifiers: Vec<String> = if self.config.use_catalog {
            self.load_catalog().await?.iter().map(str::to_string).collect()
        } else {
            self.list_all().await?
        };

        let mut succeeded = true;
        for identifier in &identifiers {
            match self.delete(identifier).await {
                Ok(result) => succeeded &= result.succeeded,
                Err(e) => {
                    warn!(identifier, error = %e, "failed to delete item during clear");
                    succeeded = false;
                }
            }
        }
        debug!(count = identifiers.len(), succeeded, "cleared storage");
        Ok(ClearResult {
            succeeded,
            identifiers,
        })
    }

    // --- Metadata ---

    /// Refresh the item's metadata companion. No-op when metadata tracking
    /// is disabled. Writes set the creation time once and always refresh
    /// the modification time and encrypted flag; reads refresh the access
    /// time. The application version is stamped on every update.
    pub async fn update_metadata(
        &self,
        identifier: &str,
        is_write: bool,
        encrypted: bool,
    ) -> Result<()> {
        if !self.config.use_metadata {
            return Ok(());
        }
        let mut meta = self.load_metadata(identifier).await?;
        let now = Utc::now();
        if is_write {
            meta.stamp_write(now, encrypted);
        } else {
            meta.stamp_read(now);
        }
        if let Some(version) = &self.config.application_version {
            meta.stamp_application_version(version);
        }
        self.save_metadata(identifier, &meta).await
    }

    /// Persist a metadata bag under the item's companion identifier.
    pub async fn save_metadata(&self, identifier: &str, meta: &StorageMetaData) -> Result<()> {
        let meta_id = meta_identifier(identifier);
        let data = serde_json::to_vec(meta)
            .map_err(|e| Error::serialization(meta_id.as_str(), "serialize metadata for", e))?;
        self.backend.write_bytes(&meta_id, &data).await
    }

    /// Load the item's metadata, or an empty bag when none exists yet.
    pub async fn load_metadata(&self, identifier: &str) -> Result<StorageMetaData> {
        let meta_id = meta_identifier(identifier);
        if !self.backend.exists(&meta_id).await? {
            return Ok(StorageMetaData::default());
        }
        let data = self.backend.read_bytes(&meta_id).await?;
        serde_json::from_slice(&data)
            .map_err(|e| Error::serialization(meta_id.as_str(), "deserialize metadata from", e))
    }

    pub async fn has_metadata(&self, identifier: &str) -> Result<bool> {
        self.backend.exists(&meta_identifier(identifier)).await
    }

    pub async fn delete_metadata(&self, identifier: &str) -> Result<DeleteResult> {
        match self.backend.delete(&meta_identifier(identifier)).await {
            Ok(()) => Ok(DeleteResult::success()),
            Err(e) if e.is_not_found() => Ok(DeleteResult::failure()),
            Err(e) => Err(e),
        }
    }

    // --- Catalog bookkeeping ---

    /// Whether an identifier belongs in the catalog: the catalog itself,
    /// metadata companions and staging names never do.
    fn is_catalog_tracked(identifier: &str) -> bool {
        identifier != CATALOG_ID
            && !identifier.ends_with(META_SUFFIX)
            && !identifier.ends_with(TEMP_SUFFIX)
    }

    pub(crate) async fn load_catalog(&self) -> Result<Catalog> {
        if !self.backend.exists(CATALOG_ID).await? {
            return Ok(Catalog::default());
        }
        let data = self.backend.read_bytes(CATALOG_ID).await?;
        serde_json::from_slice(&data)
            .map_err(|e| Error::serialization(CATALOG_ID, "deserialize catalog from", e))
    }

    async fn save_catalog(&self, catalog: &Catalog) -> Result<()> {
        let data = serde_json::to_vec(catalog)
            .map_err(|e| Error::serialization(CATALOG_ID, "serialize catalog for", e))?;
        self.backend.write_bytes(CATALOG_ID, &data).await
    }

    async fn catalog_add(&self, identifier: &str) -> Result<()> {
        if !self.config.use_catalog || !Self::is_catalog_tracked(identifier) {
            return Ok(());
        }
        let mut catalog = self.load_catalog().await?;
        if catalog.add(identifier) {
            self.save_catalog(&catalog).await?;
        }
        Ok(())
    }

    async fn catalog_remove(&self, identifier: &str) -> Result<()> {
        if !self.config.use_catalog || !Self::is_catalog_tracked(identifier) {
            return Ok(());
        }
        let mut catalog = self.load_catalog().await?;
        if catalog.remove(identifier) {
            self.save_catalog(&catalog).await?;
        }
        Ok(())
    }

    async fn catalog_rename(&self, old: &str, new: &str) -> Result<()> {
        if !self.config.use_catalog {
            return Ok(());
        }
        let mut catalog = self.load_catalog().await?;
        let changed = match (Self::is_catalog_tracked(old), Self::is_catalog_tracked(new)) {
            (true, true) => catalog.rename(old, new),
            (true, false) => catalog.remove(old),
            (false, true) => catalog.add(new),
            (false, false) => false,
        };
        if changed {
            self.save_catalog(&catalog).await?;
        }
        Ok(())
    }
}
