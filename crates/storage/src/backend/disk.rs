//! Local disk backend
//!
//! Identifiers map to filesystem paths relative to a configured base
//! directory; absolute identifiers pass through unchanged. Writes stage to
//! `<path>.tmpsave` and become visible on commit by deleting any existing
//! target and renaming the staging file over it. The two steps are not a
//! single atomic syscall: a crash between the delete and the rename loses
//! the original. This is a known limitation of the replace protocol.

use crate::backend::{validate_identifier, ListOptions, StorageBackend};
use crate::stream::{StorageStream, StreamInner};
use async_trait::async_trait;
use savepoint_core::{Error, Result, CATALOG_ID, META_SUFFIX, TEMP_SUFFIX};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Filesystem-backed storage
pub struct DiskBackend {
    base_path: PathBuf,
}

impl DiskBackend {
    /// Create a backend rooted at `base_path`, creating the directory when
    /// missing.
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| Error::io(base_path.to_string_lossy(), "create base directory", e))?;
        Ok(Self { base_path })
    }

    /// The directory identifiers are resolved against
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, identifier: &str) -> Result<PathBuf> {
        validate_identifier(identifier)?;
        let candidate = Path::new(identifier);
        if candidate.is_absolute() {
            Ok(candidate.to_path_buf())
        } else {
            Ok(self.base_path.join(candidate))
        }
    }

    fn staging_path(path: &Path) -> PathBuf {
        let mut staged = OsString::from(path.as_os_str());
        staged.push(TEMP_SUFFIX);
        PathBuf::from(staged)
    }

    fn classify(identifier: &str, operation: &'static str, source: io::Error) -> Error {
        match source.kind() {
            io::ErrorKind::NotFound => Error::item_not_found(identifier),
            io::ErrorKind::InvalidInput => {
                Error::invalid_identifier(identifier, source.to_string())
            }
            _ => Error::io(identifier, operation, source),
        }
    }

    async fn ensure_parent(identifier: &str, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::classify(identifier, "create parent directory", e))?;
        }
        Ok(())
    }

    /// Replace `target` with `staging`: delete any existing target, then
    /// rename the staging file into place. Best-effort, not atomic.
    async fn replace_with(identifier: &str, staging: &Path, target: &Path) -> Result<()> {
        if fs::try_exists(target)
            .await
            .map_err(|e| Self::classify(identifier, "check target", e))?
        {
            fs::remove_file(target)
                .await
                .map_err(|e| Self::classify(identifier, "remove existing target", e))?;
        }
        match fs::rename(staging, target).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Leave nothing staged behind on failure
                let _ = fs::remove_file(staging).await;
                Err(Self::classify(identifier, "commit rename", e))
            }
        }
    }

    /// Compose the final destination when moving or copying onto an
    /// existing directory: the source's file name is appended beneath it.
    async fn final_destination(&self, from: &str, to: &str) -> Result<(String, PathBuf)> {
        let to_path = self.resolve(to)?;
        let is_dir = fs::metadata(&to_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if is_dir {
            let name = from.rsplit('/').next().unwrap_or(from);
            let final_id = format!("{}/{}", to.trim_end_matches('/'), name);
            let final_path = to_path.join(name);
            Ok((final_id, final_path))
        } else {
            Ok((to.to_string(), to_path))
        }
    }

    fn is_reserved(identifier: &str) -> bool {
        identifier == CATALOG_ID
            || identifier.ends_with(META_SUFFIX)
            || identifier.ends_with(TEMP_SUFFIX)
    }
}

#[async_trait]
impl StorageBackend for DiskBackend {
    async fn open_write(&self, identifier: &str) -> Result<StorageStream> {
        let final_path = self.resolve(identifier)?;
        Self::ensure_parent(identifier, &final_path).await?;
        let staging_path = Self::staging_path(&final_path);
        let file = fs::File::create(&staging_path)
            .await
            .map_err(|e| Self::classify(identifier, "create staging file", e))?;
        debug!(identifier, staging = %staging_path.display(), "staged write stream");
        Ok(StorageStream::file_write(
            identifier,
            file,
            staging_path,
            final_path,
        ))
    }

    async fn commit_write(&self, stream: StorageStream) -> Result<()> {
        let (identifier, inner) = stream.into_parts();
        match inner {
            StreamInner::FileWrite {
                mut file,
                staging_path,
                final_path,
            } => {
                file.flush()
                    .await
                    .map_err(|e| Self::classify(&identifier, "flush staging file", e))?;
                file.sync_all()
                    .await
                    .map_err(|e| Self::classify(&identifier, "sync staging file", e))?;
                drop(file);
                Self::replace_with(&identifier, &staging_path, &final_path).await?;
                debug!(identifier, "committed write stream");
                Ok(())
            }
            _ => Err(Error::configuration(format!(
                "stream for '{identifier}' does not belong to the disk backend"
            ))),
        }
    }

    async fn open_read(&self, identifier: &str) -> Result<StorageStream> {
        let path = self.resolve(identifier)?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| Self::classify(identifier, "open", e))?;
        Ok(StorageStream::file_read(identifier, file))
    }

    async fn delete(&self, identifier: &str) -> Result<()> {
        let path = self.resolve(identifier)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| Self::classify(identifier, "delete", e))
    }

    async fn exists(&self, identifier: &str) -> Result<bool> {
        let path = self.resolve(identifier)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| Self::classify(identifier, "check existence", e))
    }

    async fn move_item(&self, from: &str, to: &str, replace: bool) -> Result<String> {
        let from_path = self.resolve(from)?;
        if !fs::try_exists(&from_path)
            .await
            .map_err(|e| Self::classify(from, "check source", e))?
        {
            return Err(Error::item_not_found(from));
        }

        let (final_id, final_path) = self.final_destination(from, to).await?;
        let target_exists = fs::try_exists(&final_path)
            .await
            .map_err(|e| Self::classify(&final_id, "check destination", e))?;
        if target_exists && !replace {
            return Err(super::already_exists(&final_id, "move"));
        }
        if target_exists {
            fs::remove_file(&final_path)
                .await
                .map_err(|e| Self::classify(&final_id, "remove existing destination", e))?;
        }
        Self::ensure_parent(&final_id, &final_path).await?;
        fs::rename(&from_path, &final_path)
            .await
            .map_err(|e| Self::classify(from, "move", e))?;
        Ok(final_id)
    }

    async fn copy_item(&self, from: &str, to: &str, replace: bool) -> Result<String> {
        let from_path = self.resolve(from)?;
        if !fs::try_exists(&from_path)
            .await
            .map_err(|e| Self::classify(from, "check source", e))?
        {
            return Err(Error::item_not_found(from));
        }

        let (final_id, final_path) = self.final_destination(from, to).await?;
        let target_exists = fs::try_exists(&final_path)
            .await
            .map_err(|e| Self::classify(&final_id, "check destination", e))?;
        if target_exists && !replace {
            return Err(super::already_exists(&final_id, "copy"));
        }
        Self::ensure_parent(&final_id, &final_path).await?;
        fs::copy(&from_path, &final_path)
            .await
            .map_err(|e| Self::classify(from, "copy", e))?;
        Ok(final_id)
    }

    async fn list(&self, location: &str, options: &ListOptions) -> Result<Option<Vec<String>>> {
        let root = if location.is_empty() {
            self.base_path.clone()
        } else {
            self.resolve(location)?
        };

        let mut results = Vec::new();
        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Self::classify(location, "list", e)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| Self::classify(location, "list", e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| Self::classify(location, "list", e))?;
                if file_type.is_dir() {
                    if options.recurse {
                        pending.push(path);
                    }
                    continue;
                }
                let relative = path.strip_prefix(&self.base_path).unwrap_or(&path);
                let identifier = relative.to_string_lossy().replace('\\', "/");
                if Self::is_reserved(&identifier) {
                    continue;
                }
                results.push(identifier);
                if let Some(max) = options.max_results {
                    if results.len() >= max {
                        return Ok(Some(results));
                    }
                }
            }
        }
        Ok(Some(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn backend() -> (TempDir, DiskBackend) {
        let temp_dir = TempDir::new().unwrap();
        let backend = DiskBackend::new(temp_dir.path()).await.unwrap();
        (temp_dir, backend)
    }

    #[tokio::test]
    async fn write_read_round_trip() -> Result<()> {
        let (_dir, backend) = backend().await;
        backend.write_bytes("player/save1", b"payload").await?;
        assert_eq!(backend.read_bytes("player/save1").await?, b"payload");
        Ok(())
    }

    #[tokio::test]
    async fn staged_write_is_invisible_until_commit() -> Result<()> {
        let (_dir, backend) = backend().await;
        backend.write_bytes("item", b"original").await?;

        let mut stream = backend.open_write("item").await?;
        stream.write_all(b"replacement").await.unwrap();

        // Not committed yet: the original survives
        assert_eq!(backend.read_bytes("item").await?, b"original");

        backend.commit_write(stream).await?;
        assert_eq!(backend.read_bytes("item").await?, b"replacement");
        Ok(())
    }

    #[tokio::test]
    async fn dropped_write_stream_leaves_item_untouched() -> Result<()> {
        let (dir, backend) = backend().await;
        backend.write_bytes("item", b"original").await?;

        {
            let mut stream = backend.open_write("item").await?;
            stream.write_all(b"abandoned").await.unwrap();
        }

        assert_eq!(backend.read_bytes("item").await?, b"original");
        // The abandoned staging file is reclaimed, not left on disk
        assert!(!dir.path().join("item.tmpsave").exists());
        Ok(())
    }

    #[tokio::test]
    async fn read_stream_streams_committed_bytes() -> Result<()> {
        let (_dir, backend) = backend().await;
        backend.write_bytes("item", b"streamed").await?;

        let mut stream = backend.open_read("item").await?;
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"streamed");
        Ok(())
    }

    #[tokio::test]
    async fn missing_item_maps_to_item_not_found() {
        let (_dir, backend) = backend().await;
        let err = backend.read_bytes("missing").await.unwrap_err();
        assert!(err.is_not_found());

        let err = backend.delete("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn empty_identifier_is_invalid() {
        let (_dir, backend) = backend().await;
        let err = backend.read_bytes("").await.unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier { .. }));
    }

    #[tokio::test]
    async fn move_into_existing_directory_appends_source_name() -> Result<()> {
        let (_dir, backend) = backend().await;
        backend.write_bytes("save1", b"data").await?;
        backend.write_bytes("archive/placeholder", b"x").await?;

        let final_id = backend.move_item("save1", "archive", true).await?;
        assert_eq!(final_id, "archive/save1");
        assert!(!backend.exists("save1").await?);
        assert_eq!(backend.read_bytes("archive/save1").await?, b"data");
        Ok(())
    }

    #[tokio::test]
    async fn move_without_replace_refuses_existing_destination() -> Result<()> {
        let (_dir, backend) = backend().await;
        backend.write_bytes("a", b"1").await?;
        backend.write_bytes("b", b"2").await?;

        assert!(backend.move_item("a", "b", false).await.is_err());
        assert_eq!(backend.read_bytes("b").await?, b"2");
        Ok(())
    }

    #[tokio::test]
    async fn listing_filters_reserved_suffixes() -> Result<()> {
        let (_dir, backend) = backend().await;
        backend.write_bytes("save1", b"1").await?;
        backend.write_bytes("save1.meta", b"{}").await?;
        backend.write_bytes(".catalog", b"[]").await?;
        backend.write_bytes("nested/save2", b"2").await?;

        let mut all = backend
            .list("", &ListOptions::recursive())
            .await?
            .unwrap();
        all.sort();
        assert_eq!(all, ["nested/save2", "save1"]);

        let top = backend.list("", &ListOptions::default()).await?.unwrap();
        assert_eq!(top, ["save1"]);
        Ok(())
    }

    #[tokio::test]
    async fn listing_honors_max_results() -> Result<()> {
        let (_dir, backend) = backend().await;
        for i in 0..5 {
            backend.write_bytes(&format!("item{i}"), b"x").await?;
        }

        let capped = backend
            .list(
                "",
                &ListOptions {
                    recurse: true,
                    max_results: Some(3),
                },
            )
            .await?
            .unwrap();
        assert_eq!(capped.len(), 3);
        Ok(())
    }
}
