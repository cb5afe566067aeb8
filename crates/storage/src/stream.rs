//! Storage streams
//!
//! A [`StorageStream`] owns exactly one underlying byte stream for the
//! lifetime between acquisition and disposal and remembers the identifier it
//! was opened for. Dropping a write stream releases the handle without
//! committing anything (disk writes also remove their staging file);
//! visibility of written data is controlled exclusively by
//! [`StorageBackend::commit_write`](crate::backend::StorageBackend).

use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// A disposable handle wrapping a readable or writable byte stream for one
/// named storage item.
pub struct StorageStream {
    identifier: String,
    inner: StreamInner,
}

pub(crate) enum StreamInner {
    /// Disk write staged to a temporary path, renamed into place on commit.
    FileWrite {
        file: File,
        staging_path: PathBuf,
        final_path: PathBuf,
    },
    /// Disk read.
    FileRead { file: File },
    /// Memory/key-value write buffered until commit.
    BufferWrite { buffer: Vec<u8> },
    /// Memory/key-value read over a snapshot of the item.
    BufferRead { cursor: Cursor<Vec<u8>> },
}

impl StorageStream {
    pub(crate) fn file_write(
        identifier: impl Into<String>,
        file: File,
        staging_path: PathBuf,
        final_path: PathBuf,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            inner: StreamInner::FileWrite {
                file,
                staging_path,
                final_path,
            },
        }
    }

    pub(crate) fn file_read(identifier: impl Into<String>, file: File) -> Self {
        Self {
            identifier: identifier.into(),
            inner: StreamInner::FileRead { file },
        }
    }

    pub(crate) fn buffer_write(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            inner: StreamInner::BufferWrite { buffer: Vec::new() },
        }
    }

    pub(crate) fn buffer_read(identifier: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            identifier: identifier.into(),
            inner: StreamInner::BufferRead {
                cursor: Cursor::new(data),
            },
        }
    }

    /// The identifier this stream was opened for
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Whether this stream was opened for writing
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(
            self.inner,
            StreamInner::FileWrite { .. } | StreamInner::BufferWrite { .. }
        )
    }

    pub(crate) fn into_parts(mut self) -> (String, StreamInner) {
        let identifier = std::mem::take(&mut self.identifier);
        let inner = std::mem::replace(
            &mut self.inner,
            StreamInner::BufferWrite { buffer: Vec::new() },
        );
        std::mem::forget(self);
        (identifier, inner)
    }
}

impl Drop for StorageStream {
    /// An uncommitted disk write stream closes its handle and removes the
    /// staging file so aborted writes leave no residue. Commit detaches the
    /// inner stream first, so committed writes never reach this path.
    fn drop(&mut self) {
        let inner = std::mem::replace(
            &mut self.inner,
            StreamInner::BufferWrite { buffer: Vec::new() },
        );
        if let StreamInner::FileWrite {
            file, staging_path, ..
        } = inner
        {
            drop(file);
            let _ = std::fs::remove_file(&staging_path);
        }
    }
}

fn not_writable() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        "storage stream was opened for reading",
    )
}

fn not_readable() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        "storage stream was opened for writing",
    )
}

impl AsyncWrite for StorageStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut self.get_mut().inner {
            StreamInner::FileWrite { file, .. } => Pin::new(file).poll_write(cx, buf),
            StreamInner::BufferWrite { buffer } => {
                buffer.extend_from_slice(buf);
                Poll::Ready(Ok(buf.len()))
            }
            _ => Poll::Ready(Err(not_writable())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            StreamInner::FileWrite { file, .. } => Pin::new(file).poll_flush(cx),
            StreamInner::BufferWrite { .. } => Poll::Ready(Ok(())),
            _ => Poll::Ready(Err(not_writable())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            StreamInner::FileWrite { file, .. } => Pin::new(file).poll_shutdown(cx),
            StreamInner::BufferWrite { .. } => Poll::Ready(Ok(())),
            _ => Poll::Ready(Err(not_writable())),
        }
    }
}

impl AsyncRead for StorageStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            StreamInner::FileRead { file } => Pin::new(file).poll_read(cx, buf),
            StreamInner::BufferRead { cursor } => {
                let n = cursor.read(buf.initialize_unfilled())?;
                buf.advance(n);
                Poll::Ready(Ok(()))
            }
            _ => Poll::Ready(Err(not_readable())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn buffered_write_stream_accumulates_data() {
        let mut stream = StorageStream::buffer_write("item");
        stream.write_all(b"hello ").await.unwrap();
        stream.write_all(b"world").await.unwrap();
        assert!(stream.is_write());

        let (id, inner) = stream.into_parts();
        assert_eq!(id, "item");
        match inner {
            StreamInner::BufferWrite { buffer } => assert_eq!(buffer, b"hello world"),
            _ => panic!("expected buffered write stream"),
        }
    }

    #[tokio::test]
    async fn buffered_read_stream_yields_snapshot() {
        let mut stream = StorageStream::buffer_read("item", b"payload".to_vec());
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"payload");
    }

    #[tokio::test]
    async fn reading_a_write_stream_fails() {
        let mut stream = StorageStream::buffer_write("item");
        let mut out = Vec::new();
        assert!(stream.read_to_end(&mut out).await.is_err());
    }
}
