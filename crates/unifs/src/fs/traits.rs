//! The file system contract.

use std::io::Cursor;
use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use unifs_types::{FileInfo, FileType, FsError, FsResult};

/// A readable byte stream handed across the contract.
pub type ByteReader = Pin<Box<dyn AsyncRead + Send>>;

/// Abstract file system interface.
///
/// Each adapter owns exactly one backend connection. Operations issued
/// against one instance are not serialized beyond what the native session
/// does itself.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// The entry type produced by [`list`](Self::list).
    type Info: FileInfo + Send;

    /// List the direct children of a directory, sorted by name.
    ///
    /// Fails with `NotFound` if the path is absent and `NotADirectory` if it
    /// is a file.
    async fn list(&self, path: &str) -> FsResult<Vec<Self::Info>>;

    /// Write a stream to `to_path`, creating or overwriting it.
    ///
    /// Resolves once the backend has accepted the whole stream. A failure of
    /// the source stream is reported as `Io`.
    async fn put(&self, source: ByteReader, to_path: &str) -> FsResult<()>;

    /// Read an entire file into memory.
    async fn get(&self, path: &str) -> FsResult<Vec<u8>>;

    /// Open a file for streaming without buffering it.
    ///
    /// `NotFound` is reported here; failures after the stream was handed
    /// out surface as read errors on the stream.
    async fn read_to_stream(&self, path: &str) -> FsResult<ByteReader>;

    /// Create a directory.
    ///
    /// With `recursive`, missing ancestors are created and an existing
    /// directory is not an error. Without it, an existing entry fails with
    /// `AlreadyExists` and a missing parent with `NotFound`.
    async fn mkdir(&self, path: &str, recursive: bool) -> FsResult<()>;

    /// Remove a directory.
    ///
    /// With `recursive`, all contents go with it. Without it, a non-empty
    /// directory fails with `NotEmpty`.
    async fn rmdir(&self, path: &str, recursive: bool) -> FsResult<()>;

    /// Remove a single file. Directories fail with `IsADirectory`.
    async fn delete(&self, path: &str) -> FsResult<()>;

    /// Rename (move) an entry. Atomic where the backend supports it.
    async fn rename(&self, old_path: &str, new_path: &str) -> FsResult<()>;

    /// Kind of the entry at `path`, or `None` if nothing is there.
    ///
    /// Absence is never an error; only unexpected backend failures are.
    async fn exists(&self, path: &str) -> FsResult<Option<FileType>>;

    /// Release the backend connection.
    ///
    /// Closing twice is a no-op. Every other operation on a closed remote
    /// adapter fails with `NotConnected`.
    async fn close(&self) -> FsResult<()>;

    /// Write an in-memory buffer to `to_path`.
    async fn put_bytes(&self, data: Vec<u8>, to_path: &str) -> FsResult<()> {
        self.put(Box::pin(Cursor::new(data)), to_path).await
    }

    /// Pipe a file into a caller-supplied sink, returning the bytes copied.
    async fn read_into<W>(&self, path: &str, sink: &mut W) -> FsResult<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let mut reader = self.read_to_stream(path).await?;
        tokio::io::copy(&mut reader, sink)
            .await
            .map_err(|e| FsError::io(path, e))
    }
}
