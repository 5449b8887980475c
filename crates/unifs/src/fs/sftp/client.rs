//! The SFTP collaborator interface.

use async_trait::async_trait;
use thiserror::Error;

use crate::fs::traits::ByteReader;

/// `SSH_FX_NO_SUCH_FILE`
pub const NO_SUCH_FILE: u32 = 2;

/// `SSH_FX_PERMISSION_DENIED`
pub const PERMISSION_DENIED: u32 = 3;

/// `SSH_FX_FAILURE`, the catch-all status most servers use for refusals.
pub const FAILURE: u32 = 4;

/// One element of a directory read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SftpListing {
    pub name: String,
    pub size: u64,
    /// `-`, `d` or `l`.
    pub kind: char,
}

/// A failed SFTP request.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SftpFault {
    /// SFTP status code; `None` when the transport itself failed.
    pub code: Option<u32>,
    pub message: String,
}

impl SftpFault {
    pub fn status(code: u32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn is_no_such_file(&self) -> bool {
        self.code == Some(NO_SUCH_FILE)
    }
}

/// Requests of an open SFTP subsystem.
///
/// Like FTP, directory requests act on one directory at a time.
#[async_trait]
pub trait SftpClient: Send + Sync {
    async fn list(&self, path: &str) -> Result<Vec<SftpListing>, SftpFault>;

    /// Type discriminator of the entry at `path` (not following links),
    /// `None` if absent.
    async fn exists(&self, path: &str) -> Result<Option<char>, SftpFault>;

    /// Read a whole file.
    async fn get(&self, path: &str) -> Result<Vec<u8>, SftpFault>;

    /// Open a remote file handle for streaming reads.
    async fn open_read(&self, path: &str) -> Result<ByteReader, SftpFault>;

    /// Write `source` to `path`, truncating any existing file.
    async fn put(&self, path: &str, source: ByteReader) -> Result<(), SftpFault>;

    async fn mkdir(&self, path: &str) -> Result<(), SftpFault>;

    async fn rmdir(&self, path: &str) -> Result<(), SftpFault>;

    async fn delete(&self, path: &str) -> Result<(), SftpFault>;

    async fn rename(&self, from: &str, to: &str) -> Result<(), SftpFault>;

    /// Close the subsystem and disconnect the SSH session.
    async fn end(&self) -> Result<(), SftpFault>;
}
