//! The FTP collaborator interface.

use async_trait::async_trait;
use thiserror::Error;

use crate::fs::traits::ByteReader;

/// Reply code for "requested action not taken; file unavailable".
///
/// Servers send it for missing entries and for most refusals alike.
pub const FILE_UNAVAILABLE: u32 = 550;

/// Reply code for "not logged in".
pub const NOT_LOGGED_IN: u32 = 530;

/// One element of a `LIST` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpListing {
    pub name: String,
    pub size: u64,
    /// Type discriminator from the listing line: `-`, `d` or `l`.
    pub kind: char,
}

/// A failed FTP command.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FtpFault {
    /// Server reply code; `None` when the transport itself failed.
    pub code: Option<u32>,
    pub message: String,
}

impl FtpFault {
    pub fn reply(code: u32, message: impl Into<String>) -> Self {
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

    pub fn is_file_unavailable(&self) -> bool {
        self.code == Some(FILE_UNAVAILABLE)
    }
}

/// Commands of a connected, authenticated FTP session.
///
/// Every command is a single protocol primitive: `mkdir` and `rmdir` act on
/// one directory, `list` returns whatever the server's `LIST` returns (for a
/// file path, the file's own line).
#[async_trait]
pub trait FtpClient: Send + Sync {
    async fn list(&self, path: &str) -> Result<Vec<FtpListing>, FtpFault>;

    /// Start a download. Failures after the transfer began are delivered as
    /// read errors on the returned stream.
    async fn retrieve(&self, path: &str) -> Result<ByteReader, FtpFault>;

    /// Upload `source` to `path`, replacing any existing file.
    async fn store(&self, path: &str, source: ByteReader) -> Result<(), FtpFault>;

    async fn mkdir(&self, path: &str) -> Result<(), FtpFault>;

    async fn rmdir(&self, path: &str) -> Result<(), FtpFault>;

    async fn delete(&self, path: &str) -> Result<(), FtpFault>;

    async fn rename(&self, from: &str, to: &str) -> Result<(), FtpFault>;

    /// Log out once queued commands have run, then disconnect.
    async fn end(&self) -> Result<(), FtpFault>;

    /// Drop the connection immediately.
    async fn destroy(&self);
}
