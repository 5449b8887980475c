//! unifs: one file-operation contract over heterogeneous storage backends.
//!
//! Callers write backend-agnostic code against [`FileSystem`]; an adapter
//! translates the contract onto each backend's native client:
//!
//! - **LocalFileSystem**: the local disk, via `tokio::fs`
//! - **FtpFileSystem**: an FTP session, via `suppaftp`
//! - **SftpFileSystem**: an SFTP subsystem over SSH, via `russh` + `russh-sftp`
//! - **AnyFileSystem**: whichever of the above a [`BackendConfig`] names
//!
//! ```ignore
//! use unifs::{FileSystem, LocalFileSystem};
//!
//! let fs = LocalFileSystem::create();
//! fs.mkdir("/tmp/unifs/a", true).await?;
//! fs.put_bytes(b"hello".to_vec(), "/tmp/unifs/a/b.txt").await?;
//! assert_eq!(fs.get("/tmp/unifs/a/b.txt").await?, b"hello");
//! ```

pub mod config;
pub mod fs;
pub mod path;
mod session;

pub use config::{
    BackendConfig, ConfigError, FtpConfig, FtpConnectionOptions, SftpConfig,
    SftpConnectionOptions,
};
pub use fs::{
    AnyFileSystem, ByteReader, CloseMode, FileSystem, FtpClient, FtpFault, FtpFileInfo,
    FtpFileSystem, FtpListing, LocalFileInfo, LocalFileSystem, RusshSftpClient, SftpClient,
    SftpFault, SftpFileInfo, SftpFileSystem, SftpListing, SuppaFtpClient,
};
pub use unifs_types::{ConnectionState, DirEntry, FileInfo, FileType, FsError, FsResult};
