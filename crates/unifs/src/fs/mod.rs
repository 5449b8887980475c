//! File system adapters.
//!
//! Every backend implements [`FileSystem`]:
//!
//! ```text
//! FileSystem (contract)
//! ├── LocalFileSystem   tokio::fs
//! ├── FtpFileSystem     FtpClient  ← SuppaFtpClient
//! ├── SftpFileSystem    SftpClient ← RusshSftpClient
//! └── AnyFileSystem     one of the above, picked by BackendConfig
//! ```
//!
//! The remote adapters talk to their protocol through a collaborator trait
//! (`FtpClient`, `SftpClient`) and own all translation of native status
//! codes into [`FsError`](unifs_types::FsError).

mod any;
pub mod ftp;
mod local;
pub mod sftp;
mod traits;
mod tree;

pub use any::AnyFileSystem;
pub use ftp::{
    CloseMode, FtpClient, FtpFault, FtpFileInfo, FtpFileSystem, FtpListing, SuppaFtpClient,
};
pub use local::{LocalFileInfo, LocalFileSystem};
pub use sftp::{RusshSftpClient, SftpClient, SftpFault, SftpFileInfo, SftpFileSystem, SftpListing};
pub use traits::{ByteReader, FileSystem};
