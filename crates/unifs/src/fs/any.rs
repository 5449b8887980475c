//! Backend chosen at runtime from configuration.

use async_trait::async_trait;
use unifs_types::{DirEntry, FileType, FsResult};

use super::ftp::FtpFileSystem;
use super::local::LocalFileSystem;
use super::sftp::SftpFileSystem;
use super::traits::{ByteReader, FileSystem};
use crate::config::BackendConfig;

/// One of the concrete adapters, behind a single type.
///
/// Listings are projected onto [`DirEntry`] so callers never see a
/// backend-specific info type.
pub enum AnyFileSystem {
    Local(LocalFileSystem),
    Ftp(FtpFileSystem),
    Sftp(SftpFileSystem),
}

impl AnyFileSystem {
    /// Construct and connect the backend `config` names.
    pub async fn connect(config: &BackendConfig) -> FsResult<Self> {
        tracing::debug!("opening {} backend", config.backend_name());
        Ok(match config {
            BackendConfig::Local { root: Some(root) } => {
                AnyFileSystem::Local(LocalFileSystem::rooted(root.clone()))
            }
            BackendConfig::Local { root: None } => AnyFileSystem::Local(LocalFileSystem::create()),
            BackendConfig::Ftp(ftp) => AnyFileSystem::Ftp(FtpFileSystem::create(ftp.clone()).await?),
            BackendConfig::Sftp(sftp) => {
                AnyFileSystem::Sftp(SftpFileSystem::create(sftp.clone()).await?)
            }
        })
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            AnyFileSystem::Local(_) => "local",
            AnyFileSystem::Ftp(_) => "ftp",
            AnyFileSystem::Sftp(_) => "sftp",
        }
    }
}

impl From<LocalFileSystem> for AnyFileSystem {
    fn from(fs: LocalFileSystem) -> Self {
        AnyFileSystem::Local(fs)
    }
}

impl From<FtpFileSystem> for AnyFileSystem {
    fn from(fs: FtpFileSystem) -> Self {
        AnyFileSystem::Ftp(fs)
    }
}

impl From<SftpFileSystem> for AnyFileSystem {
    fn from(fs: SftpFileSystem) -> Self {
        AnyFileSystem::Sftp(fs)
    }
}

macro_rules! delegate {
    ($self:ident, $fs:ident => $call:expr) => {
        match $self {
            AnyFileSystem::Local($fs) => $call,
            AnyFileSystem::Ftp($fs) => $call,
            AnyFileSystem::Sftp($fs) => $call,
        }
    };
}

fn entries<I: unifs_types::FileInfo>(infos: Vec<I>) -> Vec<DirEntry> {
    infos.iter().map(DirEntry::from_info).collect()
}

#[async_trait]
impl FileSystem for AnyFileSystem {
    type Info = DirEntry;

    async fn list(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        delegate!(self, fs => fs.list(path).await.map(entries))
    }

    async fn put(&self, source: ByteReader, to_path: &str) -> FsResult<()> {
        delegate!(self, fs => fs.put(source, to_path).await)
    }

    async fn get(&self, path: &str) -> FsResult<Vec<u8>> {
        delegate!(self, fs => fs.get(path).await)
    }

    async fn read_to_stream(&self, path: &str) -> FsResult<ByteReader> {
        delegate!(self, fs => fs.read_to_stream(path).await)
    }

    async fn mkdir(&self, path: &str, recursive: bool) -> FsResult<()> {
        delegate!(self, fs => fs.mkdir(path, recursive).await)
    }

    async fn rmdir(&self, path: &str, recursive: bool) -> FsResult<()> {
        delegate!(self, fs => fs.rmdir(path, recursive).await)
    }

    async fn delete(&self, path: &str) -> FsResult<()> {
        delegate!(self, fs => fs.delete(path).await)
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> FsResult<()> {
        delegate!(self, fs => fs.rename(old_path, new_path).await)
    }

    async fn exists(&self, path: &str) -> FsResult<Option<FileType>> {
        delegate!(self, fs => fs.exists(path).await)
    }

    async fn close(&self) -> FsResult<()> {
        delegate!(self, fs => fs.close().await)
    }
}
