//! SFTP backend.
//!
//! SFTP reports entry kinds and absence directly, so `exists` maps the
//! native answer. Recursion and the pre-checks the protocol folds into
//! `SSH_FX_FAILURE` are shared with the FTP adapter.

mod client;
mod native;

pub use client::{FAILURE, NO_SUCH_FILE, PERMISSION_DENIED, SftpClient, SftpFault, SftpListing};
pub use native::RusshSftpClient;

use async_trait::async_trait;
use unifs_types::{ConnectionState, FileInfo, FileType, FsError, FsResult};

use super::traits::{ByteReader, FileSystem};
use super::tree::{self, RemoteTree};
use crate::config::SftpConfig;
use crate::session::SessionState;

/// Entry produced by [`SftpFileSystem::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SftpFileInfo {
    original: SftpListing,
}

impl SftpFileInfo {
    pub fn new(original: SftpListing) -> Self {
        Self { original }
    }

    pub fn original(&self) -> &SftpListing {
        &self.original
    }
}

impl FileInfo for SftpFileInfo {
    fn name(&self) -> &str {
        &self.original.name
    }

    fn size(&self) -> u64 {
        self.original.size
    }

    fn file_type(&self) -> FileType {
        FileType::from_discriminator(self.original.kind)
    }
}

/// SFTP backend over one SSH session.
pub struct SftpFileSystem {
    client: Box<dyn SftpClient>,
    state: SessionState,
}

impl SftpFileSystem {
    /// Connect, authenticate as `config.user` and open the subsystem.
    pub async fn create(config: SftpConfig) -> FsResult<Self> {
        let state = SessionState::new(ConnectionState::Connecting);
        tracing::info!("connecting to sftp://{}@{}:{}", config.user, config.host, config.port);
        match RusshSftpClient::connect(&config).await {
            Ok(client) => {
                state.set(ConnectionState::Ready);
                Ok(Self {
                    client: Box::new(client),
                    state,
                })
            }
            Err(e) => {
                state.set(ConnectionState::Failed);
                tracing::warn!("sftp connect to {} failed: {}", config.host, e);
                Err(e)
            }
        }
    }

    /// Wrap a collaborator whose subsystem is already open.
    pub fn from_client(client: impl SftpClient + 'static) -> Self {
        Self {
            client: Box::new(client),
            state: SessionState::new(ConnectionState::Ready),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }
}

fn translate(fault: SftpFault, path: &str) -> FsError {
    match fault.code {
        Some(client::NO_SUCH_FILE) => FsError::not_found(path),
        Some(client::PERMISSION_DENIED) => FsError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, fault.message),
        ),
        Some(code) => FsError::Protocol {
            code: Some(code),
            message: fault.message,
        },
        None => FsError::io(path, std::io::Error::other(fault.message)),
    }
}

#[async_trait]
impl RemoteTree for SftpFileSystem {
    async fn probe(&self, path: &str) -> FsResult<Option<FileType>> {
        self.exists(path).await
    }

    async fn children(&self, path: &str) -> FsResult<Vec<(String, FileType)>> {
        Ok(self
            .list(path)
            .await?
            .into_iter()
            .map(|info| {
                let kind = info.file_type();
                (info.original.name, kind)
            })
            .collect())
    }

    async fn create_dir(&self, path: &str) -> FsResult<()> {
        self.client
            .mkdir(path)
            .await
            .map_err(|fault| translate(fault, path))
    }

    async fn remove_empty_dir(&self, path: &str) -> FsResult<()> {
        self.client
            .rmdir(path)
            .await
            .map_err(|fault| translate(fault, path))
    }

    async fn remove_file(&self, path: &str) -> FsResult<()> {
        self.client
            .delete(path)
            .await
            .map_err(|fault| translate(fault, path))
    }
}

#[async_trait]
impl FileSystem for SftpFileSystem {
    type Info = SftpFileInfo;

    async fn list(&self, path: &str) -> FsResult<Vec<SftpFileInfo>> {
        self.state.ensure_ready()?;
        tracing::debug!("sftp list {}", path);
        let entries = match self.client.list(path).await {
            Ok(entries) => entries,
            Err(fault) => {
                // servers answer opendir on a file with a generic failure
                if fault.code == Some(client::FAILURE)
                    && self.exists(path).await? == Some(FileType::File)
                {
                    return Err(FsError::NotADirectory {
                        path: path.to_string(),
                    });
                }
                return Err(translate(fault, path));
            }
        };
        let mut infos: Vec<_> = entries
            .into_iter()
            .filter(|e| e.name != "." && e.name != "..")
            .map(SftpFileInfo::new)
            .collect();
        infos.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(infos)
    }

    async fn put(&self, source: ByteReader, to_path: &str) -> FsResult<()> {
        self.state.ensure_ready()?;
        tracing::debug!("sftp put {}", to_path);
        self.client.put(to_path, source).await.map_err(|fault| match fault.code {
            Some(client::NO_SUCH_FILE) | None => {
                FsError::io(to_path, std::io::Error::other(fault.message))
            }
            Some(_) => translate(fault, to_path),
        })
    }

    async fn get(&self, path: &str) -> FsResult<Vec<u8>> {
        self.state.ensure_ready()?;
        tracing::debug!("sftp get {}", path);
        self.client
            .get(path)
            .await
            .map_err(|fault| translate(fault, path))
    }

    async fn read_to_stream(&self, path: &str) -> FsResult<ByteReader> {
        self.state.ensure_ready()?;
        tracing::debug!("sftp open {}", path);
        self.client
            .open_read(path)
            .await
            .map_err(|fault| translate(fault, path))
    }

    async fn mkdir(&self, path: &str, recursive: bool) -> FsResult<()> {
        self.state.ensure_ready()?;
        tracing::debug!("sftp mkdir {} (recursive={})", path, recursive);
        tree::mkdir(self, path, recursive).await
    }

    async fn rmdir(&self, path: &str, recursive: bool) -> FsResult<()> {
        self.state.ensure_ready()?;
        tracing::debug!("sftp rmdir {} (recursive={})", path, recursive);
        tree::rmdir(self, path, recursive).await
    }

    async fn delete(&self, path: &str) -> FsResult<()> {
        self.state.ensure_ready()?;
        tracing::debug!("sftp delete {}", path);
        match self.exists(path).await? {
            None => Err(FsError::not_found(path)),
            Some(FileType::Directory) => Err(FsError::IsADirectory {
                path: path.to_string(),
            }),
            Some(_) => self.remove_file(path).await,
        }
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> FsResult<()> {
        self.state.ensure_ready()?;
        tracing::debug!("sftp rename {} -> {}", old_path, new_path);
        match self.client.rename(old_path, new_path).await {
            Ok(()) => Ok(()),
            // NO_SUCH_FILE names neither side; blame the source only when it is gone
            Err(fault) if fault.is_no_such_file() => {
                match self.exists(old_path).await? {
                    None => Err(FsError::not_found(old_path)),
                    Some(_) => Err(FsError::not_found(new_path)),
                }
            }
            Err(fault) => Err(translate(fault, old_path)),
        }
    }

    async fn exists(&self, path: &str) -> FsResult<Option<FileType>> {
        self.state.ensure_ready()?;
        self.client
            .exists(path)
            .await
            .map(|kind| kind.map(FileType::from_discriminator))
            .map_err(|fault| translate(fault, path))
    }

    async fn close(&self) -> FsResult<()> {
        if !self.state.begin_close() {
            return Ok(());
        }
        if let Err(fault) = self.client.end().await {
            tracing::warn!("sftp disconnect failed: {}", fault);
        }
        tracing::info!("sftp session closed");
        Ok(())
    }
}
